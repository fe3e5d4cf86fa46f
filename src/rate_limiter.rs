use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// 滑動視窗長度
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// 每分鐘預設請求上限
pub const DEFAULT_PER_MINUTE: usize = 30;

/// 全域對外請求限流器
///
/// 所有來源、所有並發查詢共用同一個實例，因此上限限制的是整體
/// 對外請求速率，而非單一來源。
#[derive(Debug)]
pub struct RateLimiter {
    window: Mutex<VecDeque<Instant>>,
    ceiling: usize,
    period: Duration,
}

impl RateLimiter {
    /// `ceiling` 必須大於 0（由設定驗證保證）
    pub fn new(ceiling: usize) -> Self {
        Self::with_period(ceiling, DEFAULT_WINDOW)
    }

    pub fn with_period(ceiling: usize, period: Duration) -> Self {
        Self {
            window: Mutex::new(VecDeque::with_capacity(ceiling)),
            ceiling: ceiling.max(1),
            period,
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// 等待直到允許送出請求，然後記錄這次放行
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = Instant::now();
                self.purge(&mut window, now);

                if window.len() < self.ceiling {
                    window.push_back(now);
                    return;
                }

                // 視窗已滿：等到最舊的紀錄離開視窗
                match window.front() {
                    Some(oldest) => (*oldest + self.period).saturating_duration_since(now),
                    None => Duration::ZERO,
                }
            };

            debug!(wait_ms = wait.as_millis() as u64, "⏳ 達到速率上限，等待中");
            tokio::time::sleep(wait).await;
        }
    }

    /// 目前視窗內的請求數
    pub async fn in_flight_window(&self) -> usize {
        let mut window = self.window.lock().await;
        self.purge(&mut window, Instant::now());
        window.len()
    }

    fn purge(&self, window: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = window.front() {
            if now.saturating_duration_since(*oldest) >= self.period {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_PER_MINUTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_under_ceiling_is_immediate() {
        let limiter = RateLimiter::new(3);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.in_flight_window().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extra_call_is_delayed_not_rejected() {
        let limiter = RateLimiter::new(3);
        let start = Instant::now();
        for _ in 0..4 {
            limiter.acquire().await;
        }
        let waited = start.elapsed();
        assert!(waited >= DEFAULT_WINDOW, "waited {:?}", waited);
        assert!(waited < DEFAULT_WINDOW + Duration::from_secs(1), "waited {:?}", waited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides() {
        let limiter = RateLimiter::with_period(2, Duration::from_secs(10));
        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(6)).await;
        limiter.acquire().await;

        // 第一筆在 t=10 離開視窗
        let start = Instant::now();
        limiter.acquire().await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(4) && waited < Duration::from_secs(5));
        assert_eq!(limiter.in_flight_window().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_never_exceed_ceiling() {
        let limiter = Arc::new(RateLimiter::with_period(5, Duration::from_secs(60)));
        let mut handles = Vec::new();
        for _ in 0..12 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            }));
        }

        let start = Instant::now();
        let mut admitted = Vec::new();
        for handle in handles {
            admitted.push(handle.await.unwrap());
        }
        admitted.sort();

        // 任意 60 秒內最多 5 次
        for (i, t) in admitted.iter().enumerate() {
            let in_window = admitted[i..]
                .iter()
                .filter(|other| other.saturating_duration_since(*t) < Duration::from_secs(60))
                .count();
            assert!(in_window <= 5);
        }
        let last = admitted.last().unwrap();
        assert!(last.saturating_duration_since(start) >= Duration::from_secs(120));
        assert!(limiter.in_flight_window().await <= 5);
    }
}
