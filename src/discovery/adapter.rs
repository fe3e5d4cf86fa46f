use super::trait_def::ImageSource;
use super::utils::collect_valid;
use crate::cache::{ResultCache, cache_key};
use crate::rate_limiter::RateLimiter;
use crate::types::{MAX_COUNT, SourceResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 包住一個來源，統一處理快取、限流、驗證與錯誤隔離
///
/// 快取與限流器是整個行程共用的實例，由 Aggregator 建立後注入。
pub struct SourceAdapter {
    source: Arc<dyn ImageSource>,
    cache: Arc<ResultCache>,
    limiter: Arc<RateLimiter>,
}

impl SourceAdapter {
    pub fn new(
        source: Arc<dyn ImageSource>,
        cache: Arc<ResultCache>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self { source, cache, limiter }
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn requires_api_key(&self) -> bool {
        self.source.requires_api_key()
    }

    /// 查詢一次來源，失敗只會出現在回傳值裡
    ///
    /// 一律向來源要 `MAX_COUNT` 個並整份快取，回傳時才截到 `count`，
    /// 因為快取鍵不含數量。
    pub async fn fetch(&self, query: &str, count: usize) -> SourceResult {
        if count == 0 {
            return SourceResult::Found(Vec::new());
        }

        let source = self.name();
        let key = cache_key(source, query);

        if let Some(mut urls) = self.cache.get(&key).await {
            urls.truncate(count);
            debug!(source, query, count = urls.len(), "💾 快取命中");
            return SourceResult::Found(urls);
        }

        self.limiter.acquire().await;

        match self.source.search(query, MAX_COUNT).await {
            Ok(candidates) => {
                let mut urls = collect_valid(candidates, MAX_COUNT);
                if !urls.is_empty() {
                    self.cache.set(&key, urls.clone()).await;
                }
                info!(source, query, count = urls.len(), "✅ 來源回傳");
                urls.truncate(count);
                SourceResult::Found(urls)
            }
            Err(e) => {
                warn!(source, query, error = %e, "❌ 來源失敗");
                SourceResult::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::testing::MockSource;
    use crate::error::SourceError;
    use std::time::Duration;

    fn adapter(source: Arc<MockSource>, limiter: RateLimiter) -> SourceAdapter {
        SourceAdapter::new(source, Arc::new(ResultCache::default()), Arc::new(limiter))
    }

    #[tokio::test]
    async fn test_second_fetch_hits_cache() {
        let mock = Arc::new(MockSource::new(
            "mock",
            &[
                "https://cdn.example.com/a.jpg",
                "https://cdn.example.com/b.jpg",
                "https://cdn.example.com/c.jpg",
            ],
        ));
        let adapter = adapter(mock.clone(), RateLimiter::default());

        let first = adapter.fetch("Anime Boy", 3).await;
        assert_eq!(first.len(), 3);

        // 正規化後相同的查詢共用快取，命中時只回傳 count 個
        let second = adapter.fetch("  anime   boy", 2).await;
        assert_eq!(second.len(), 2);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_small_request_does_not_shrink_later_ones() {
        let mock = Arc::new(MockSource::new(
            "mock",
            &[
                "https://cdn.example.com/a.jpg",
                "https://cdn.example.com/b.jpg",
                "https://cdn.example.com/c.jpg",
                "https://cdn.example.com/d.jpg",
            ],
        ));
        let adapter = adapter(mock.clone(), RateLimiter::default());

        assert_eq!(adapter.fetch("boy", 1).await.len(), 1);
        assert_eq!(adapter.fetch("boy", 4).await.len(), 4);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_candidates_are_dropped_and_not_cached() {
        let mock = Arc::new(MockSource::new(
            "mock",
            &[
                "https://cdn.example.com/page.html",
                "http://localhost/a.jpg",
                "ftp://cdn.example.com/a.jpg",
            ],
        ));
        let adapter = adapter(mock.clone(), RateLimiter::default());

        let result = adapter.fetch("cat", 5).await;
        assert!(matches!(result, SourceResult::Found(urls) if urls.is_empty()));
        adapter.fetch("cat", 5).await;
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_contained() {
        let adapter = adapter(Arc::new(MockSource::failing("down")), RateLimiter::default());
        let result = adapter.fetch("cat", 5).await;
        assert!(matches!(result, SourceResult::Failed(SourceError::Status(503))));
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_zero_count_skips_source() {
        let mock = Arc::new(MockSource::new("mock", &["https://cdn.example.com/a.jpg"]));
        let adapter = adapter(mock.clone(), RateLimiter::default());
        assert!(adapter.fetch("cat", 0).await.is_empty());
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_wait_for_the_limiter() {
        let mock = Arc::new(MockSource::new("mock", &["https://cdn.example.com/a.jpg"]));
        let adapter = adapter(mock.clone(), RateLimiter::with_period(1, Duration::from_secs(60)));

        let start = tokio::time::Instant::now();
        adapter.fetch("first", 1).await;
        adapter.fetch("second", 1).await;

        assert!(start.elapsed() >= Duration::from_secs(60));
        assert_eq!(mock.calls(), 2);
    }
}
