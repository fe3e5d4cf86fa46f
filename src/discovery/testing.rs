use super::trait_def::ImageSource;
use crate::error::SourceError;
use crate::types::Candidate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Succeed,
    Fail,
    Panic,
}

/// 測試用來源：回傳固定的 URL，並記錄被呼叫的次數
pub struct MockSource {
    name: String,
    urls: Vec<String>,
    behavior: Behavior,
    only_for: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockSource {
    pub fn new(name: &str, urls: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            urls: urls.iter().map(|u| u.to_string()).collect(),
            behavior: Behavior::Succeed,
            only_for: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self { behavior: Behavior::Fail, ..Self::new(name, &[]) }
    }

    pub fn panicking(name: &str) -> Self {
        Self { behavior: Behavior::Panic, ..Self::new(name, &[]) }
    }

    /// 只有這個查詢會有結果，其餘回傳空清單
    pub fn only_for(mut self, query: &str) -> Self {
        self.only_for = Some(query.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ImageSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str, count: usize) -> Result<Vec<Candidate>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.behavior {
            Behavior::Fail => Err(SourceError::Status(503)),
            Behavior::Panic => panic!("{} exploded", self.name),
            Behavior::Succeed => {
                if self.only_for.as_deref().is_some_and(|q| q != query) {
                    return Ok(Vec::new());
                }
                Ok(self.urls.iter().take(count).map(Candidate::new).collect())
            }
        }
    }
}
