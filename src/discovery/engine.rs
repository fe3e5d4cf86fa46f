use super::adapter::SourceAdapter;
use super::services::build_sources;
use super::trait_def::ImageSource;
use super::utils::{dedup_valid, shuffle_truncate};
use crate::cache::{AGGREGATE_NAMESPACE, ResultCache, cache_key};
use crate::config::DiscoveryConfig;
use crate::error::{ConfigError, SourceError};
use crate::fetcher::HttpFetcher;
use crate::rate_limiter::RateLimiter;
use crate::types::{CandidateUrl, MAX_COUNT, SearchQuery, SourceReport, SourceResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// 多來源圖片搜尋引擎
pub struct Aggregator {
    adapters: Vec<Arc<SourceAdapter>>,
    cache: Arc<ResultCache>,
    fanout_timeout: Option<Duration>,
    probe_delay: Duration,
}

impl Aggregator {
    /// 依設定建立所有共用元件與來源
    pub fn from_config(config: &DiscoveryConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let fetcher = Arc::new(HttpFetcher::new(config.request_timeout, config.jitter_ms.clone())?);
        let sources = build_sources(config, fetcher)?;
        let cache = Arc::new(ResultCache::new(config.cache_ttl, config.cache_max_entries));
        let limiter = Arc::new(RateLimiter::new(config.rate_limit_per_minute));

        info!(
            sources = sources.len(),
            rate_limit = config.rate_limit_per_minute,
            "🚀 搜尋引擎已就緒"
        );

        Ok(Self::with_sources(sources, cache, limiter)
            .with_fanout_timeout(config.fanout_timeout)
            .with_probe_delay(config.probe_delay))
    }

    /// 以現成的來源建立（所有 adapter 共用同一個快取與限流器）
    pub fn with_sources(
        sources: Vec<Arc<dyn ImageSource>>,
        cache: Arc<ResultCache>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        let adapters = sources
            .into_iter()
            .map(|source| Arc::new(SourceAdapter::new(source, cache.clone(), limiter.clone())))
            .collect();

        Self {
            adapters,
            cache,
            fanout_timeout: None,
            probe_delay: Duration::from_secs(1),
        }
    }

    pub fn with_fanout_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fanout_timeout = timeout;
        self
    }

    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// 搜尋圖片：最多 `count` 個、不重複、全部通過驗證的 URL
    pub async fn search(&self, query: &str, count: usize) -> Vec<String> {
        self.search_candidates(&SearchQuery::new(query, count))
            .await
            .into_iter()
            .map(CandidateUrl::into_string)
            .collect()
    }

    /// 同 [`search`](Self::search)，但保留型別化的 URL
    pub async fn search_candidates(&self, query: &SearchQuery) -> Vec<CandidateUrl> {
        if query.count == 0 || query.text.trim().is_empty() {
            return Vec::new();
        }

        let urls = self.search_once(&query.text, query.count).await;
        if !urls.is_empty() {
            return urls;
        }

        // 沒有結果時只用第一個字再試一次
        match query.simplified() {
            Some(simple) => {
                info!(
                    query = %query.text,
                    fallback = %simple.text,
                    "🔁 無結果，改用簡化查詢"
                );
                self.search_once(&simple.text, simple.count).await
            }
            None => urls,
        }
    }

    async fn search_once(&self, query: &str, count: usize) -> Vec<CandidateUrl> {
        let key = cache_key(AGGREGATE_NAMESPACE, query);
        if let Some(cached) = self.cache.get(&key).await {
            debug!(query, count = cached.len(), "💾 彙總快取命中");
            return shuffle_truncate(cached, count);
        }

        let (found, failed) = self.fan_out(query).await;
        let merged = dedup_valid(found);

        // 有來源失敗時不存，下次查詢才會再問那個來源
        if !merged.is_empty() && failed == 0 {
            self.cache.set(&key, merged.clone()).await;
        }

        shuffle_truncate(merged, count)
    }

    /// 同時查詢所有來源，依完成順序合併；回傳合併結果與失敗的來源數
    ///
    /// 每個來源都取滿 `MAX_COUNT`，截斷留到最後。
    async fn fan_out(&self, query: &str) -> (Vec<CandidateUrl>, usize) {
        let count = MAX_COUNT;
        let mut tasks = JoinSet::new();

        for adapter in &self.adapters {
            let adapter = adapter.clone();
            let query = query.to_string();
            let limit = self.fanout_timeout;

            tasks.spawn(async move {
                match limit {
                    None => adapter.fetch(&query, count).await,
                    Some(limit) => tokio::time::timeout(limit, adapter.fetch(&query, count))
                        .await
                        .unwrap_or_else(|_| {
                            warn!(
                                source = adapter.name(),
                                query = %query,
                                "⏰ 來源超過等待上限"
                            );
                            SourceResult::Failed(SourceError::Timeout)
                        }),
                }
            });
        }

        let mut merged = Vec::new();
        let mut failed = 0usize;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(SourceResult::Found(urls)) => merged.extend(urls),
                Ok(SourceResult::Failed(_)) => failed += 1,
                Err(e) => {
                    failed += 1;
                    let err = SourceError::Panicked(e.to_string());
                    warn!(query, error = %err, "💥 來源任務中止");
                }
            }
        }

        info!(
            query,
            count = merged.len(),
            failed,
            sources = self.adapters.len(),
            "📊 所有來源已回應"
        );

        (merged, failed)
    }

    /// 逐一診斷每個來源，來源之間暫停 `probe_delay`
    pub async fn probe(
        &self,
        query: &str,
        count: usize,
        mut on_report: impl FnMut(&SourceReport),
    ) -> Vec<SourceReport> {
        let count = count.min(MAX_COUNT);
        let mut reports = Vec::with_capacity(self.adapters.len());

        for (i, adapter) in self.adapters.iter().enumerate() {
            if i > 0 && !self.probe_delay.is_zero() {
                tokio::time::sleep(self.probe_delay).await;
            }

            let started = Instant::now();
            let result = adapter.fetch(query, count).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            let report = SourceReport::from_result(adapter.name(), &result, elapsed_ms);
            on_report(&report);
            reports.push(report);
        }

        reports
    }
}
