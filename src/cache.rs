use crate::types::CandidateUrl;
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Aggregator 自己的快取區段
pub const AGGREGATE_NAMESPACE: &str = "aggregate";

#[derive(Debug, Clone)]
struct CacheEntry {
    urls: Vec<CandidateUrl>,
    created_at: Instant,
}

/// 帶 TTL 與容量上限的結果快取
///
/// 讀取用 `peek`，不會改變順序，所以淘汰順序就是寫入順序。
/// 覆寫同一個 key 等於重新寫入。
#[derive(Debug)]
pub struct ResultCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<Vec<CandidateUrl>> {
        let mut entries = self.entries.lock().await;

        let entry = entries.peek(key)?;
        if entry.created_at.elapsed() <= self.ttl {
            return Some(entry.urls.clone());
        }

        entries.pop(key);
        debug!(key, "🗑️ 快取過期");
        None
    }

    pub async fn set(&self, key: &str, urls: Vec<CandidateUrl>) {
        let entry = CacheEntry {
            urls,
            created_at: Instant::now(),
        };

        let mut entries = self.entries.lock().await;
        if let Some((evicted, _)) = entries.push(key.to_string(), entry) {
            if evicted != key {
                debug!(key = %evicted, "快取已滿，淘汰最舊項目");
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 主動清除所有過期項目，回傳清除數量
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.created_at.elapsed() > self.ttl)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

/// 正規化查詢：去頭尾空白、合併連續空白、轉小寫
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 快取鍵：`{namespace}_{sha256(normalized query)}`
pub fn cache_key(namespace: &str, query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_query(query).as_bytes());
    format!("{}_{:x}", namespace, hasher.finalize())
}
