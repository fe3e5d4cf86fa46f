use crate::cache::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
use crate::discovery::types::SOURCE_IDS;
use crate::error::ConfigError;
use crate::parser::DEFAULT_MAX_DEPTH;
use crate::rate_limiter::DEFAULT_PER_MINUTE;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_UNSPLASH_KEY: &str = "UNSPLASH_ACCESS_KEY";
pub const ENV_PEXELS_KEY: &str = "PEXELS_API_KEY";
pub const ENV_PIXABAY_KEY: &str = "PIXABAY_API_KEY";

const ENV_RATE_LIMIT: &str = "IMAGE_SCOUT_RATE_LIMIT";
const ENV_CACHE_TTL: &str = "IMAGE_SCOUT_CACHE_TTL_SECS";
const ENV_CACHE_MAX: &str = "IMAGE_SCOUT_CACHE_MAX_ENTRIES";
const ENV_TIMEOUT: &str = "IMAGE_SCOUT_TIMEOUT_SECS";
const ENV_FANOUT_TIMEOUT: &str = "IMAGE_SCOUT_FANOUT_TIMEOUT_SECS";
const ENV_SOURCES: &str = "IMAGE_SCOUT_SOURCES";
const ENV_PINTEREST_SUFFIX: &str = "IMAGE_SCOUT_PINTEREST_SUFFIX";

/// 各來源的 API key（沒有就略過或改用爬取）
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub unsplash: Option<String>,
    pub pexels: Option<String>,
    pub pixabay: Option<String>,
}

/// 搜尋引擎配置
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// 每分鐘對外請求上限（所有來源合計）
    pub rate_limit_per_minute: usize,
    /// 快取存活時間
    pub cache_ttl: Duration,
    /// 快取最大項目數
    pub cache_max_entries: usize,
    /// 單次 HTTP 請求超時
    pub request_timeout: Duration,
    /// 請求前隨機延遲（毫秒）
    pub jitter_ms: RangeInclusive<u64>,
    /// 單一來源在一次查詢中的等待上限，None 表示只受 HTTP 超時限制
    pub fanout_timeout: Option<Duration>,
    /// 內嵌 JSON 走訪深度上限
    pub max_json_depth: usize,
    /// 診斷模式下每個來源之間的間隔
    pub probe_delay: Duration,
    /// 啟用的來源 id
    pub sources: Vec<String>,
    /// 附加在 pinterest 查詢後面的字，例如 `avatar profile picture`
    pub pinterest_query_suffix: Option<String>,
    pub api_keys: ApiKeys,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: DEFAULT_PER_MINUTE,
            cache_ttl: DEFAULT_TTL,
            cache_max_entries: DEFAULT_MAX_ENTRIES,
            request_timeout: Duration::from_secs(15),
            jitter_ms: 300..=1500,
            fanout_timeout: None,
            max_json_depth: DEFAULT_MAX_DEPTH,
            probe_delay: Duration::from_secs(1),
            sources: SOURCE_IDS.iter().map(|s| s.to_string()).collect(),
            pinterest_query_suffix: None,
            api_keys: ApiKeys::default(),
        }
    }
}

impl DiscoveryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 從環境變數讀取，未設定的欄位使用預設值
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 以任意查找函式讀取設定（方便測試）
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = parse_var::<usize>(&lookup, ENV_RATE_LIMIT)? {
            config.rate_limit_per_minute = v;
        }
        if let Some(v) = parse_var::<u64>(&lookup, ENV_CACHE_TTL)? {
            config.cache_ttl = Duration::from_secs(v);
        }
        if let Some(v) = parse_var::<usize>(&lookup, ENV_CACHE_MAX)? {
            config.cache_max_entries = v;
        }
        if let Some(v) = parse_var::<u64>(&lookup, ENV_TIMEOUT)? {
            config.request_timeout = Duration::from_secs(v);
        }
        if let Some(v) = parse_var::<u64>(&lookup, ENV_FANOUT_TIMEOUT)? {
            config.fanout_timeout = Some(Duration::from_secs(v));
        }
        if let Some(list) = non_empty(&lookup, ENV_SOURCES) {
            config.sources = split_list(&list);
        }
        config.pinterest_query_suffix = non_empty(&lookup, ENV_PINTEREST_SUFFIX);

        config.api_keys = ApiKeys {
            unsplash: non_empty(&lookup, ENV_UNSPLASH_KEY),
            pexels: non_empty(&lookup, ENV_PEXELS_KEY),
            pixabay: non_empty(&lookup, ENV_PIXABAY_KEY),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn with_rate_limit(mut self, per_minute: usize) -> Self {
        self.rate_limit_per_minute = per_minute;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.request_timeout = Duration::from_secs(timeout_secs);
        self
    }

    pub fn with_cache(mut self, ttl: Duration, max_entries: usize) -> Self {
        self.cache_ttl = ttl;
        self.cache_max_entries = max_entries;
        self
    }

    pub fn with_jitter(mut self, jitter_ms: RangeInclusive<u64>) -> Self {
        self.jitter_ms = jitter_ms;
        self
    }

    pub fn with_fanout_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fanout_timeout = timeout;
        self
    }

    pub fn with_sources<S: AsRef<str>>(mut self, sources: &[S]) -> Self {
        self.sources = sources.iter().map(|s| s.as_ref().trim().to_lowercase()).collect();
        self
    }

    pub fn with_pinterest_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.pinterest_query_suffix = Some(suffix.into());
        self
    }

    pub fn with_api_keys(mut self, keys: ApiKeys) -> Self {
        self.api_keys = keys;
        self
    }

    /// 檢查設定，錯誤會在啟動時中止程式
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit_per_minute == 0 {
            return Err(ConfigError::ZeroRateLimit);
        }
        if self.cache_max_entries == 0 {
            return Err(ConfigError::ZeroCacheCapacity);
        }
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        if let Some(unknown) = self.sources.iter().find(|s| !SOURCE_IDS.contains(&s.as_str())) {
            return Err(ConfigError::UnknownSource(unknown.clone()));
        }
        Ok(())
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, ConfigError> {
    match non_empty(lookup, name) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| ConfigError::InvalidEnv {
            name: name.to_string(),
            value,
        }),
    }
}

pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
