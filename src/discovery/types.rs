use crate::config::{ApiKeys, ENV_PEXELS_KEY, ENV_PIXABAY_KEY, ENV_UNSPLASH_KEY};
use serde::Serialize;

/// 所有已知來源的 id
pub const SOURCE_IDS: &[&str] = &["bing", "google", "pinterest", "unsplash", "pexels", "pixabay"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// 爬取 HTML
    Scrape,
    /// 有文件的 JSON API
    Api,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Scrape => "scrape",
            SourceKind::Api => "api",
        }
    }
}

/// 來源描述：啟動時載入一次，執行期間不變
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SourceDescriptor {
    pub id: &'static str,
    pub kind: SourceKind,
    pub endpoint: &'static str,
    /// 策略鏈（依優先順序）
    pub strategies: &'static [&'static str],
    /// API key 的環境變數名稱
    pub key_env: Option<&'static str>,
    /// 沒有 key 時是否改用爬取
    pub scrape_fallback: bool,
}

/// 來源在目前設定下的狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Ready,
    /// 沒有 key，改用爬取
    Fallback,
    /// 沒有 key，略過
    MissingKey,
}

pub const REGISTRY: &[SourceDescriptor] = &[
    SourceDescriptor {
        id: "bing",
        kind: SourceKind::Scrape,
        endpoint: "https://www.bing.com/images/search",
        strategies: &["structured", "pattern", "dom"],
        key_env: None,
        scrape_fallback: false,
    },
    SourceDescriptor {
        id: "google",
        kind: SourceKind::Scrape,
        endpoint: "https://www.google.com/search",
        strategies: &["pattern", "dom"],
        key_env: None,
        scrape_fallback: false,
    },
    SourceDescriptor {
        id: "pinterest",
        kind: SourceKind::Scrape,
        endpoint: "https://www.pinterest.com/search/pins/",
        strategies: &["structured", "pattern", "dom"],
        key_env: None,
        scrape_fallback: false,
    },
    SourceDescriptor {
        id: "unsplash",
        kind: SourceKind::Api,
        endpoint: "https://api.unsplash.com/search/photos",
        strategies: &["json"],
        key_env: Some(ENV_UNSPLASH_KEY),
        scrape_fallback: true,
    },
    SourceDescriptor {
        id: "pexels",
        kind: SourceKind::Api,
        endpoint: "https://api.pexels.com/v1/search",
        strategies: &["json"],
        key_env: Some(ENV_PEXELS_KEY),
        scrape_fallback: false,
    },
    SourceDescriptor {
        id: "pixabay",
        kind: SourceKind::Api,
        endpoint: "https://pixabay.com/api/",
        strategies: &["json"],
        key_env: Some(ENV_PIXABAY_KEY),
        scrape_fallback: false,
    },
];

pub fn descriptor(id: &str) -> Option<&'static SourceDescriptor> {
    REGISTRY.iter().find(|d| d.id == id)
}

impl SourceDescriptor {
    pub fn api_key<'a>(&self, keys: &'a ApiKeys) -> Option<&'a str> {
        match self.id {
            "unsplash" => keys.unsplash.as_deref(),
            "pexels" => keys.pexels.as_deref(),
            "pixabay" => keys.pixabay.as_deref(),
            _ => None,
        }
    }

    pub fn availability(&self, keys: &ApiKeys) -> Availability {
        if self.key_env.is_none() || self.api_key(keys).is_some() {
            Availability::Ready
        } else if self.scrape_fallback {
            Availability::Fallback
        } else {
            Availability::MissingKey
        }
    }
}
