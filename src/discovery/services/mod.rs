pub mod bing;
pub mod google;
pub mod pexels;
pub mod pinterest;
pub mod pixabay;
pub mod scrape;
pub mod unsplash;

pub use scrape::ScrapeSource;

use super::trait_def::ImageSource;
use super::types::{Availability, descriptor};
use crate::config::{DiscoveryConfig, ENV_UNSPLASH_KEY};
use crate::error::ConfigError;
use crate::fetcher::HttpFetcher;
use std::sync::Arc;
use tracing::info;

/// 依設定建立啟用的來源（保持設定中的順序）
///
/// 需要 key 卻沒有 key 的來源會被略過；unsplash 則改用爬取。
pub fn build_sources(
    config: &DiscoveryConfig,
    fetcher: Arc<HttpFetcher>,
) -> Result<Vec<Arc<dyn ImageSource>>, ConfigError> {
    let keys = &config.api_keys;
    let depth = config.max_json_depth;
    let mut sources: Vec<Arc<dyn ImageSource>> = Vec::with_capacity(config.sources.len());

    for id in &config.sources {
        let desc = descriptor(id).ok_or_else(|| ConfigError::UnknownSource(id.clone()))?;
        let key = desc.api_key(keys).map(str::to_string);

        let source: Arc<dyn ImageSource> = match (desc.id, desc.availability(keys), key) {
            ("bing", ..) => Arc::new(bing::source(fetcher.clone(), depth)?),
            ("google", ..) => Arc::new(google::source(fetcher.clone())?),
            ("pinterest", ..) => Arc::new(pinterest::source(
                fetcher.clone(),
                depth,
                config.pinterest_query_suffix.as_deref(),
            )?),
            ("unsplash", Availability::Ready, Some(key)) => {
                Arc::new(unsplash::UnsplashApi::new(fetcher.clone(), key))
            }
            ("unsplash", ..) => {
                info!("🔑 未設定 {}，unsplash 改用網頁爬取", ENV_UNSPLASH_KEY);
                Arc::new(unsplash::scrape_source(fetcher.clone())?)
            }
            ("pexels", Availability::Ready, Some(key)) => {
                Arc::new(pexels::PexelsApi::new(fetcher.clone(), key))
            }
            ("pixabay", Availability::Ready, Some(key)) => {
                Arc::new(pixabay::PixabayApi::new(fetcher.clone(), key))
            }
            (id, ..) => {
                info!(source = id, "⏭️ 缺少 API key，略過此來源");
                continue;
            }
        };

        sources.push(source);
    }

    if sources.is_empty() {
        return Err(ConfigError::NoSources);
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKeys;
    use std::time::Duration;

    fn fetcher() -> Arc<HttpFetcher> {
        Arc::new(HttpFetcher::new(Duration::from_secs(5), 0..=0).unwrap())
    }

    fn names(sources: &[Arc<dyn ImageSource>]) -> Vec<String> {
        sources.iter().map(|s| s.name().to_string()).collect()
    }

    #[test]
    fn test_keyless_sources_are_skipped() {
        let config = DiscoveryConfig::new();
        let sources = build_sources(&config, fetcher()).unwrap();
        assert_eq!(names(&sources), vec!["bing", "google", "pinterest", "unsplash"]);

        // 沒有 key 的 unsplash 是爬取版本
        assert!(!sources[3].requires_api_key());
    }

    #[test]
    fn test_keys_enable_api_sources() {
        let config = DiscoveryConfig::new()
            .with_sources(&["unsplash", "pexels", "pixabay"])
            .with_api_keys(ApiKeys {
                unsplash: Some("u".into()),
                pexels: Some("p".into()),
                pixabay: Some("x".into()),
            });
        let sources = build_sources(&config, fetcher()).unwrap();
        assert_eq!(names(&sources), vec!["unsplash", "pexels", "pixabay"]);
        assert!(sources.iter().all(|s| s.requires_api_key()));
    }

    #[test]
    fn test_nothing_usable_is_an_error() {
        let config = DiscoveryConfig::new().with_sources(&["pexels"]);
        assert!(matches!(build_sources(&config, fetcher()), Err(ConfigError::NoSources)));
    }
}
