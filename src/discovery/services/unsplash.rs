use super::scrape::ScrapeSource;
use crate::discovery::trait_def::ImageSource;
use crate::error::{ConfigError, SourceError};
use crate::fetcher::HttpFetcher;
use crate::parser::{PatternStrategy, StrategyChain, UrlRewrite};
use crate::types::Candidate;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::sync::Arc;

pub const NAME: &str = "unsplash";
const REFERER: &str = "https://unsplash.com/";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: Option<String>,
    full: Option<String>,
    small: Option<String>,
}

/// Unsplash 官方 API
pub struct UnsplashApi {
    fetcher: Arc<HttpFetcher>,
    access_key: String,
}

impl UnsplashApi {
    pub fn new(fetcher: Arc<HttpFetcher>, access_key: String) -> Self {
        Self { fetcher, access_key }
    }

    fn headers(&self) -> Result<HeaderMap, SourceError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Client-ID {}", self.access_key))
            .map_err(|e| SourceError::Transport(format!("無效的 API key: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Accept-Version", HeaderValue::from_static("v1"));
        Ok(headers)
    }
}

pub fn api_endpoint(query: &str, count: usize) -> String {
    format!(
        "https://api.unsplash.com/search/photos?query={}&per_page={}&orientation=squarish",
        urlencoding::encode(query),
        count.clamp(1, 30)
    )
}

/// `results[].urls.regular`，缺少時依序退回 `full` / `small`
pub fn parse_response(body: &str, count: usize) -> Result<Vec<Candidate>, SourceError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .results
        .into_iter()
        .filter_map(|photo| photo.urls.regular.or(photo.urls.full).or(photo.urls.small))
        .map(Candidate::trusted)
        .take(count)
        .collect())
}

#[async_trait::async_trait]
impl ImageSource for UnsplashApi {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(&self, query: &str, count: usize) -> Result<Vec<Candidate>, SourceError> {
        let body = self
            .fetcher
            .get_api(&api_endpoint(query, count), REFERER, self.headers()?)
            .await?;
        parse_response(&body, count)
    }

    fn requires_api_key(&self) -> bool {
        true
    }
}

pub fn scrape_endpoint(query: &str) -> String {
    format!("https://unsplash.com/s/photos/{}", urlencoding::encode(query))
}

/// 沒有 API key 時改爬搜尋頁；images.unsplash.com 只提供圖片
pub fn scrape_strategies() -> Result<StrategyChain, ConfigError> {
    Ok(StrategyChain::new().then(
        PatternStrategy::new(&[
            r#"srcSet="(https://images\.unsplash\.com/[^"\s]+)"#,
            r#"src="(https://images\.unsplash\.com/photo-[^"\s]+)""#,
        ])?
        .with_rewrite(UrlRewrite::ReplaceQuery("w=800&q=80&fm=jpg".to_string()))
        .trusted_cdn(),
    ))
}

pub fn scrape_source(fetcher: Arc<HttpFetcher>) -> Result<ScrapeSource, ConfigError> {
    Ok(ScrapeSource::new(NAME, fetcher, scrape_endpoint, REFERER, scrape_strategies()?))
}
