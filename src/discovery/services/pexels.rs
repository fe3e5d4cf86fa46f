use crate::discovery::trait_def::ImageSource;
use crate::error::SourceError;
use crate::fetcher::HttpFetcher;
use crate::types::Candidate;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::sync::Arc;

pub const NAME: &str = "pexels";
const REFERER: &str = "https://www.pexels.com/";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    src: PhotoSrc,
}

#[derive(Debug, Deserialize)]
struct PhotoSrc {
    large: Option<String>,
    original: Option<String>,
    medium: Option<String>,
}

pub struct PexelsApi {
    fetcher: Arc<HttpFetcher>,
    api_key: String,
}

impl PexelsApi {
    pub fn new(fetcher: Arc<HttpFetcher>, api_key: String) -> Self {
        Self { fetcher, api_key }
    }
}

pub fn endpoint(query: &str, count: usize) -> String {
    format!(
        "https://api.pexels.com/v1/search?query={}&per_page={}",
        urlencoding::encode(query),
        count.clamp(1, 80)
    )
}

pub fn parse_response(body: &str, count: usize) -> Result<Vec<Candidate>, SourceError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .photos
        .into_iter()
        .filter_map(|photo| photo.src.large.or(photo.src.original).or(photo.src.medium))
        .map(Candidate::trusted)
        .take(count)
        .collect())
}

#[async_trait::async_trait]
impl ImageSource for PexelsApi {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(&self, query: &str, count: usize) -> Result<Vec<Candidate>, SourceError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&self.api_key)
            .map_err(|e| SourceError::Transport(format!("無效的 API key: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);

        let body = self.fetcher.get_api(&endpoint(query, count), REFERER, headers).await?;
        parse_response(&body, count)
    }

    fn requires_api_key(&self) -> bool {
        true
    }
}
