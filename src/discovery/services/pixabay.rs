use crate::discovery::trait_def::ImageSource;
use crate::error::SourceError;
use crate::fetcher::HttpFetcher;
use crate::types::Candidate;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::sync::Arc;

pub const NAME: &str = "pixabay";
const REFERER: &str = "https://pixabay.com/";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "webformatURL")]
    webformat_url: Option<String>,
    #[serde(rename = "largeImageURL")]
    large_image_url: Option<String>,
}

pub struct PixabayApi {
    fetcher: Arc<HttpFetcher>,
    api_key: String,
}

impl PixabayApi {
    pub fn new(fetcher: Arc<HttpFetcher>, api_key: String) -> Self {
        Self { fetcher, api_key }
    }
}

/// Pixabay 的 per_page 只接受 3..=200
pub fn endpoint(api_key: &str, query: &str, count: usize) -> String {
    format!(
        "https://pixabay.com/api/?key={}&q={}&image_type=photo&safesearch=true&per_page={}",
        urlencoding::encode(api_key),
        urlencoding::encode(query),
        count.clamp(3, 200)
    )
}

pub fn parse_response(body: &str, count: usize) -> Result<Vec<Candidate>, SourceError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .hits
        .into_iter()
        .filter_map(|hit| hit.webformat_url.or(hit.large_image_url))
        .map(Candidate::trusted)
        .take(count)
        .collect())
}

#[async_trait::async_trait]
impl ImageSource for PixabayApi {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(&self, query: &str, count: usize) -> Result<Vec<Candidate>, SourceError> {
        let url = endpoint(&self.api_key, query, count);
        let body = self.fetcher.get_api(&url, REFERER, HeaderMap::new()).await?;
        parse_response(&body, count)
    }

    fn requires_api_key(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let body = r#"{"total":2,"totalHits":2,"hits":[
            {"id":1,"webformatURL":"https://pixabay.com/get/a_640.jpg","largeImageURL":"https://pixabay.com/get/a_1280.jpg"},
            {"id":2,"largeImageURL":"https://pixabay.com/get/b_1280.png"}
        ]}"#;
        assert_eq!(
            parse_response(body, 1).unwrap(),
            vec![Candidate::trusted("https://pixabay.com/get/a_640.jpg")]
        );
        assert_eq!(parse_response(body, 10).unwrap().len(), 2);
    }

    #[test]
    fn test_endpoint_clamps_page_size() {
        assert!(endpoint("k", "sky", 1).ends_with("per_page=3"));
        assert!(endpoint("k", "sky", 500).ends_with("per_page=200"));
    }
}
