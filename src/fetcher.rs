use crate::error::{ConfigError, SourceError};
use rand::Rng;
use rand::seq::IndexedRandom;
use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER, USER_AGENT,
};
use reqwest::Client;
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::debug;

/// 輪替使用的瀏覽器 User-Agent
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const LANGUAGE: &str = "en-US,en;q=0.9,fr;q=0.8";
const ENCODING: &str = "gzip, deflate, br";

/// 隨機挑一個 User-Agent
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// 模仿瀏覽器的 headers
pub fn browser_headers(referer: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(random_user_agent()));
    headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(LANGUAGE));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(ENCODING));
    headers.insert("DNT", HeaderValue::from_static("1"));
    headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));

    if let Some(referer) = referer {
        if let Ok(value) = HeaderValue::from_str(referer) {
            headers.insert(REFERER, value);
        }
    }

    headers
}

/// API 請求：瀏覽器 headers 改成要 JSON，再疊上授權 headers
pub fn api_headers(referer: &str, auth: HeaderMap) -> HeaderMap {
    let mut headers = browser_headers(Some(referer));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.remove("Upgrade-Insecure-Requests");
    headers.extend(auth);
    headers
}

/// 共用的 HTTP 實作（所有來源共用同一個連線池）
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    jitter_ms: RangeInclusive<u64>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, jitter_ms: RangeInclusive<u64>) -> Result<Self, ConfigError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, jitter_ms })
    }

    /// 抓取 HTML 頁面：先隨機延遲，再帶著瀏覽器 headers 送出一次 GET
    pub async fn get_page(&self, url: &str, referer: &str) -> Result<String, SourceError> {
        self.jitter().await;
        self.get_text(url, browser_headers(Some(referer))).await
    }

    /// 呼叫 JSON API（不延遲，由呼叫端提供授權 headers）
    pub async fn get_api(
        &self,
        url: &str,
        referer: &str,
        auth: HeaderMap,
    ) -> Result<String, SourceError> {
        self.get_text(url, api_headers(referer, auth)).await
    }

    async fn get_text(&self, url: &str, headers: HeaderMap) -> Result<String, SourceError> {
        debug!(url, "🌐 送出請求");

        let response = self.client.get(url).headers(headers).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    async fn jitter(&self) {
        let (low, high) = (*self.jitter_ms.start(), *self.jitter_ms.end());
        if high == 0 {
            return;
        }

        // ThreadRng 不能跨 await 持有
        let delay = {
            let mut rng = rand::rng();
            if low >= high { low } else { rng.random_range(low..=high) }
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_headers() {
        let headers = browser_headers(Some("https://www.bing.com/"));
        let ua = headers.get(USER_AGENT).unwrap().to_str().unwrap();
        assert!(USER_AGENTS.contains(&ua));
        assert_eq!(headers.get(REFERER).unwrap(), "https://www.bing.com/");
        assert_eq!(headers.get(ACCEPT_ENCODING).unwrap(), ENCODING);
        assert!(headers.get(ACCEPT_LANGUAGE).is_some());
    }

    #[test]
    fn test_headers_without_referer() {
        assert!(browser_headers(None).get(REFERER).is_none());
    }

    #[test]
    fn test_api_headers_keep_browser_set() {
        let mut auth = HeaderMap::new();
        auth.insert(reqwest::header::AUTHORIZATION, HeaderValue::from_static("Client-ID k"));

        let headers = api_headers("https://unsplash.com/", auth);
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
        assert_eq!(headers.get(ACCEPT_ENCODING).unwrap(), ENCODING);
        assert_eq!(headers.get(ACCEPT_LANGUAGE).unwrap(), LANGUAGE);
        assert_eq!(headers.get(REFERER).unwrap(), "https://unsplash.com/");
        assert_eq!(headers.get(reqwest::header::AUTHORIZATION).unwrap(), "Client-ID k");
        assert!(headers.get("Upgrade-Insecure-Requests").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_jitter_stays_in_range() {
        let fetcher = HttpFetcher::new(Duration::from_secs(5), 300..=1500).unwrap();
        let start = tokio::time::Instant::now();
        fetcher.jitter().await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(300) && waited <= Duration::from_millis(1500));
    }
}
