use crate::discovery::trait_def::ImageSource;
use crate::error::SourceError;
use crate::fetcher::HttpFetcher;
use crate::parser::StrategyChain;
use crate::types::Candidate;
use std::sync::Arc;

/// 以查詢字串組出搜尋頁網址
pub type EndpointFn = fn(&str) -> String;

/// 爬取 HTML 的通用來源：抓一頁，交給策略鏈解析
pub struct ScrapeSource {
    name: &'static str,
    fetcher: Arc<HttpFetcher>,
    endpoint: EndpointFn,
    referer: &'static str,
    chain: StrategyChain,
    query_suffix: Option<String>,
}

impl ScrapeSource {
    pub fn new(
        name: &'static str,
        fetcher: Arc<HttpFetcher>,
        endpoint: EndpointFn,
        referer: &'static str,
        chain: StrategyChain,
    ) -> Self {
        Self {
            name,
            fetcher,
            endpoint,
            referer,
            chain,
            query_suffix: None,
        }
    }

    /// 送出前附加在查詢後面的字（例如 pinterest 的 `avatar`）
    pub fn with_query_suffix(mut self, suffix: Option<&str>) -> Self {
        self.query_suffix = suffix
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self
    }

    pub fn request_url(&self, query: &str) -> String {
        match &self.query_suffix {
            Some(suffix) => (self.endpoint)(&format!("{} {}", query.trim(), suffix)),
            None => (self.endpoint)(query),
        }
    }
}

#[async_trait::async_trait]
impl ImageSource for ScrapeSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn search(&self, query: &str, count: usize) -> Result<Vec<Candidate>, SourceError> {
        let url = self.request_url(query);
        let html = self.fetcher.get_page(&url, self.referer).await?;
        self.chain.run(&html, count)
    }
}
