use super::scrape::ScrapeSource;
use crate::error::ConfigError;
use crate::fetcher::HttpFetcher;
use crate::parser::{DomStrategy, PatternStrategy, StrategyChain, StructuredStrategy, UrlRewrite};
use std::sync::Arc;

pub const NAME: &str = "pinterest";
const REFERER: &str = "https://www.pinterest.com/";

/// pinimg 的尺寸路徑，由大到小
pub const SIZE_LADDER: &[&str] = &["originals", "736x", "564x", "474x", "236x", "170x"];

pub fn endpoint(query: &str) -> String {
    format!("https://www.pinterest.com/search/pins/?q={}", urlencoding::encode(query))
}

pub fn strategies(max_depth: usize) -> Result<StrategyChain, ConfigError> {
    Ok(StrategyChain::new()
        .then(StructuredStrategy::script_by_id("__PWS_DATA__", max_depth)?)
        .then(
            PatternStrategy::new(&[
                r#""url":"(https://i\.pinimg\.com/[^"]+)""#,
                r#""src":"(https://i\.pinimg\.com/[^"]+)""#,
                r#"srcset="(https://i\.pinimg\.com/[^"\s]+)"#,
            ])?
            .with_rewrite(UrlRewrite::TruncateAt('?'))
            .with_rewrite(UrlRewrite::upgrade_size(SIZE_LADDER)),
        )
        .then(DomStrategy::new(REFERER)?))
}

pub fn source(
    fetcher: Arc<HttpFetcher>,
    max_depth: usize,
    query_suffix: Option<&str>,
) -> Result<ScrapeSource, ConfigError> {
    Ok(
        ScrapeSource::new(NAME, fetcher, endpoint, REFERER, strategies(max_depth)?)
            .with_query_suffix(query_suffix),
    )
}
