use super::scrape::ScrapeSource;
use crate::error::ConfigError;
use crate::fetcher::HttpFetcher;
use crate::parser::{DomStrategy, PatternStrategy, StrategyChain, UrlRewrite};
use std::sync::Arc;

pub const NAME: &str = "google";
const REFERER: &str = "https://www.google.com/";

pub fn endpoint(query: &str) -> String {
    format!(
        "https://www.google.com/search?q={}&tbm=isch&tbs=isz:m&safe=active",
        urlencoding::encode(query)
    )
}

/// Google 圖片頁沒有穩定的 script id，直接從內嵌陣列比對
pub fn strategies() -> Result<StrategyChain, ConfigError> {
    Ok(StrategyChain::new()
        .then(
            PatternStrategy::new(&[
                r#"(?i)"ou":"(https?://[^"]+)""#,
                r#"(?i)"url":"(https?://[^"]+)""#,
                r#"(?i)\["(https?://[^"]+\.(?:jpg|jpeg|png|webp|gif))""#,
            ])?
            .with_rewrite(UrlRewrite::TruncateAt('&')),
        )
        .then(DomStrategy::new(REFERER)?))
}

pub fn source(fetcher: Arc<HttpFetcher>) -> Result<ScrapeSource, ConfigError> {
    Ok(ScrapeSource::new(NAME, fetcher, endpoint, REFERER, strategies()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Candidate;

    #[test]
    fn test_endpoint() {
        assert_eq!(
            endpoint("cat"),
            "https://www.google.com/search?q=cat&tbm=isch&tbs=isz:m&safe=active"
        );
    }

    #[test]
    fn test_parses_embedded_arrays() {
        let html = r#"
        <script nonce="x">AF_initDataCallback({data:[null,[
            ["https://encrypted-tbn0.gstatic.com/images?q=tbn:abc",194,259],
            ["https://upload.example.org/wiki/Cat.JPG",1200,800],
            ["https:\/\/cdn.example.com\/cats\/tabby.png",640,480]
        ]]});</script>
        "#;
        let found = strategies().unwrap().run(html, 10).unwrap();
        assert_eq!(
            found,
            vec![
                Candidate::new("https://upload.example.org/wiki/Cat.JPG"),
                Candidate::new("https://cdn.example.com/cats/tabby.png"),
            ]
        );
    }

    #[test]
    fn test_legacy_ou_field_is_cut_at_ampersand() {
        let html = r#"{"ou":"https://img.example.com/a.jpg&amp;w=1","ow":800}"#;
        let found = strategies().unwrap().run(html, 10).unwrap();
        assert_eq!(found, vec![Candidate::new("https://img.example.com/a.jpg")]);
    }
}
