use super::scrape::ScrapeSource;
use crate::error::ConfigError;
use crate::fetcher::HttpFetcher;
use crate::parser::{DomStrategy, JsonLocator, PatternStrategy, StrategyChain, StructuredStrategy};
use std::sync::Arc;

pub const NAME: &str = "bing";
const REFERER: &str = "https://www.bing.com/";

pub fn endpoint(query: &str) -> String {
    format!(
        "https://www.bing.com/images/search?q={}&qft=+filterui:imagesize-medium&FORM=IRFLTR",
        urlencoding::encode(query)
    )
}

/// Bing 把每張圖的資料放在 `a.iusc` 的 `m` 屬性（JSON）
pub fn strategies(max_depth: usize) -> Result<StrategyChain, ConfigError> {
    Ok(StrategyChain::new()
        .then(StructuredStrategy::new(
            JsonLocator::Attribute {
                selector: "a.iusc".to_string(),
                attr: "m".to_string(),
            },
            &["murl"],
            max_depth,
        )?)
        .then(PatternStrategy::new(&[
            r#""murl":"(https?://[^"]+)""#,
            r#""turl":"(https?://[^"]+)""#,
        ])?)
        .then(DomStrategy::new(REFERER)?))
}

pub fn source(fetcher: Arc<HttpFetcher>, max_depth: usize) -> Result<ScrapeSource, ConfigError> {
    Ok(ScrapeSource::new(NAME, fetcher, endpoint, REFERER, strategies(max_depth)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DEFAULT_MAX_DEPTH;
    use crate::types::Candidate;

    #[test]
    fn test_endpoint_encodes_query() {
        let url = endpoint("anime boy");
        assert!(url.starts_with("https://www.bing.com/images/search?q=anime%20boy&"));
    }

    #[test]
    fn test_parses_iusc_metadata() {
        let html = r#"
        <div class="imgpt">
            <a class="iusc" m="{&quot;purl&quot;:&quot;https://site.example.com/post&quot;,&quot;murl&quot;:&quot;https://img.example.com/large1.jpg&quot;,&quot;turl&quot;:&quot;https://tse1.mm.bing.net/th?id=1&quot;}"></a>
            <a class="iusc" m="{&quot;murl&quot;:&quot;https://img.example.com/large2.png&quot;}"></a>
            <img src="https://tse1.mm.bing.net/th?id=1">
        </div>
        "#;
        let found = strategies(DEFAULT_MAX_DEPTH).unwrap().run(html, 10).unwrap();
        assert_eq!(
            found,
            vec![
                Candidate::new("https://img.example.com/large1.jpg"),
                Candidate::new("https://img.example.com/large2.png"),
            ]
        );
    }

    #[test]
    fn test_falls_back_to_inline_json() {
        let html = r#"<script>var d = {"murl":"https:\/\/img.example.com\/inline.webp"};</script>"#;
        let found = strategies(DEFAULT_MAX_DEPTH).unwrap().run(html, 10).unwrap();
        assert_eq!(found, vec![Candidate::new("https://img.example.com/inline.webp")]);
    }
}
