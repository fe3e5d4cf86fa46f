use crate::error::{ConfigError, SourceError};
use crate::types::{Candidate, CandidateUrl};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::{debug, trace};

/// JSON 遞迴走訪的預設深度上限
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// 擷取策略 - 從回應內容中找出候選 URL
pub trait ExtractStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, body: &str) -> Vec<Candidate>;
}

// ---------------------------------------------------------------------
// Strategy A: 內嵌 JSON
// ---------------------------------------------------------------------

/// JSON 所在位置
#[derive(Debug, Clone)]
pub enum JsonLocator {
    /// `<script>` 元素的文字內容
    Script(String),
    /// 元素屬性值（例如 Bing 的 `a.iusc[m]`）
    Attribute { selector: String, attr: String },
}

/// 在內嵌 JSON 中遞迴尋找 `url` / `src` / `image` 等欄位
pub struct StructuredStrategy {
    selector: Selector,
    attr: Option<String>,
    fields: Vec<String>,
    max_depth: usize,
}

impl StructuredStrategy {
    pub fn new(
        locator: JsonLocator,
        fields: &[&str],
        max_depth: usize,
    ) -> Result<Self, ConfigError> {
        let (selector, attr) = match locator {
            JsonLocator::Script(selector) => (selector, None),
            JsonLocator::Attribute { selector, attr } => (selector, Some(attr)),
        };

        Ok(Self {
            selector: parse_selector(&selector)?,
            attr,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            max_depth,
        })
    }

    /// 以 id 找 script，例如 `__PWS_DATA__`
    pub fn script_by_id(id: &str, max_depth: usize) -> Result<Self, ConfigError> {
        Self::new(
            JsonLocator::Script(format!("script#{}", id)),
            &["url", "src", "image"],
            max_depth,
        )
    }

    fn blobs(&self, body: &str) -> Vec<String> {
        let document = Html::parse_document(body);
        document
            .select(&self.selector)
            .filter_map(|elem| match &self.attr {
                Some(attr) => elem.value().attr(attr).map(str::to_string),
                None => Some(elem.text().collect::<String>()),
            })
            .collect()
    }
}

impl ExtractStrategy for StructuredStrategy {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn extract(&self, body: &str) -> Vec<Candidate> {
        let mut found = Vec::new();

        for blob in self.blobs(body) {
            match serde_json::from_str::<Value>(blob.trim()) {
                Ok(value) => walk_json(&value, &self.fields, 0, self.max_depth, &mut found),
                Err(e) => trace!(error = %e, "內嵌 JSON 無法解析，略過"),
            }
        }

        found.into_iter().map(|url| Candidate::new(clean_url(&url))).collect()
    }
}

/// 遞迴走訪 JSON 樹，收集指定欄位的字串值
///
/// 深度超過 `max_depth` 時停止往下。
pub fn walk_json(
    value: &Value,
    fields: &[String],
    depth: usize,
    max_depth: usize,
    out: &mut Vec<String>,
) {
    if depth > max_depth {
        return;
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match child {
                    Value::String(s) if fields.iter().any(|f| f == key) => out.push(s.clone()),
                    Value::Object(_) | Value::Array(_) => {
                        walk_json(child, fields, depth + 1, max_depth, out)
                    }
                    _ => {}
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_json(item, fields, depth + 1, max_depth, out);
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------
// Strategy B: 正規表示式
// ---------------------------------------------------------------------

/// 擷取後對 URL 的改寫
#[derive(Debug, Clone)]
pub enum UrlRewrite {
    /// 在第一個出現的字元處截斷（例如 Google 的 `&`）
    TruncateAt(char),
    /// 以新的 query string 取代原本的
    ReplaceQuery(String),
    /// 尺寸階梯，第一個是最大；較小的路徑片段換成最大的
    UpgradeSize(Vec<String>),
}

impl UrlRewrite {
    pub fn upgrade_size(ladder: &[&str]) -> Self {
        UrlRewrite::UpgradeSize(ladder.iter().map(|s| s.to_string()).collect())
    }

    pub fn apply(&self, url: &str) -> String {
        match self {
            UrlRewrite::TruncateAt(c) => url.split(*c).next().unwrap_or(url).to_string(),
            UrlRewrite::ReplaceQuery(query) => {
                let base = url.split('?').next().unwrap_or(url);
                format!("{}?{}", base, query)
            }
            UrlRewrite::UpgradeSize(ladder) => upgrade_size(url, ladder),
        }
    }
}

/// 把路徑中的小尺寸片段換成最大的尺寸（`/236x/` → `/originals/`）
pub fn upgrade_size(url: &str, ladder: &[String]) -> String {
    let Some(largest) = ladder.first() else {
        return url.to_string();
    };

    for smaller in ladder.iter().skip(1) {
        let needle = format!("/{}/", smaller);
        if url.contains(&needle) {
            return url.replacen(&needle, &format!("/{}/", largest), 1);
        }
    }

    url.to_string()
}

/// 針對來源 CDN 網址格式的正規表示式擷取
pub struct PatternStrategy {
    patterns: Vec<Regex>,
    rewrites: Vec<UrlRewrite>,
    trusted: bool,
}

impl PatternStrategy {
    /// 每個 pattern 的第一個 capture group 是 URL
    pub fn new(patterns: &[&str]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidPattern(format!("{}: {}", p, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns,
            rewrites: Vec::new(),
            trusted: false,
        })
    }

    pub fn with_rewrite(mut self, rewrite: UrlRewrite) -> Self {
        self.rewrites.push(rewrite);
        self
    }

    /// 只比對純圖片 CDN 時使用：結果略過副檔名檢查
    pub fn trusted_cdn(mut self) -> Self {
        self.trusted = true;
        self
    }
}

impl ExtractStrategy for PatternStrategy {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn extract(&self, body: &str) -> Vec<Candidate> {
        let body = unescape_slashes(body);
        let mut found = Vec::new();

        // 依序嘗試，第一個有結果的 pattern 就停
        for pattern in &self.patterns {
            for caps in pattern.captures_iter(&body) {
                let Some(m) = caps.get(1) else { continue };

                let mut url = clean_url(m.as_str());
                for rewrite in &self.rewrites {
                    url = rewrite.apply(&url);
                }

                found.push(Candidate { url, trusted: self.trusted });
            }

            if found.iter().any(|c| CandidateUrl::new(c.url.as_str(), c.trusted).is_some()) {
                break;
            }
        }

        found
    }
}

// ---------------------------------------------------------------------
// Strategy C: DOM
// ---------------------------------------------------------------------

/// 掃描 `<img>` 的 `src` / `data-src`
pub struct DomStrategy {
    base_url: String,
    selector: Selector,
    attrs: Vec<String>,
}

impl DomStrategy {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            selector: parse_selector("img")?,
            attrs: vec!["src".to_string(), "data-src".to_string()],
        })
    }
}

impl ExtractStrategy for DomStrategy {
    fn name(&self) -> &'static str {
        "dom"
    }

    fn extract(&self, body: &str) -> Vec<Candidate> {
        let document = Html::parse_document(body);
        let mut found = Vec::new();

        for elem in document.select(&self.selector) {
            for attr in &self.attrs {
                if let Some(value) = elem.value().attr(attr) {
                    let value = value.trim();
                    if value.is_empty() || value.starts_with("data:") {
                        continue;
                    }
                    found.push(Candidate::new(normalize_url(value, &self.base_url)));
                }
            }
        }

        found
    }
}

// ---------------------------------------------------------------------
// 策略鏈
// ---------------------------------------------------------------------

/// 依優先順序嘗試策略，第一個產生有效候選的策略勝出
#[derive(Default)]
pub struct StrategyChain {
    strategies: Vec<Box<dyn ExtractStrategy>>,
}

impl StrategyChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, strategy: impl ExtractStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// 回傳去重後的有效候選（最多 `count` 個）
    pub fn run(&self, body: &str, count: usize) -> Result<Vec<Candidate>, SourceError> {
        for strategy in &self.strategies {
            let mut seen = HashSet::new();
            let valid: Vec<Candidate> = strategy
                .extract(body)
                .into_iter()
                .filter(|c| CandidateUrl::new(c.url.as_str(), c.trusted).is_some())
                .filter(|c| seen.insert(c.url.clone()))
                .take(count)
                .collect();

            if !valid.is_empty() {
                debug!(strategy = strategy.name(), count = valid.len(), "策略找到圖片");
                return Ok(valid);
            }
            trace!(strategy = strategy.name(), "策略沒有結果，改用下一個");
        }

        Err(SourceError::ParseExhausted)
    }
}

// ---------------------------------------------------------------------
// 共用工具
// ---------------------------------------------------------------------

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidPattern(format!("{}: {:?}", selector, e)))
}

/// 頁面內嵌的 JS 字串常把 `/` 寫成 `\/` 或 `\u002F`
fn unescape_slashes(body: &str) -> Cow<'_, str> {
    if body.contains('\\') {
        Cow::Owned(body.replace("\\/", "/").replace("\\u002F", "/").replace("\\u002f", "/"))
    } else {
        Cow::Borrowed(body)
    }
}

/// 還原嵌在 JSON / JS 字串中的跳脫字元
pub fn clean_url(raw: &str) -> String {
    raw.trim()
        .replace("\\/", "/")
        .replace("\\u002F", "/")
        .replace("\\u002f", "/")
        .replace("\\u0026", "&")
        .replace("\\u003d", "=")
        .replace("\\u003D", "=")
        .replace("&amp;", "&")
}

/// 正規化 URL（處理相對路徑）
pub fn normalize_url(url: &str, base_url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else if url.starts_with("//") {
        format!("https:{}", url)
    } else if url.starts_with('/') {
        format!("{}{}", base_url, url)
    } else {
        format!("{}/{}", base_url, url)
    }
}
