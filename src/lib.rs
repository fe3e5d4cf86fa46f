//! 多來源圖片搜尋
//!
//! 同時查詢多個圖片網站與 API，合併、去重、驗證後回傳圖片 URL。

pub mod cache;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fetcher;
pub mod parser;
pub mod rate_limiter;
pub mod types;
pub mod validator;

pub use cache::ResultCache;
pub use config::{ApiKeys, DiscoveryConfig};
pub use discovery::{Aggregator, ImageSource, SourceAdapter};
pub use error::{ConfigError, SourceError};
pub use rate_limiter::RateLimiter;
pub use types::{Candidate, CandidateUrl, SearchQuery, SourceReport, SourceResult};
