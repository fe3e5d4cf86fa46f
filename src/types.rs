use crate::error::SourceError;
use crate::validator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 預設回傳數量
pub const DEFAULT_COUNT: usize = 10;

/// 回傳數量上限
pub const MAX_COUNT: usize = 50;

/// 一次查詢：文字保持原樣，數量被限制在上限內
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub count: usize,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, count: usize) -> Self {
        Self {
            text: text.into(),
            count: count.min(MAX_COUNT),
        }
    }

    /// 簡化查詢：只取第一個以空白分隔的字
    ///
    /// 單字查詢的簡化結果就是原查詢，回傳 `None`，不重送同一組請求。
    /// 空結果不會寫入快取，所以這裡略過的重試也不會被快取擋下。
    pub fn simplified(&self) -> Option<Self> {
        let first = self.text.split_whitespace().next()?;
        if first == self.text.trim() {
            return None;
        }
        Some(Self::new(first, self.count))
    }
}

/// 尚未驗證的候選 URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    /// 來自保證為圖片的欄位（API / 純圖片 CDN）
    pub trusted: bool,
}

impl Candidate {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), trusted: false }
    }

    pub fn trusted(url: impl Into<String>) -> Self {
        Self { url: url.into(), trusted: true }
    }
}

/// 已通過驗證的圖片 URL，只能經由驗證器建立
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CandidateUrl {
    url: String,
    #[serde(skip)]
    trusted: bool,
}

impl CandidateUrl {
    pub fn new(url: impl Into<String>, trusted: bool) -> Option<Self> {
        let url = url.into();
        validator::validate(&url, trusted).then_some(Self { url, trusted })
    }

    pub fn from_candidate(candidate: Candidate) -> Option<Self> {
        Self::new(candidate.url, candidate.trusted)
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    /// 再次驗證（合併結果時使用）
    pub fn revalidate(&self) -> bool {
        validator::validate(&self.url, self.trusted)
    }

    pub fn into_string(self) -> String {
        self.url
    }
}

impl fmt::Display for CandidateUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// 單一來源的呼叫結果
#[derive(Debug)]
pub enum SourceResult {
    Found(Vec<CandidateUrl>),
    Failed(SourceError),
}

impl SourceResult {
    pub fn is_found(&self) -> bool {
        matches!(self, SourceResult::Found(_))
    }

    pub fn len(&self) -> usize {
        match self {
            SourceResult::Found(urls) => urls.len(),
            SourceResult::Failed(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 來源診斷狀態
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Ok,
    Empty,
    Failed(String),
}

/// 單一來源的診斷紀錄
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: String,
    pub status: ProbeStatus,
    pub count: usize,
    pub elapsed_ms: u64,
    pub probed_at: DateTime<Utc>,
}

impl SourceReport {
    pub fn from_result(source: &str, result: &SourceResult, elapsed_ms: u64) -> Self {
        let status = match result {
            SourceResult::Found(urls) if urls.is_empty() => ProbeStatus::Empty,
            SourceResult::Found(_) => ProbeStatus::Ok,
            SourceResult::Failed(e) => ProbeStatus::Failed(e.to_string()),
        };

        Self {
            source: source.to_string(),
            status,
            count: result.len(),
            elapsed_ms,
            probed_at: Utc::now(),
        }
    }
}
