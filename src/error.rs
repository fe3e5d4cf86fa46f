use thiserror::Error;

/// 單一來源失敗的原因（不會越過 Aggregator 邊界）
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("請求逾時")]
    Timeout,
    #[error("HTTP 錯誤: {0}")]
    Status(u16),
    #[error("請求失敗: {0}")]
    Transport(String),
    #[error("回應解析失敗: {0}")]
    Decode(String),
    #[error("所有解析策略都沒有找到圖片")]
    ParseExhausted,
    #[error("來源任務異常中止: {0}")]
    Panicked(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SourceError::Timeout
        } else if let Some(status) = e.status() {
            SourceError::Status(status.as_u16())
        } else {
            SourceError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Decode(e.to_string())
    }
}

/// 啟動時的設定錯誤，唯一會中止程式的錯誤類型
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("未知的來源: {0}")]
    UnknownSource(String),
    #[error("速率上限必須大於 0")]
    ZeroRateLimit,
    #[error("快取容量必須大於 0")]
    ZeroCacheCapacity,
    #[error("環境變數 {name} 的值無效: {value}")]
    InvalidEnv { name: String, value: String },
    #[error("來源定義中的選擇器或正規表示式無效: {0}")]
    InvalidPattern(String),
    #[error("沒有任何可用的來源")]
    NoSources,
    #[error("無法建立 HTTP 客戶端: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(SourceError::Status(503).to_string(), "HTTP 錯誤: 503");
        assert!(ConfigError::UnknownSource("flickr".into()).to_string().contains("flickr"));
    }
}
