use crate::error::SourceError;
use crate::types::Candidate;

/// 圖片來源 Trait
///
/// 實作只負責「一次請求 + 解析」；快取、限流、驗證與錯誤隔離
/// 由 [`SourceAdapter`](super::SourceAdapter) 統一處理。
#[async_trait::async_trait]
pub trait ImageSource: Send + Sync {
    /// 來源 id，同時是快取命名空間
    fn name(&self) -> &str;

    /// 送出一次請求並擷取最多 `count` 個候選 URL
    async fn search(&self, query: &str, count: usize) -> Result<Vec<Candidate>, SourceError>;

    /// 是否需要 API key
    fn requires_api_key(&self) -> bool {
        false
    }
}
