use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::AppResult;
use crate::ledger::models::ContentId;

/// Result of a local presence check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatResult {
    pub local: bool,
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the content's bytes are held locally
    async fn stat(&self, content_id: &ContentId) -> AppResult<StatResult>;

    /// Fetch the content from the network into local storage
    async fn synchronize(&self, content_id: &ContentId) -> AppResult<()>;
}
