use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, StorageError};
use crate::ledger::{client::LedgerClient, models::{ContentId, PhysicalAddress}};
use crate::storage::traits::{StatResult, StorageBackend};

#[derive(Debug, Clone)]
pub struct IpfsConfig {
    pub api_url: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FilesStatResponse {
    #[serde(default)]
    local: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IpfsErrorResponse {
    message: String,
}

/// Storage backend over an IPFS node's HTTP API
///
/// Content ids are resolved to IPFS hashes through the ledger on every call;
/// `synchronize` pins the hash, which makes the node fetch it from peers.
pub struct IpfsStorage {
    config: IpfsConfig,
    client: Client,
    ledger: Arc<dyn LedgerClient>,
}

impl IpfsStorage {
    pub fn new(config: IpfsConfig, ledger: Arc<dyn LedgerClient>) -> AppResult<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { config, client, ledger })
    }

    async fn resolve(&self, content_id: &ContentId) -> AppResult<PhysicalAddress> {
        self.ledger
            .resolve_content_address(content_id)
            .await?
            .ok_or_else(|| StorageError::Unresolvable(content_id.clone()).into())
    }

    async fn post(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Response, String> {
        let url = format!("{}/api/v0/{}", self.config.api_url.trim_end_matches('/'), path);
        let response = self
            .client
            .post(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| format!("{:?}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<IpfsErrorResponse>(&error_text)
                .map(|e| e.message)
                .unwrap_or(error_text);
            return Err(format!("HTTP {}: {}", status, message));
        }

        Ok(response)
    }
}

#[async_trait]
impl StorageBackend for IpfsStorage {
    fn name(&self) -> &'static str {
        "ipfs"
    }

    async fn stat(&self, content_id: &ContentId) -> AppResult<StatResult> {
        let address = self.resolve(content_id).await?;
        let path = format!("/ipfs/{}", address);

        let stat_error = |message: String| -> AppError {
            StorageError::Stat {
                content_id: content_id.clone(),
                message,
            }
            .into()
        };

        let response = self
            .post("files/stat", &[("arg", path.as_str()), ("with-local", "true")])
            .await
            .map_err(stat_error)?;

        let stat: FilesStatResponse = response
            .json()
            .await
            .map_err(|e| stat_error(format!("{:?}", e)))?;

        let local = stat.local.unwrap_or(false);
        debug!("📦 {} ({}) local={}", content_id, address, local);

        Ok(StatResult { local })
    }

    async fn synchronize(&self, content_id: &ContentId) -> AppResult<()> {
        let address = self.resolve(content_id).await?;

        info!("📥 Pinning {} ({})", content_id, address);

        self.post("pin/add", &[("arg", address.as_str())])
            .await
            .map_err(|message| StorageError::Sync {
                content_id: content_id.clone(),
                message,
            })?;

        info!("✓ Pinned {}", content_id);
        Ok(())
    }
}
