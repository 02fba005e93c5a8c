use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    error::{AppResult, LedgerError},
    ledger::{client::LedgerClient, models::*},
};

#[derive(Debug, Clone)]
pub struct RpcLedgerConfig {
    pub rpc_url: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SystemHealth {
    is_syncing: bool,
}

/// Why a single JSON-RPC round trip failed
#[derive(Debug)]
enum RpcFailure {
    Transport(String),
    Rpc { code: i64, message: String },
    Decode(String),
}

impl std::fmt::Display for RpcFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RpcFailure::Transport(message) => write!(f, "transport: {}", message),
            RpcFailure::Rpc { code, message } => write!(f, "rpc error {}: {}", code, message),
            RpcFailure::Decode(message) => write!(f, "decode: {}", message),
        }
    }
}

/// Ledger client speaking JSON-RPC 2.0 to a ledger gateway node
///
/// The gateway signs and submits relationship calls on behalf of the role
/// account; no key material passes through this process.
pub struct RpcLedgerClient {
    config: RpcLedgerConfig,
    client: Client,
    next_id: AtomicU64,
}

impl RpcLedgerClient {
    pub fn new(config: RpcLedgerConfig) -> AppResult<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            config,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcFailure> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!("➡️ {} (id {})", method, id);

        let response = self
            .client
            .post(&self.config.rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .send()
            .await
            .map_err(|e| RpcFailure::Transport(format!("{:?}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RpcFailure::Transport(format!("HTTP {}: {}", status, error_text)));
        }

        let mut body: Map<String, Value> = response
            .json()
            .await
            .map_err(|e| RpcFailure::Decode(format!("{:?}", e)))?;

        if let Some(error) = body.remove("error").filter(|e| !e.is_null()) {
            let error: RpcErrorObject =
                serde_json::from_value(error).map_err(|e| RpcFailure::Decode(e.to_string()))?;
            return Err(RpcFailure::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        // Only an explicit `"result": null` means "nothing there"
        let result = body.remove("result").ok_or_else(|| {
            RpcFailure::Decode(format!("{} reply carries neither result nor error", method))
        })?;

        serde_json::from_value(result).map_err(|e| RpcFailure::Decode(e.to_string()))
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    #[instrument(skip(self))]
    async fn list_known_content_ids(&self) -> AppResult<Vec<ContentId>> {
        let ids = self
            .call("storage_knownContentIds", json!([]))
            .await
            .map_err(|e| LedgerError::ContentListing(e.to_string()))?;

        Ok(ids)
    }

    async fn get_storage_relationship(
        &self,
        provider_id: ProviderId,
        content_id: &ContentId,
    ) -> AppResult<Option<StorageRelationship>> {
        let relationship = self
            .call("storage_getStorageRelationship", json!([provider_id, content_id]))
            .await
            .map_err(|e| LedgerError::RelationshipLookup {
                content_id: content_id.clone(),
                message: e.to_string(),
            })?;

        Ok(relationship)
    }

    async fn create_storage_relationship(
        &self,
        account: &AccountAddress,
        provider_id: ProviderId,
        content_id: &ContentId,
    ) -> AppResult<RelationshipId> {
        let relationship_id = self
            .call(
                "storage_createStorageRelationship",
                json!([account, provider_id, content_id]),
            )
            .await
            .map_err(|e| LedgerError::ChainCall {
                call: "create_storage_relationship",
                target: content_id.to_string(),
                message: e.to_string(),
            })?;

        Ok(relationship_id)
    }

    async fn set_storage_relationship_ready(
        &self,
        account: &AccountAddress,
        provider_id: ProviderId,
        relationship_id: RelationshipId,
        ready: bool,
    ) -> AppResult<()> {
        let _: Option<Value> = self
            .call(
                "storage_setStorageRelationshipReady",
                json!([account, provider_id, relationship_id, ready]),
            )
            .await
            .map_err(|e| LedgerError::ChainCall {
                call: "set_storage_relationship_ready",
                target: format!("relationship {}", relationship_id),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn resolve_content_address(
        &self,
        content_id: &ContentId,
    ) -> AppResult<Option<PhysicalAddress>> {
        let object: Option<DataObject> = self
            .call("storage_getDataObject", json!([content_id]))
            .await
            .map_err(|e| LedgerError::AddressResolution {
                content_id: content_id.clone(),
                message: e.to_string(),
            })?;

        Ok(object.map(|o| {
            if o.liaison_judgement != LiaisonJudgement::Accepted {
                debug!("{} resolved with liaison judgement {:?}", o.content_id, o.liaison_judgement);
            }
            o.physical_address
        }))
    }

    async fn is_synced(&self) -> AppResult<bool> {
        let health: SystemHealth = self
            .call("system_health", json!([]))
            .await
            .map_err(|e| match e {
                RpcFailure::Decode(message) => LedgerError::Decode(message),
                other => LedgerError::Transport(other.to_string()),
            })?;

        Ok(!health.is_syncing)
    }
}
