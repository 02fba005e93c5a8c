use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    api::handler::AppState,
    config::Config,
    error::AppResult,
    ledger::{
        models::{AccountAddress, ProviderId},
        LedgerClient, RpcLedgerClient, RpcLedgerConfig,
    },
    storage::{IpfsConfig, IpfsStorage, StorageBackend},
    sync::{Reconciler, SyncScheduleConfig, SyncScheduler, SyncStatus},
};

/// Everything the host process needs to run the node
pub struct Node {
    pub state: AppState,
    pub scheduler: SyncScheduler,
}

pub fn initialize_node(config: &Config) -> AppResult<Node> {
    info!("Initializing storage node components ...");

    let ledger: Arc<dyn LedgerClient> = Arc::new(RpcLedgerClient::new(RpcLedgerConfig {
        rpc_url: config.ledger_rpc_url.clone(),
        request_timeout: config.request_timeout(),
    })?);
    info!("✅ Ledger client initialized: {}", config.ledger_rpc_url);

    let storage: Arc<dyn StorageBackend> = Arc::new(IpfsStorage::new(
        IpfsConfig {
            api_url: config.ipfs_api_url.clone(),
            request_timeout: config.request_timeout(),
        },
        ledger.clone(),
    )?);
    info!("✅ Storage backend initialized: {} ({})", storage.name(), config.ipfs_api_url);

    Ok(assemble(config, ledger, storage))
}

/// Wire the reconciler, scheduler and status store around the given facades
pub fn assemble(
    config: &Config,
    ledger: Arc<dyn LedgerClient>,
    storage: Arc<dyn StorageBackend>,
) -> Node {
    let provider_id = ProviderId(config.provider_id);

    let reconciler = Arc::new(Reconciler::new(
        provider_id,
        AccountAddress::new(config.role_account.clone()),
        ledger.clone(),
        storage,
    ));
    info!("✅ Reconciler initialized for provider {}", provider_id);

    let sync_status = Arc::new(SyncStatus::new(config.sync_period()));

    let mut scheduler = SyncScheduler::new(
        SyncScheduleConfig {
            sync_period: config.sync_period(),
            chain_sync_poll: config.chain_sync_poll(),
        },
        reconciler,
        sync_status.clone(),
    );

    if config.wait_for_chain_sync {
        scheduler = scheduler.with_startup_sync_check(ledger);
    } else {
        warn!("⚠️ WAIT_FOR_CHAIN_SYNC disabled - first cycle may see a stale ledger");
    }

    info!("✅ Sync scheduler configured (every {} ms)", config.sync_period_ms);

    Node {
        state: AppState {
            provider_id,
            sync_status,
        },
        scheduler,
    }
}
