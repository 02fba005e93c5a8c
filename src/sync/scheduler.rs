// Sync Scheduler - reruns the reconciliation step forever
//
// - One cycle at a time: the next run is scheduled only after the previous
//   one fully settled
// - A failed cycle is logged and the next run is scheduled regardless
// - Stops only when the host aborts the task or the process exits

use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use crate::ledger::client::LedgerClient;
use crate::sync::reconciler::Reconciler;
use crate::sync::status::SyncStatus;

/// Sync schedule configuration
#[derive(Debug, Clone)]
pub struct SyncScheduleConfig {
    /// Pause between the end of one cycle and the start of the next
    pub sync_period: Duration,
    /// Poll interval while waiting for the ledger node to finish syncing
    pub chain_sync_poll: Duration,
}

/// Sync scheduler - owned by the host process
pub struct SyncScheduler {
    config: SyncScheduleConfig,
    reconciler: Arc<Reconciler>,
    status: Arc<SyncStatus>,
    startup_ledger: Option<Arc<dyn LedgerClient>>,
}

impl SyncScheduler {
    pub fn new(
        config: SyncScheduleConfig,
        reconciler: Arc<Reconciler>,
        status: Arc<SyncStatus>,
    ) -> Self {
        Self {
            config,
            reconciler,
            status,
            startup_ledger: None,
        }
    }

    /// Hold the first cycle until `ledger` reports it is synced
    pub fn with_startup_sync_check(mut self, ledger: Arc<dyn LedgerClient>) -> Self {
        self.startup_ledger = Some(ledger);
        self
    }

    /// Start the scheduler (runs in background)
    pub fn start(&self) -> JoinHandle<()> {
        let config = self.config.clone();
        let reconciler = self.reconciler.clone();
        let status = self.status.clone();
        let startup_ledger = self.startup_ledger.clone();

        tokio::spawn(async move {
            if let Some(ledger) = startup_ledger {
                Self::wait_for_ledger_sync(ledger.as_ref(), config.chain_sync_poll).await;
            }
            Self::run_periodic(&config, &reconciler, &status).await
        })
    }

    async fn run_periodic(
        config: &SyncScheduleConfig,
        reconciler: &Reconciler,
        status: &SyncStatus,
    ) {
        loop {
            Self::run_once(reconciler, status).await;

            let next_run_at = chrono::Duration::from_std(config.sync_period)
                .ok()
                .and_then(|period| Utc::now().checked_add_signed(period));
            status.mark_idle(next_run_at);
            match next_run_at {
                Some(at) => info!("⏰ Next sync run scheduled for: {} UTC", at.format("%H:%M:%S")),
                None => warn!("⚠️ Next sync run time out of range for period {:?}", config.sync_period),
            }

            sleep(config.sync_period).await;
        }
    }

    /// Run a single cycle and record its result
    pub async fn run_once(reconciler: &Reconciler, status: &SyncStatus) {
        info!("🔄 Starting sync run");
        status.mark_running();

        match reconciler.run_cycle().await {
            Ok(report) => {
                let summary = report.summary();
                info!(
                    "✓ Sync run complete: {}/{} converged, {} failed",
                    summary.converged, summary.total, summary.failed
                );
                status.record_cycle(report);
            }
            Err(e) => {
                error!("❌ Error in sync run: {:?}", e);
                status.record_failure(&e.to_string());
            }
        }
    }

    async fn wait_for_ledger_sync(ledger: &dyn LedgerClient, poll: Duration) {
        loop {
            match ledger.is_synced().await {
                Ok(true) => {
                    info!("✓ Ledger node is synced");
                    return;
                }
                Ok(false) => info!("⏳ Waiting for ledger node to sync..."),
                Err(e) => warn!("⚠️ Ledger health check failed: {}", e),
            }
            sleep(poll).await;
        }
    }
}
