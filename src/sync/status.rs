use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::sync::reconciler::{CycleReport, CycleSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Point-in-time view of the scheduler, served by the status endpoints
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatusSnapshot {
    pub state: SchedulerState,
    pub sync_period_ms: u64,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub last_summary: Option<CycleSummary>,
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub next_run_at: Option<DateTime<Utc>>,
}

/// Shared sync status, written by the scheduler and read by the API
pub struct SyncStatus {
    snapshot: RwLock<SyncStatusSnapshot>,
    last_report: RwLock<Option<Arc<CycleReport>>>,
}

impl SyncStatus {
    pub fn new(sync_period: Duration) -> Self {
        Self {
            snapshot: RwLock::new(SyncStatusSnapshot {
                state: SchedulerState::Idle,
                sync_period_ms: sync_period.as_millis() as u64,
                cycles_completed: 0,
                cycles_failed: 0,
                last_summary: None,
                last_error: None,
                last_error_at: None,
                next_run_at: None,
            }),
            last_report: RwLock::new(None),
        }
    }

    pub fn snapshot(&self) -> SyncStatusSnapshot {
        self.snapshot.read().clone()
    }

    pub fn last_report(&self) -> Option<Arc<CycleReport>> {
        self.last_report.read().clone()
    }

    pub fn mark_running(&self) {
        let mut snapshot = self.snapshot.write();
        snapshot.state = SchedulerState::Running;
        snapshot.next_run_at = None;
    }

    pub fn mark_idle(&self, next_run_at: Option<DateTime<Utc>>) {
        let mut snapshot = self.snapshot.write();
        snapshot.state = SchedulerState::Idle;
        snapshot.next_run_at = next_run_at;
    }

    pub fn record_cycle(&self, report: CycleReport) {
        let summary = report.summary();
        debug!("💾 Recording cycle {} ({} results)", summary.cycle_id, summary.total);

        {
            let mut snapshot = self.snapshot.write();
            snapshot.cycles_completed += 1;
            snapshot.last_summary = Some(summary);
        }
        *self.last_report.write() = Some(Arc::new(report));
    }

    pub fn record_failure(&self, error: &str) {
        let mut snapshot = self.snapshot.write();
        snapshot.cycles_failed += 1;
        snapshot.last_error = Some(error.to_string());
        snapshot.last_error_at = Some(Utc::now());
    }
}
