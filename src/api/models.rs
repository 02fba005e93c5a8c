use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ledger::models::ProviderId;
use crate::sync::status::{SchedulerState, SyncStatusSnapshot};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub provider_id: ProviderId,
    pub scheduler_state: SchedulerState,
    pub cycles_completed: u64,
}

/// Overall health derived from the scheduler's last outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncHealth {
    /// No cycle has finished yet
    Starting,
    Healthy,
    /// The most recent cycle failed at the top level
    Degraded,
}

impl SyncHealth {
    pub fn from_snapshot(snapshot: &SyncStatusSnapshot) -> Self {
        match (&snapshot.last_summary, snapshot.last_error_at) {
            (None, None) => SyncHealth::Starting,
            (None, Some(_)) => SyncHealth::Degraded,
            (Some(summary), Some(failed_at)) if failed_at > summary.completed_at => {
                SyncHealth::Degraded
            }
            (Some(_), _) => SyncHealth::Healthy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncHealth::Starting => "starting",
            SyncHealth::Healthy => "healthy",
            SyncHealth::Degraded => "degraded",
        }
    }
}
