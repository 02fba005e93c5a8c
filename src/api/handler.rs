use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

use super::models::*;
use crate::{
    error::{AppError, AppResult},
    ledger::models::ProviderId,
    sync::{reconciler::CycleReport, status::{SyncStatus, SyncStatusSnapshot}},
};

#[derive(Clone)]
pub struct AppState {
    pub provider_id: ProviderId,
    pub sync_status: Arc<SyncStatus>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.sync_status.snapshot();
    let health = SyncHealth::from_snapshot(&snapshot);

    Json(HealthResponse {
        status: health.as_str().to_string(),
        timestamp: Utc::now(),
        provider_id: state.provider_id,
        scheduler_state: snapshot.state,
        cycles_completed: snapshot.cycles_completed,
    })
}

/// GET /api/v1/sync/status
pub async fn get_sync_status(State(state): State<AppState>) -> Json<SyncStatusSnapshot> {
    Json(state.sync_status.snapshot())
}

/// GET /api/v1/sync/last-cycle - per-content results of the latest cycle
pub async fn get_last_cycle(State(state): State<AppState>) -> AppResult<Json<CycleReport>> {
    let report = state
        .sync_status
        .last_report()
        .ok_or_else(|| AppError::NotFound("no sync cycle has completed yet".to_string()))?;

    Ok(Json(report.as_ref().clone()))
}
