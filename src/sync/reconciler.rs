// Reconciliation step - converges local storage and ledger relationships
//
// Per content id, every cycle:
// 1. Look up this provider's storage relationship on the ledger
// 2. Stat the content in local storage (errors count as "not local")
// 3. Not local: fetch it, nothing else this cycle
//    Local + absent: create the relationship, then mark it ready
//    Local + created: mark it ready
//    Local + ready: nothing
//
// Nothing is cached between cycles; every pass starts from fresh ledger and
// storage state.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::error::AppResult;
use crate::ledger::{client::LedgerClient, models::*};
use crate::storage::traits::StorageBackend;

/// What a content id needs this cycle, given presence and relationship state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Fetch,
    CreateAndActivate,
    Activate(RelationshipId),
    Converged,
    /// Content is local but the relationship lookup failed
    Hold,
}

/// Decision table for one (provider, content) pair
pub fn plan(local: bool, relationship: RelationshipState) -> SyncAction {
    if !local {
        return SyncAction::Fetch;
    }

    match relationship {
        RelationshipState::Absent => SyncAction::CreateAndActivate,
        RelationshipState::Created(id) => SyncAction::Activate(id),
        RelationshipState::Ready(_) => SyncAction::Converged,
        RelationshipState::Unknown => SyncAction::Hold,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Fetched,
    FetchFailed,
    CreatedAndActivated,
    CreatedNotReady,
    CreateFailed,
    Activated,
    ActivateFailed,
    AlreadyReady,
    LookupFailed,
    TaskFailed,
}

impl SyncOutcome {
    /// Relationship is ready and content is local after this cycle
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            SyncOutcome::CreatedAndActivated | SyncOutcome::Activated | SyncOutcome::AlreadyReady
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SyncOutcome::FetchFailed
                | SyncOutcome::CreatedNotReady
                | SyncOutcome::CreateFailed
                | SyncOutcome::ActivateFailed
                | SyncOutcome::LookupFailed
                | SyncOutcome::TaskFailed
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentSyncResult {
    pub content_id: ContentId,
    pub outcome: SyncOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContentSyncResult {
    fn ok(content_id: &ContentId, outcome: SyncOutcome) -> Self {
        Self {
            content_id: content_id.clone(),
            outcome,
            error: None,
        }
    }

    fn failed(content_id: &ContentId, outcome: SyncOutcome, error: impl ToString) -> Self {
        Self {
            content_id: content_id.clone(),
            outcome,
            error: Some(error.to_string()),
        }
    }
}

/// Everything one reconciliation cycle did
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub results: Vec<ContentSyncResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub total: usize,
    pub converged: usize,
    pub failed: usize,
    pub outcomes: BTreeMap<SyncOutcome, usize>,
}

impl CycleReport {
    pub fn summary(&self) -> CycleSummary {
        let mut outcomes = BTreeMap::new();
        for result in &self.results {
            *outcomes.entry(result.outcome).or_insert(0) += 1;
        }

        CycleSummary {
            cycle_id: self.cycle_id,
            started_at: self.started_at,
            completed_at: self.completed_at,
            total: self.results.len(),
            converged: self.results.iter().filter(|r| r.outcome.is_converged()).count(),
            failed: self.results.iter().filter(|r| r.outcome.is_failure()).count(),
            outcomes,
        }
    }
}

/// Reconciler - runs one convergence pass over all known content
#[derive(Clone)]
pub struct Reconciler {
    provider_id: ProviderId,
    account: AccountAddress,
    ledger: Arc<dyn LedgerClient>,
    storage: Arc<dyn StorageBackend>,
}

impl Reconciler {
    pub fn new(
        provider_id: ProviderId,
        account: AccountAddress,
        ledger: Arc<dyn LedgerClient>,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            provider_id,
            account,
            ledger,
            storage,
        }
    }

    /// Run one cycle over every known content id
    ///
    /// Ids are handled by independent tasks and the call returns once all of
    /// them settled. Per-id failures land in the report; only a failure to
    /// list known content is returned as an error.
    #[instrument(skip(self), fields(provider_id = %self.provider_id))]
    pub async fn run_cycle(&self) -> AppResult<CycleReport> {
        let started_at = Utc::now();
        let cycle_id = Uuid::new_v4();

        let content_ids = self.ledger.list_known_content_ids().await?;

        if content_ids.is_empty() {
            info!("✓ No known content on the ledger");
        } else {
            info!("📊 Reconciling {} content objects", content_ids.len());
        }

        let handles = content_ids.iter().map(|content_id| {
            let reconciler = self.clone();
            let content_id = content_id.clone();
            tokio::spawn(async move { reconciler.sync_content(&content_id).await })
        });

        let joined = join_all(handles).await;

        let results = content_ids
            .iter()
            .zip(joined)
            .map(|(content_id, joined)| match joined {
                Ok(result) => result,
                Err(e) => {
                    error!("❌ Sync task for {} aborted: {}", content_id, e);
                    ContentSyncResult::failed(content_id, SyncOutcome::TaskFailed, e)
                }
            })
            .collect();

        Ok(CycleReport {
            cycle_id,
            started_at,
            completed_at: Utc::now(),
            results,
        })
    }

    #[instrument(skip(self, content_id), fields(content_id = %content_id))]
    async fn sync_content(&self, content_id: &ContentId) -> ContentSyncResult {
        let mut lookup_error = None;
        let relationship = match self
            .ledger
            .get_storage_relationship(self.provider_id, content_id)
            .await
        {
            Ok(relationship) => RelationshipState::from_lookup(relationship.as_ref()),
            Err(e) => {
                warn!("⚠️ Relationship lookup failed for {}: {}", content_id, e);
                lookup_error = Some(e.to_string());
                RelationshipState::Unknown
            }
        };

        let local = match self.storage.stat(content_id).await {
            Ok(stat) => stat.local,
            Err(e) => {
                // Presence unknown, assume absent
                debug!("Stat failed for {}: {}", content_id, e);
                false
            }
        };

        match plan(local, relationship) {
            SyncAction::Fetch => self.fetch(content_id).await,
            SyncAction::CreateAndActivate => self.create_and_activate(content_id).await,
            SyncAction::Activate(relationship_id) => {
                info!("Updating storage relationship to ready for {}", content_id);
                match self.activate(relationship_id).await {
                    Ok(()) => ContentSyncResult::ok(content_id, SyncOutcome::Activated),
                    Err(e) => {
                        error!("❌ Error setting relationship ready {}: {}", content_id, e);
                        ContentSyncResult::failed(content_id, SyncOutcome::ActivateFailed, e)
                    }
                }
            }
            SyncAction::Converged => ContentSyncResult::ok(content_id, SyncOutcome::AlreadyReady),
            SyncAction::Hold => ContentSyncResult::failed(
                content_id,
                SyncOutcome::LookupFailed,
                lookup_error.unwrap_or_else(|| "relationship state unknown".to_string()),
            ),
        }
    }

    async fn fetch(&self, content_id: &ContentId) -> ContentSyncResult {
        match self.storage.synchronize(content_id).await {
            // Relationship is handled once the next cycle sees the content locally
            Ok(()) => ContentSyncResult::ok(content_id, SyncOutcome::Fetched),
            Err(e) => {
                warn!("⚠️ Fetch of {} failed: {}", content_id, e);
                ContentSyncResult::failed(content_id, SyncOutcome::FetchFailed, e)
            }
        }
    }

    async fn create_and_activate(&self, content_id: &ContentId) -> ContentSyncResult {
        info!("Creating new storage relationship for {}", content_id);

        let relationship_id = match self
            .ledger
            .create_storage_relationship(&self.account, self.provider_id, content_id)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                error!("❌ Error creating new storage relationship {}: {}", content_id, e);
                return ContentSyncResult::failed(content_id, SyncOutcome::CreateFailed, e);
            }
        };

        match self.activate(relationship_id).await {
            Ok(()) => ContentSyncResult::ok(content_id, SyncOutcome::CreatedAndActivated),
            Err(e) => {
                // Left as created; the next cycle retries the toggle only
                error!(
                    "❌ Relationship {} for {} created but not marked ready: {}",
                    relationship_id, content_id, e
                );
                ContentSyncResult::failed(content_id, SyncOutcome::CreatedNotReady, e)
            }
        }
    }

    async fn activate(&self, relationship_id: RelationshipId) -> AppResult<()> {
        self.ledger
            .set_storage_relationship_ready(&self.account, self.provider_id, relationship_id, true)
            .await
    }
}
