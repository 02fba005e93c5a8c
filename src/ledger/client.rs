use crate::error::AppResult;
use crate::ledger::models::*;
use async_trait::async_trait;

/// Ledger client trait - read/write access to content and relationship records
///
/// Implementations own their timeout policy and surface every failure as a
/// plain error. Relationship writes may be retried across cycles, so the
/// ledger side must reject or ignore duplicate creations.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// All content ids currently known to the ledger (never paged)
    async fn list_known_content_ids(&self) -> AppResult<Vec<ContentId>>;

    /// Relationship for (provider, content)
    ///
    /// `Ok(None)` is a confirmed absence. A failed lookup must be an `Err`,
    /// never `Ok(None)`.
    async fn get_storage_relationship(
        &self,
        provider_id: ProviderId,
        content_id: &ContentId,
    ) -> AppResult<Option<StorageRelationship>>;

    /// Create a relationship record and return its id
    async fn create_storage_relationship(
        &self,
        account: &AccountAddress,
        provider_id: ProviderId,
        content_id: &ContentId,
    ) -> AppResult<RelationshipId>;

    /// Set the readiness flag of an existing relationship
    async fn set_storage_relationship_ready(
        &self,
        account: &AccountAddress,
        provider_id: ProviderId,
        relationship_id: RelationshipId,
        ready: bool,
    ) -> AppResult<()>;

    /// Resolve a content id to the address its bytes are fetched from
    async fn resolve_content_address(
        &self,
        content_id: &ContentId,
    ) -> AppResult<Option<PhysicalAddress>>;

    /// Whether the ledger node has caught up with the network
    async fn is_synced(&self) -> AppResult<bool> {
        Ok(true)
    }
}
