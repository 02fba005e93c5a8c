// In-memory ledger and storage fakes shared by the unit tests
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{AppResult, LedgerError, StorageError};
use crate::ledger::{client::LedgerClient, models::*};
use crate::storage::traits::{StatResult, StorageBackend};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LedgerCalls {
    pub listings: usize,
    pub lookups: usize,
    pub creates: usize,
    pub ready_toggles: usize,
    pub unready_toggles: usize,
}

impl LedgerCalls {
    pub fn writes(&self) -> usize {
        self.creates + self.ready_toggles + self.unready_toggles
    }
}

#[derive(Default)]
struct LedgerState {
    content_ids: Vec<ContentId>,
    relationships: HashMap<(ProviderId, ContentId), StorageRelationship>,
    data_objects: HashMap<ContentId, PhysicalAddress>,
    next_relationship_id: u64,
    fail_listing: bool,
    fail_lookup: HashSet<ContentId>,
    fail_create: HashSet<ContentId>,
    fail_ready: HashSet<ContentId>,
    calls: LedgerCalls,
}

pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    list_delay: Option<Duration>,
    synced: AtomicBool,
    listings_in_flight: AtomicUsize,
    max_listings_in_flight: AtomicUsize,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                next_relationship_id: 1,
                ..Default::default()
            }),
            list_delay: None,
            synced: AtomicBool::new(true),
            listings_in_flight: AtomicUsize::new(0),
            max_listings_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_content(ids: &[&str]) -> Self {
        let ledger = Self::new();
        for id in ids {
            ledger.add_content(id);
        }
        ledger
    }

    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    pub fn add_content(&self, id: &str) {
        self.state.lock().content_ids.push(ContentId::from(id));
    }

    pub fn add_data_object(&self, id: &str, address: &str) {
        self.state
            .lock()
            .data_objects
            .insert(ContentId::from(id), PhysicalAddress::new(address));
    }

    pub fn insert_relationship(&self, provider_id: ProviderId, id: &str, ready: bool) -> RelationshipId {
        let mut state = self.state.lock();
        let relationship_id = RelationshipId(state.next_relationship_id);
        state.next_relationship_id += 1;
        state.relationships.insert(
            (provider_id, ContentId::from(id)),
            StorageRelationship {
                id: relationship_id,
                provider_id,
                content_id: ContentId::from(id),
                ready,
            },
        );
        relationship_id
    }

    pub fn relationship(&self, provider_id: ProviderId, id: &str) -> Option<StorageRelationship> {
        self.state
            .lock()
            .relationships
            .get(&(provider_id, ContentId::from(id)))
            .cloned()
    }

    pub fn state_of(&self, provider_id: ProviderId, id: &str) -> RelationshipState {
        RelationshipState::from_lookup(self.relationship(provider_id, id).as_ref())
    }

    pub fn set_synced(&self, synced: bool) {
        self.synced.store(synced, Ordering::SeqCst);
    }

    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().fail_listing = fail;
    }

    pub fn fail_lookup(&self, id: &str, fail: bool) {
        toggle(&mut self.state.lock().fail_lookup, id, fail);
    }

    pub fn fail_create(&self, id: &str, fail: bool) {
        toggle(&mut self.state.lock().fail_create, id, fail);
    }

    pub fn fail_ready(&self, id: &str, fail: bool) {
        toggle(&mut self.state.lock().fail_ready, id, fail);
    }

    pub fn calls(&self) -> LedgerCalls {
        self.state.lock().calls
    }

    pub fn max_listings_in_flight(&self) -> usize {
        self.max_listings_in_flight.load(Ordering::SeqCst)
    }
}

fn toggle(set: &mut HashSet<ContentId>, id: &str, on: bool) {
    if on {
        set.insert(ContentId::from(id));
    } else {
        set.remove(&ContentId::from(id));
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn list_known_content_ids(&self) -> AppResult<Vec<ContentId>> {
        let in_flight = self.listings_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_listings_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }

        let result = {
            let mut state = self.state.lock();
            state.calls.listings += 1;
            if state.fail_listing {
                Err(LedgerError::ContentListing("ledger unreachable".to_string()).into())
            } else {
                Ok(state.content_ids.clone())
            }
        };

        self.listings_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn get_storage_relationship(
        &self,
        provider_id: ProviderId,
        content_id: &ContentId,
    ) -> AppResult<Option<StorageRelationship>> {
        let mut state = self.state.lock();
        state.calls.lookups += 1;
        if state.fail_lookup.contains(content_id) {
            return Err(LedgerError::RelationshipLookup {
                content_id: content_id.clone(),
                message: "lookup timed out".to_string(),
            }
            .into());
        }
        Ok(state.relationships.get(&(provider_id, content_id.clone())).cloned())
    }

    async fn create_storage_relationship(
        &self,
        _account: &AccountAddress,
        provider_id: ProviderId,
        content_id: &ContentId,
    ) -> AppResult<RelationshipId> {
        let mut state = self.state.lock();
        state.calls.creates += 1;
        let key = (provider_id, content_id.clone());
        if state.fail_create.contains(content_id) || state.relationships.contains_key(&key) {
            return Err(LedgerError::ChainCall {
                call: "create_storage_relationship",
                target: content_id.to_string(),
                message: "extrinsic rejected".to_string(),
            }
            .into());
        }

        let id = RelationshipId(state.next_relationship_id);
        state.next_relationship_id += 1;
        state.relationships.insert(
            key,
            StorageRelationship {
                id,
                provider_id,
                content_id: content_id.clone(),
                ready: false,
            },
        );
        Ok(id)
    }

    async fn set_storage_relationship_ready(
        &self,
        _account: &AccountAddress,
        provider_id: ProviderId,
        relationship_id: RelationshipId,
        ready: bool,
    ) -> AppResult<()> {
        let mut state = self.state.lock();
        if ready {
            state.calls.ready_toggles += 1;
        } else {
            state.calls.unready_toggles += 1;
        }

        let fail_ready = state.fail_ready.clone();
        let relationship = state
            .relationships
            .values_mut()
            .find(|r| r.id == relationship_id && r.provider_id == provider_id);

        match relationship {
            Some(r) if !fail_ready.contains(&r.content_id) => {
                r.ready = ready;
                Ok(())
            }
            _ => Err(LedgerError::ChainCall {
                call: "set_storage_relationship_ready",
                target: format!("relationship {}", relationship_id),
                message: "extrinsic rejected".to_string(),
            }
            .into()),
        }
    }

    async fn resolve_content_address(
        &self,
        content_id: &ContentId,
    ) -> AppResult<Option<PhysicalAddress>> {
        Ok(self.state.lock().data_objects.get(content_id).cloned())
    }

    async fn is_synced(&self) -> AppResult<bool> {
        Ok(self.synced.load(Ordering::SeqCst))
    }
}

#[derive(Default)]
struct StorageState {
    local: HashSet<ContentId>,
    fetch_failures: HashMap<ContentId, u32>,
    fail_stat: HashSet<ContentId>,
    panic_on_sync: HashSet<ContentId>,
    stat_calls: usize,
    sync_calls: usize,
}

pub struct InMemoryStorage {
    state: Mutex<StorageState>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StorageState::default()),
        }
    }

    pub fn with_local(ids: &[&str]) -> Self {
        let storage = Self::new();
        for id in ids {
            storage.put(id);
        }
        storage
    }

    pub fn put(&self, id: &str) {
        self.state.lock().local.insert(ContentId::from(id));
    }

    pub fn evict(&self, id: &str) {
        self.state.lock().local.remove(&ContentId::from(id));
    }

    pub fn is_local(&self, id: &str) -> bool {
        self.state.lock().local.contains(&ContentId::from(id))
    }

    /// Fail the next `times` fetches of `id`, then succeed
    pub fn fail_fetch(&self, id: &str, times: u32) {
        self.state.lock().fetch_failures.insert(ContentId::from(id), times);
    }

    pub fn fail_stat(&self, id: &str) {
        self.state.lock().fail_stat.insert(ContentId::from(id));
    }

    pub fn panic_on_sync(&self, id: &str) {
        self.state.lock().panic_on_sync.insert(ContentId::from(id));
    }

    pub fn sync_calls(&self) -> usize {
        self.state.lock().sync_calls
    }

    pub fn stat_calls(&self) -> usize {
        self.state.lock().stat_calls
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn stat(&self, content_id: &ContentId) -> AppResult<StatResult> {
        let mut state = self.state.lock();
        state.stat_calls += 1;
        if state.fail_stat.contains(content_id) {
            return Err(StorageError::Stat {
                content_id: content_id.clone(),
                message: "stat timed out".to_string(),
            }
            .into());
        }
        Ok(StatResult {
            local: state.local.contains(content_id),
        })
    }

    async fn synchronize(&self, content_id: &ContentId) -> AppResult<()> {
        let mut state = self.state.lock();
        state.sync_calls += 1;

        if state.panic_on_sync.contains(content_id) {
            drop(state);
            panic!("storage backend crashed on {}", content_id);
        }

        if let Some(remaining) = state.fetch_failures.get_mut(content_id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StorageError::Sync {
                    content_id: content_id.clone(),
                    message: "no peers hold the content".to_string(),
                }
                .into());
            }
        }

        state.local.insert(content_id.clone());
        Ok(())
    }
}
