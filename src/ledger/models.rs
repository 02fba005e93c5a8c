use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque address naming an immutable content object on the network
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Storage provider identity this node acts as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(pub u64);

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger id of a storage relationship record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(pub u64);

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role account used to submit relationship calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountAddress(String);

impl AccountAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address the storage backend fetches the bytes from (e.g. an IPFS hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhysicalAddress(String);

impl PhysicalAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A provider's ledger-recorded claim to host a content object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRelationship {
    pub id: RelationshipId,
    pub provider_id: ProviderId,
    pub content_id: ContentId,
    pub ready: bool,
}

/// Relationship state for one (provider, content) pair as observed this cycle
///
/// `Absent -> Created -> Ready` only ever moves forward. `Unknown` means the
/// lookup itself failed and must never be mistaken for `Absent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipState {
    Absent,
    Created(RelationshipId),
    Ready(RelationshipId),
    Unknown,
}

impl RelationshipState {
    pub fn from_lookup(relationship: Option<&StorageRelationship>) -> Self {
        match relationship {
            None => RelationshipState::Absent,
            Some(r) if r.ready => RelationshipState::Ready(r.id),
            Some(r) => RelationshipState::Created(r.id),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipState::Absent => "absent",
            RelationshipState::Created(_) => "created",
            RelationshipState::Ready(_) => "ready",
            RelationshipState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RelationshipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Liaison verdict on a data object, consumed as opaque ledger state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiaisonJudgement {
    Pending,
    Accepted,
    Rejected,
}

/// Ledger record describing where a content object's bytes live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataObject {
    pub content_id: ContentId,
    pub physical_address: PhysicalAddress,
    pub liaison_judgement: LiaisonJudgement,
}
