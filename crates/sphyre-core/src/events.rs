//! Append-only audit log of registry state changes.

use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

use crate::types::{AccessLevel, Identity, Role, Timestamp};

/// A state change recorded by a registry component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    RoleGranted {
        role: Role,
        account: Identity,
        actor: Identity,
    },
    RoleRevoked {
        role: Role,
        account: Identity,
        actor: Identity,
    },
    OwnershipTransferred {
        previous: Identity,
        new_owner: Identity,
    },
    CredentialRegistered {
        credential_id: String,
        subject_did: String,
        credential_hash: String,
        metadata_uri: String,
        issuer: Identity,
    },
    CredentialRevoked {
        credential_id: String,
        subject_did: String,
        credential_hash: String,
        revoked_by: Identity,
    },
    SchemaRegistered {
        schema_id: String,
        schema_uri: String,
        registered_by: Identity,
    },
    SchemaUpdated {
        schema_id: String,
        schema_uri: String,
        version: u32,
        updated_by: Identity,
    },
    ConsentGranted {
        consent_key: String,
        subject_did: String,
        party_did: String,
        purpose: String,
        access_level: AccessLevel,
        expires_at: Timestamp,
        granted_by: Identity,
        reactivated: bool,
    },
    ConsentRevoked {
        consent_key: String,
        subject_did: String,
        party_did: String,
        purpose: String,
        revoked_by: Identity,
    },
    MetadataUpdated {
        name: String,
        description: String,
        actor: Identity,
    },
    RegistryCreated {
        registry: Identity,
        owner: Identity,
        name: String,
    },
}

/// An event with its position in the total order and the time it was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub sequence: u64,
    pub timestamp: Timestamp,
    pub event: RegistryEvent,
}

/// One entry of a schema's reconstructed URI history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRevision {
    pub version: u32,
    pub schema_uri: String,
    pub changed_by: Identity,
    pub timestamp: Timestamp,
}

/// Totally ordered, append-only event log.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: RwLock<Vec<LoggedEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its sequence number.
    pub fn append(&self, timestamp: Timestamp, event: RegistryEvent) -> u64 {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let sequence = entries.len() as u64;
        entries.push(LoggedEvent {
            sequence,
            timestamp,
            event,
        });
        sequence
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the full log.
    pub fn snapshot(&self) -> Vec<LoggedEvent> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events with `sequence >= from`.
    pub fn since(&self, from: u64) -> Vec<LoggedEvent> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let start = usize::try_from(from).unwrap_or(usize::MAX).min(entries.len());
        entries[start..].to_vec()
    }

    /// Rebuild every version of a schema's URI from the log.
    ///
    /// The schema ledger only keeps the latest URI; older versions survive
    /// only here.
    pub fn schema_history(&self, schema_id: &str) -> Vec<SchemaRevision> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .filter_map(|logged| match &logged.event {
                RegistryEvent::SchemaRegistered {
                    schema_id: id,
                    schema_uri,
                    registered_by,
                } if id == schema_id => Some(SchemaRevision {
                    version: 1,
                    schema_uri: schema_uri.clone(),
                    changed_by: *registered_by,
                    timestamp: logged.timestamp,
                }),
                RegistryEvent::SchemaUpdated {
                    schema_id: id,
                    schema_uri,
                    version,
                    updated_by,
                } if id == schema_id => Some(SchemaRevision {
                    version: *version,
                    schema_uri: schema_uri.clone(),
                    changed_by: *updated_by,
                    timestamp: logged.timestamp,
                }),
                _ => None,
            })
            .collect()
    }

    /// False if a writer panicked while holding the log.
    pub fn is_healthy(&self) -> bool {
        !self.entries.is_poisoned()
    }
}
