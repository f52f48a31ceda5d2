use std::sync::{PoisonError, RwLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sphyre_core::{Identity, RegistryEvent, Role, SchemaRevision, Timestamp};

use crate::context::LedgerContext;
use crate::error::{require_non_empty, RegistryError};

/// Current state of a schema. Only the latest URI is kept; older versions
/// are recoverable from the event log via [`SchemaLedger::history`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRecord {
    pub schema_id: String,
    pub schema_uri: String,
    pub is_registered: bool,
    pub registered_at: Timestamp,
    pub registered_by: Identity,
    pub updated_at: Timestamp,
    pub updated_by: Identity,
    /// Number of successful writes to this id, starting at 1.
    pub version: u32,
}

/// Versioned schema pointers with ordered enumeration.
pub struct SchemaLedger {
    records: DashMap<String, SchemaRecord>,
    /// Schema ids in registration order.
    ids: RwLock<Vec<String>>,
    ctx: LedgerContext,
}

impl SchemaLedger {
    pub fn new(ctx: LedgerContext) -> Self {
        Self {
            records: DashMap::new(),
            ids: RwLock::new(Vec::new()),
            ctx,
        }
    }

    /// Create or update a schema and return its new version.
    ///
    /// Requires the Issuer role. Updating an existing id additionally
    /// requires being its original registrant or a Verifier.
    pub fn register(
        &self,
        caller: &Identity,
        schema_id: &str,
        schema_uri: &str,
    ) -> Result<u32, RegistryError> {
        self.ctx
            .access
            .require_role(caller, Role::Issuer, "register schemas")?;
        require_non_empty("schema_id", schema_id)?;
        require_non_empty("schema_uri", schema_uri)?;

        match self.records.entry(schema_id.to_string()) {
            Entry::Vacant(slot) => {
                let now = self.ctx.now();
                let guard = slot.insert(SchemaRecord {
                    schema_id: schema_id.to_string(),
                    schema_uri: schema_uri.to_string(),
                    is_registered: true,
                    registered_at: now,
                    registered_by: *caller,
                    updated_at: now,
                    updated_by: *caller,
                    version: 1,
                });
                self.ids
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(schema_id.to_string());
                self.ctx.emit(
                    now,
                    RegistryEvent::SchemaRegistered {
                        schema_id: schema_id.to_string(),
                        schema_uri: schema_uri.to_string(),
                        registered_by: *caller,
                    },
                );
                drop(guard);

                tracing::info!(schema_id, uri = schema_uri, "schema registered");
                Ok(1)
            }
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();
                if record.registered_by != *caller
                    && !self.ctx.access.has_role(Role::Verifier, caller)
                {
                    tracing::warn!(schema_id, caller = %caller, "schema update denied");
                    return Err(RegistryError::unauthorized(caller, "update this schema"));
                }

                let now = self.ctx.now();
                record.schema_uri = schema_uri.to_string();
                record.version += 1;
                record.updated_at = now;
                record.updated_by = *caller;
                let version = record.version;
                self.ctx.emit(
                    now,
                    RegistryEvent::SchemaUpdated {
                        schema_id: schema_id.to_string(),
                        schema_uri: schema_uri.to_string(),
                        version,
                        updated_by: *caller,
                    },
                );
                drop(slot);

                tracing::info!(schema_id, uri = schema_uri, version, "schema updated");
                Ok(version)
            }
        }
    }

    /// Latest URI of a schema.
    pub fn schema_uri(&self, schema_id: &str) -> Result<String, RegistryError> {
        self.records
            .get(schema_id)
            .map(|r| r.schema_uri.clone())
            .ok_or_else(|| RegistryError::NotFound(schema_id.to_string()))
    }

    pub fn info(&self, schema_id: &str) -> Option<SchemaRecord> {
        self.records.get(schema_id).map(|r| r.clone())
    }

    pub fn is_registered(&self, schema_id: &str) -> bool {
        self.records.contains_key(schema_id)
    }

    pub fn count(&self) -> usize {
        self.ids.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Schema id at `index` in registration order.
    pub fn id_at(&self, index: usize) -> Result<String, RegistryError> {
        let ids = self.ids.read().unwrap_or_else(PoisonError::into_inner);
        ids.get(index).cloned().ok_or(RegistryError::OutOfBounds {
            index,
            len: ids.len(),
        })
    }

    /// All schema ids in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.ids.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Every URI the schema has pointed to, oldest first.
    pub fn history(&self, schema_id: &str) -> Vec<SchemaRevision> {
        self.ctx.events.schema_history(schema_id)
    }

    pub(crate) fn is_healthy(&self) -> bool {
        !self.ids.is_poisoned()
    }
}
