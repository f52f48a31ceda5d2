use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sphyre_core::{
    Identity, LifecycleEvent, RecordLifecycle, RecordStatus, RegistryEvent, Role, Timestamp,
};

use crate::context::LedgerContext;
use crate::error::{require_non_empty, RegistryError};

/// On-ledger record of a credential. The credential itself lives off-ledger
/// behind `metadata_uri`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Hex of `H(subject_did, credential_hash)`.
    pub credential_id: String,
    pub subject_did: String,
    pub credential_hash: String,
    pub metadata_uri: String,
    pub is_registered: bool,
    pub is_revoked: bool,
    pub registered_at: Timestamp,
    pub registered_by: Identity,
    pub revoked_at: Option<Timestamp>,
    pub revoked_by: Option<Identity>,
}

impl CredentialRecord {
    pub fn status(&self) -> RecordStatus {
        RecordStatus::from_flags(self.is_registered, self.is_revoked)
    }

    /// Registered and not revoked. Credentials carry no ledger-side expiry.
    pub fn is_valid(&self) -> bool {
        self.status() == RecordStatus::Active
    }
}

/// Derive the ledger key for a credential.
pub fn credential_key(subject_did: &str, credential_hash: &str) -> String {
    hex::encode(sphyre_crypto::credential_id(subject_did, credential_hash))
}

/// Write-once credential ledger.
///
/// Registration per id happens at most once, even after revocation.
/// Revocation is final.
pub struct CredentialLedger {
    records: DashMap<String, CredentialRecord>,
    ctx: LedgerContext,
}

impl CredentialLedger {
    pub fn new(ctx: LedgerContext) -> Self {
        Self {
            records: DashMap::new(),
            ctx,
        }
    }

    /// Register a credential hash for a subject. Requires the Issuer role.
    pub fn register(
        &self,
        caller: &Identity,
        subject_did: &str,
        credential_hash: &str,
        metadata_uri: &str,
    ) -> Result<String, RegistryError> {
        self.ctx
            .access
            .require_role(caller, Role::Issuer, "register credentials")?;
        require_non_empty("subject_did", subject_did)?;
        require_non_empty("credential_hash", credential_hash)?;

        let credential_id = credential_key(subject_did, credential_hash);
        match self.records.entry(credential_id.clone()) {
            Entry::Occupied(_) => {
                tracing::debug!(credential_id = %credential_id, "credential already registered");
                Err(RegistryError::AlreadyRegistered(credential_id))
            }
            Entry::Vacant(slot) => {
                let now = self.ctx.now();
                let guard = slot.insert(CredentialRecord {
                    credential_id: credential_id.clone(),
                    subject_did: subject_did.to_string(),
                    credential_hash: credential_hash.to_string(),
                    metadata_uri: metadata_uri.to_string(),
                    is_registered: true,
                    is_revoked: false,
                    registered_at: now,
                    registered_by: *caller,
                    revoked_at: None,
                    revoked_by: None,
                });
                self.ctx.emit(
                    now,
                    RegistryEvent::CredentialRegistered {
                        credential_id: credential_id.clone(),
                        subject_did: subject_did.to_string(),
                        credential_hash: credential_hash.to_string(),
                        metadata_uri: metadata_uri.to_string(),
                        issuer: *caller,
                    },
                );
                drop(guard);

                tracing::info!(
                    credential_id = %credential_id,
                    subject = subject_did,
                    issuer = %caller,
                    "credential registered"
                );
                Ok(credential_id)
            }
        }
    }

    /// Revoke a credential. Allowed for the registrant or any Verifier.
    pub fn revoke(
        &self,
        caller: &Identity,
        subject_did: &str,
        credential_hash: &str,
    ) -> Result<(), RegistryError> {
        require_non_empty("subject_did", subject_did)?;
        require_non_empty("credential_hash", credential_hash)?;

        let credential_id = credential_key(subject_did, credential_hash);
        let mut record = self
            .records
            .get_mut(&credential_id)
            .ok_or_else(|| RegistryError::NotFound(credential_id.clone()))?;

        RecordLifecycle::transition(record.status(), LifecycleEvent::Revoke)
            .map_err(|v| RegistryError::from_lifecycle(v, &credential_id))?;

        if record.registered_by != *caller && !self.ctx.access.has_role(Role::Verifier, caller) {
            tracing::warn!(
                credential_id = %credential_id,
                caller = %caller,
                "credential revoke denied"
            );
            return Err(RegistryError::unauthorized(caller, "revoke this credential"));
        }

        let now = self.ctx.now();
        record.is_revoked = true;
        record.revoked_at = Some(now);
        record.revoked_by = Some(*caller);
        self.ctx.emit(
            now,
            RegistryEvent::CredentialRevoked {
                credential_id: credential_id.clone(),
                subject_did: subject_did.to_string(),
                credential_hash: credential_hash.to_string(),
                revoked_by: *caller,
            },
        );
        drop(record);

        tracing::info!(credential_id = %credential_id, revoked_by = %caller, "credential revoked");
        Ok(())
    }

    /// True iff the credential is registered and not revoked.
    pub fn is_valid(&self, subject_did: &str, credential_hash: &str) -> bool {
        self.records
            .get(&credential_key(subject_did, credential_hash))
            .map(|r| r.is_valid())
            .unwrap_or(false)
    }

    /// Snapshot of the full record, if any.
    pub fn info(&self, subject_did: &str, credential_hash: &str) -> Option<CredentialRecord> {
        self.info_by_id(&credential_key(subject_did, credential_hash))
    }

    pub fn info_by_id(&self, credential_id: &str) -> Option<CredentialRecord> {
        self.records.get(credential_id).map(|r| r.clone())
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }
}
