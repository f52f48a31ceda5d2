use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sphyre_core::{
    AccessLevel, Identity, LifecycleEvent, RecordLifecycle, RecordStatus, RegistryEvent,
    Timestamp, NO_EXPIRY,
};

use crate::context::LedgerContext;
use crate::error::{require_non_empty, RegistryError};

/// A subject's time-bounded, purpose-scoped consent for a relying party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    /// Hex of `H(subject_did, party_did, purpose)`.
    pub consent_key: String,
    pub subject_did: String,
    pub party_did: String,
    pub purpose: String,
    /// Free-form descriptor of the shared data.
    pub data_categories: String,
    pub access_level: AccessLevel,
    /// `NO_EXPIRY` (0) means the consent never expires.
    pub expires_at: Timestamp,
    pub is_registered: bool,
    pub is_revoked: bool,
    pub registered_at: Timestamp,
    pub registered_by: Identity,
    pub revoked_at: Option<Timestamp>,
    pub revoked_by: Option<Identity>,
}

impl ConsentRecord {
    pub fn status(&self) -> RecordStatus {
        RecordStatus::from_flags(self.is_registered, self.is_revoked)
    }

    /// Valid at `now`: active and `now <= expires_at` unless it never expires.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.status() == RecordStatus::Active
            && (self.expires_at == NO_EXPIRY || now <= self.expires_at)
    }
}

/// Derive the ledger key for a consent.
pub fn consent_key(subject_did: &str, party_did: &str, purpose: &str) -> String {
    hex::encode(sphyre_crypto::consent_key(subject_did, party_did, purpose))
}

/// Arguments of a consent grant.
#[derive(Debug, Clone)]
pub struct ConsentGrant<'a> {
    pub subject_did: &'a str,
    pub party_did: &'a str,
    pub purpose: &'a str,
    pub data_categories: &'a str,
    pub access_level: AccessLevel,
    pub expires_at: Timestamp,
}

/// Consent ledger. Any caller may grant or revoke; there is no role gate.
///
/// Granting on a revoked key reactivates the record in place. Granting on an
/// active key overwrites its terms.
pub struct ConsentLedger {
    records: DashMap<String, ConsentRecord>,
    ctx: LedgerContext,
}

impl ConsentLedger {
    pub fn new(ctx: LedgerContext) -> Self {
        Self {
            records: DashMap::new(),
            ctx,
        }
    }

    /// Grant (or re-grant) consent and return its key.
    ///
    /// An `expires_at` already in the past is accepted; validity is only
    /// evaluated on read.
    pub fn grant(&self, caller: &Identity, grant: ConsentGrant<'_>) -> Result<String, RegistryError> {
        require_non_empty("subject_did", grant.subject_did)?;
        require_non_empty("party_did", grant.party_did)?;
        require_non_empty("purpose", grant.purpose)?;

        let key = consent_key(grant.subject_did, grant.party_did, grant.purpose);
        let entry = self.records.entry(key.clone());
        // Read the time under the shard lock so record timestamps follow
        // event order for a given key.
        let now = self.ctx.now();
        let reactivated = match entry {
            Entry::Vacant(slot) => {
                let mut record = ConsentRecord {
                    consent_key: key.clone(),
                    subject_did: grant.subject_did.to_string(),
                    party_did: grant.party_did.to_string(),
                    purpose: grant.purpose.to_string(),
                    data_categories: String::new(),
                    access_level: grant.access_level,
                    expires_at: NO_EXPIRY,
                    is_registered: false,
                    is_revoked: false,
                    registered_at: now,
                    registered_by: *caller,
                    revoked_at: None,
                    revoked_by: None,
                };
                let reactivated = apply_grant(&mut record, caller, &grant, now)?;
                let slot = slot.insert(record);
                self.emit_granted(now, caller, &grant, &key, reactivated);
                drop(slot);
                reactivated
            }
            Entry::Occupied(mut slot) => {
                let reactivated = apply_grant(slot.get_mut(), caller, &grant, now)?;
                self.emit_granted(now, caller, &grant, &key, reactivated);
                drop(slot);
                reactivated
            }
        };

        tracing::info!(
            consent_key = %key,
            subject = grant.subject_did,
            party = grant.party_did,
            purpose = grant.purpose,
            access_level = %grant.access_level,
            expires_at = grant.expires_at,
            reactivated,
            "consent granted"
        );
        Ok(key)
    }

    /// Revoke an active consent.
    pub fn revoke(
        &self,
        caller: &Identity,
        subject_did: &str,
        party_did: &str,
        purpose: &str,
    ) -> Result<(), RegistryError> {
        require_non_empty("subject_did", subject_did)?;
        require_non_empty("party_did", party_did)?;
        require_non_empty("purpose", purpose)?;

        let key = consent_key(subject_did, party_did, purpose);
        let mut record = self
            .records
            .get_mut(&key)
            .ok_or_else(|| RegistryError::NotFound(key.clone()))?;
        RecordLifecycle::transition(record.status(), LifecycleEvent::Revoke)
            .map_err(|v| RegistryError::from_lifecycle(v, &key))?;

        let now = self.ctx.now();
        record.is_revoked = true;
        record.revoked_at = Some(now);
        record.revoked_by = Some(*caller);
        self.ctx.emit(
            now,
            RegistryEvent::ConsentRevoked {
                consent_key: key.clone(),
                subject_did: subject_did.to_string(),
                party_did: party_did.to_string(),
                purpose: purpose.to_string(),
                revoked_by: *caller,
            },
        );
        drop(record);

        tracing::info!(consent_key = %key, revoked_by = %caller, "consent revoked");
        Ok(())
    }

    /// Whether the consent is valid at the ledger clock's current time.
    pub fn is_valid(&self, subject_did: &str, party_did: &str, purpose: &str) -> bool {
        let now = self.ctx.now();
        self.records
            .get(&consent_key(subject_did, party_did, purpose))
            .map(|r| r.is_valid_at(now))
            .unwrap_or(false)
    }

    pub fn info(&self, subject_did: &str, party_did: &str, purpose: &str) -> Option<ConsentRecord> {
        self.records
            .get(&consent_key(subject_did, party_did, purpose))
            .map(|r| r.clone())
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    fn emit_granted(
        &self,
        now: Timestamp,
        caller: &Identity,
        grant: &ConsentGrant<'_>,
        key: &str,
        reactivated: bool,
    ) {
        self.ctx.emit(
            now,
            RegistryEvent::ConsentGranted {
                consent_key: key.to_string(),
                subject_did: grant.subject_did.to_string(),
                party_did: grant.party_did.to_string(),
                purpose: grant.purpose.to_string(),
                access_level: grant.access_level,
                expires_at: grant.expires_at,
                granted_by: *caller,
                reactivated,
            },
        );
    }
}

/// Move `record` to active with the grant's terms. Returns whether a revoked
/// record was reactivated. `record` is untouched on error.
fn apply_grant(
    record: &mut ConsentRecord,
    caller: &Identity,
    grant: &ConsentGrant<'_>,
    now: Timestamp,
) -> Result<bool, RegistryError> {
    let status = record.status();
    let event = match status {
        RecordStatus::Unregistered => Some(LifecycleEvent::Register),
        RecordStatus::Revoked => Some(LifecycleEvent::Reactivate),
        RecordStatus::Active => None,
    };
    if let Some(event) = event {
        RecordLifecycle::transition(status, event)
            .map_err(|v| RegistryError::from_lifecycle(v, &record.consent_key))?;
    }
    let reactivated = status == RecordStatus::Revoked;

    record.is_registered = true;
    record.is_revoked = false;
    record.revoked_at = None;
    record.revoked_by = None;
    record.data_categories = grant.data_categories.to_string();
    record.access_level = grant.access_level;
    record.expires_at = grant.expires_at;
    record.registered_at = now;
    record.registered_by = *caller;
    Ok(reactivated)
}
