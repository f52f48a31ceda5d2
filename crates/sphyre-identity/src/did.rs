use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sphyre_core::{Clock, SystemClock};
use sphyre_crypto::{Signature, SigningPublicKey};

use crate::document::{to_datetime, DidDocument};
use crate::error::IdentityError;

/// Prefix of every DID issued by this directory.
pub const DID_PREFIX: &str = "did:sphyre:";

/// Derive the DID for a signing key: `did:sphyre:<bs58(blake3(public key))>`.
pub fn did_from_public_key(public_key: &SigningPublicKey) -> String {
    let digest = sphyre_crypto::hash(public_key.as_bytes());
    format!("{}{}", DID_PREFIX, bs58::encode(digest).into_string())
}

/// Check that a string is a syntactically valid `did:sphyre` identifier.
pub fn validate_did(did: &str) -> Result<(), IdentityError> {
    let suffix = did
        .strip_prefix(DID_PREFIX)
        .ok_or_else(|| IdentityError::InvalidDid(format!("missing '{}' prefix: {}", DID_PREFIX, did)))?;
    let bytes = bs58::decode(suffix)
        .into_vec()
        .map_err(|e| IdentityError::InvalidDid(format!("{}: {}", did, e)))?;
    if bytes.len() != 32 {
        return Err(IdentityError::InvalidDid(format!(
            "{}: identifier must encode 32 bytes, got {}",
            did,
            bytes.len()
        )));
    }
    Ok(())
}

/// In-memory DID document store.
///
/// Writes to one DID are serialized by the map's shard lock; reads proceed
/// concurrently. Document timestamps come from the injected clock.
pub struct DidDirectory {
    /// DID URI -> DidDocument
    store: DashMap<String, DidDocument>,
    clock: Arc<dyn Clock>,
}

impl DidDirectory {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: DashMap::new(),
            clock,
        }
    }

    /// Register the DID controlled by `public_key` and store its document.
    pub fn register(&self, public_key: &SigningPublicKey) -> Result<String, IdentityError> {
        let did = did_from_public_key(public_key);
        match self.store.entry(did.clone()) {
            Entry::Occupied(_) => Err(IdentityError::DuplicateDid(did)),
            Entry::Vacant(slot) => {
                slot.insert(DidDocument::new(did.clone(), public_key, self.clock.now()));
                tracing::info!(did = %did, "DID registered");
                Ok(did)
            }
        }
    }

    /// Resolve a DID to a copy of its document.
    pub fn resolve(&self, did: &str) -> Option<DidDocument> {
        self.store.get(did).map(|entry| entry.clone())
    }

    /// Replace the document of an already registered DID.
    ///
    /// `signature` must be the current primary key's signature over the new
    /// document's [`DidDocument::update_digest`], and the new document must
    /// still carry a usable verification key. `created` is preserved and
    /// `updated` is set from the directory clock.
    pub fn update_document(
        &self,
        mut doc: DidDocument,
        signature: &Signature,
    ) -> Result<(), IdentityError> {
        let mut existing = self
            .store
            .get_mut(&doc.id)
            .ok_or_else(|| IdentityError::DidNotFound(doc.id.clone()))?;

        let controller_key = existing.primary_public_key()?;
        if !sphyre_crypto::verify(&doc.update_digest(), signature, &controller_key) {
            tracing::warn!(did = %doc.id, "rejected DID document update: bad controller signature");
            return Err(IdentityError::Unauthorized(doc.id));
        }
        doc.primary_public_key()?;

        doc.created = existing.created;
        doc.updated = to_datetime(self.clock.now());
        tracing::debug!(did = %doc.id, "DID document updated");
        *existing = doc;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// List all stored DID URIs.
    pub fn list_dids(&self) -> Vec<String> {
        self.store.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl Default for DidDirectory {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}
