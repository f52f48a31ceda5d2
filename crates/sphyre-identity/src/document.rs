use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sphyre_core::Timestamp;
use sphyre_crypto::hashing::hash_fields;
use sphyre_crypto::{sign, Hash, Signature, SigningKeyPair, SigningPublicKey};

use crate::error::IdentityError;

/// Verification method type for Dilithium2 keys.
pub const DILITHIUM_METHOD_TYPE: &str = "Dilithium2VerificationKey2024";

const DOCUMENT_DIGEST_CONTEXT: &str = "sphyre 2024 did-document v1";

/// Seconds since the epoch as a UTC date; out-of-range values clamp to the epoch.
pub(crate) fn to_datetime(at: Timestamp) -> DateTime<Utc> {
    i64::try_from(at)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_default()
}

/// A verification method within a DID Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Verification method identifier (e.g., "did:sphyre:abc#keys-1").
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    /// The DID that controls this verification method.
    pub controller: String,
    /// Hex-encoded public key material.
    pub public_key_hex: String,
}

/// A service endpoint in a DID Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: String,
}

/// DID Document for a `did:sphyre` subject, serialized with DID Core names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    /// The DID subject.
    pub id: String,
    #[serde(rename = "verificationMethod")]
    pub verification_methods: Vec<VerificationMethod>,
    #[serde(rename = "service", default)]
    pub services: Vec<Service>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl DidDocument {
    /// Create a new DID Document with a single Dilithium2 verification method.
    pub fn new(id: String, public_key: &SigningPublicKey, at: Timestamp) -> Self {
        let now = to_datetime(at);
        let vm = VerificationMethod {
            id: format!("{}#keys-1", id),
            method_type: DILITHIUM_METHOD_TYPE.to_string(),
            controller: id.clone(),
            public_key_hex: public_key.to_hex(),
        };
        Self {
            id,
            verification_methods: vec![vm],
            services: Vec::new(),
            created: now,
            updated: now,
        }
    }

    /// Add a service endpoint.
    pub fn add_service(&mut self, service_type: &str, endpoint: &str, at: Timestamp) {
        let idx = self.services.len() + 1;
        self.services.push(Service {
            id: format!("{}#service-{}", self.id, idx),
            service_type: service_type.to_string(),
            service_endpoint: endpoint.to_string(),
        });
        self.updated = to_datetime(at);
    }

    /// Add another Dilithium2 verification method (key rotation).
    pub fn add_verification_method(&mut self, public_key: &SigningPublicKey, at: Timestamp) {
        let idx = self.verification_methods.len() + 1;
        self.verification_methods.push(VerificationMethod {
            id: format!("{}#keys-{}", self.id, idx),
            method_type: DILITHIUM_METHOD_TYPE.to_string(),
            controller: self.id.clone(),
            public_key_hex: public_key.to_hex(),
        });
        self.updated = to_datetime(at);
    }

    /// Primary verification key (first Dilithium2 method).
    pub fn primary_public_key(&self) -> Result<SigningPublicKey, IdentityError> {
        let vm = self
            .verification_methods
            .iter()
            .find(|vm| vm.method_type == DILITHIUM_METHOD_TYPE)
            .ok_or_else(|| IdentityError::MissingVerificationKey(self.id.clone()))?;
        Ok(SigningPublicKey::from_hex(&vm.public_key_hex)?)
    }

    /// Digest of the document content a controller signs to update it.
    ///
    /// Covers the id, verification methods, and services. Timestamps are
    /// excluded; the directory stamps them.
    pub fn update_digest(&self) -> Hash {
        let mut fields: Vec<&[u8]> = vec![self.id.as_bytes()];
        for vm in &self.verification_methods {
            fields.extend([
                vm.id.as_bytes(),
                vm.method_type.as_bytes(),
                vm.controller.as_bytes(),
                vm.public_key_hex.as_bytes(),
            ]);
        }
        // Separates the method list from the service list.
        fields.push(b"");
        for service in &self.services {
            fields.extend([
                service.id.as_bytes(),
                service.service_type.as_bytes(),
                service.service_endpoint.as_bytes(),
            ]);
        }
        hash_fields(DOCUMENT_DIGEST_CONTEXT, &fields)
    }

    /// Sign this document's update digest with the controller's key.
    pub fn sign_update(&self, keypair: &SigningKeyPair) -> Signature {
        sign(&self.update_digest(), keypair)
    }
}
