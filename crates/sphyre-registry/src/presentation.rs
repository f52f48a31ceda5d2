//! Verifiable presentations: a holder bundles issuer-signed credentials for
//! one relying party and purpose, then signs the bundle with its DID key.

use serde::{Deserialize, Serialize};
use sphyre_core::Timestamp;
use sphyre_crypto::hashing::hash_fields;
use sphyre_crypto::{hash_hex, sign, Claims, Disclosure, Hash, Signature, SigningKeyPair};

use crate::error::RegistryError;

const PRESENTATION_CONTEXT: &str = "sphyre 2024 presentation v1";

/// How a credential is shown to the verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialProof {
    /// The whole payload the issuer signed.
    Full { payload: Vec<u8> },
    /// Chosen claims of a credential whose commitment root (hex) the issuer
    /// signed.
    Selective { root: String, disclosure: Disclosure },
}

impl CredentialProof {
    /// The bytes covered by the issuer signature.
    pub fn signed_bytes(&self) -> Result<Vec<u8>, RegistryError> {
        match self {
            Self::Full { payload } => Ok(payload.clone()),
            Self::Selective { root, .. } => Ok(decode_root(root)?.to_vec()),
        }
    }

    /// Ledger key component: `hash_hex` of the signed bytes.
    pub fn credential_hash(&self) -> Result<String, RegistryError> {
        Ok(hash_hex(&self.signed_bytes()?))
    }

    /// Whether revealed claims reproduce the signed root. Full payloads
    /// have nothing to reconcile.
    pub fn disclosure_valid(&self) -> bool {
        match self {
            Self::Full { .. } => true,
            Self::Selective { root, disclosure } => {
                decode_root(root).is_ok_and(|root| disclosure.verify(&root))
            }
        }
    }

    /// Claims the verifier gets to see. For a full JSON payload these are
    /// the `credentialSubject` fields other than `id`.
    pub fn disclosed_claims(&self) -> Claims {
        match self {
            Self::Full { payload } => serde_json::from_slice::<serde_json::Value>(payload)
                .ok()
                .and_then(|v| v.get("credentialSubject").and_then(|s| s.as_object()).cloned())
                .map(|subject| {
                    subject
                        .into_iter()
                        .filter(|(k, _)| k != "id")
                        .collect()
                })
                .unwrap_or_default(),
            Self::Selective { disclosure, .. } => disclosure.claims(),
        }
    }

    fn kind(&self) -> &'static [u8] {
        match self {
            Self::Full { .. } => b"full",
            Self::Selective { .. } => b"selective",
        }
    }
}

fn decode_root(root: &str) -> Result<Hash, RegistryError> {
    hex::decode(root)
        .ok()
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| RegistryError::InvalidInput(format!("malformed commitment root: {}", root)))
}

/// One credential inside a presentation, with its issuer signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentedCredential {
    pub issuer_did: String,
    pub proof: CredentialProof,
    pub signature: Vec<u8>,
}

impl PresentedCredential {
    pub fn full(issuer_did: &str, payload: &[u8], signature: &Signature) -> Self {
        Self {
            issuer_did: issuer_did.to_string(),
            proof: CredentialProof::Full {
                payload: payload.to_vec(),
            },
            signature: signature.as_bytes().to_vec(),
        }
    }

    pub fn selective(
        issuer_did: &str,
        root: &Hash,
        disclosure: Disclosure,
        signature: &Signature,
    ) -> Self {
        Self {
            issuer_did: issuer_did.to_string(),
            proof: CredentialProof::Selective {
                root: hex::encode(root),
                disclosure,
            },
            signature: signature.as_bytes().to_vec(),
        }
    }
}

/// A holder-signed bundle of credentials for one verifier and purpose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub holder_did: String,
    pub verifier_did: String,
    pub purpose: String,
    pub created_at: Timestamp,
    pub credentials: Vec<PresentedCredential>,
    pub signature: Vec<u8>,
}

impl Presentation {
    /// Unsigned presentation; call [`Presentation::sign`] before sending.
    pub fn new(
        holder_did: &str,
        verifier_did: &str,
        purpose: &str,
        created_at: Timestamp,
        credentials: Vec<PresentedCredential>,
    ) -> Self {
        Self {
            holder_did: holder_did.to_string(),
            verifier_did: verifier_did.to_string(),
            purpose: purpose.to_string(),
            created_at,
            credentials,
            signature: Vec::new(),
        }
    }

    /// Digest the holder signs: every field except the signature itself.
    pub fn digest(&self) -> Result<Hash, RegistryError> {
        let mut signed = Vec::with_capacity(self.credentials.len());
        for credential in &self.credentials {
            signed.push(credential.proof.signed_bytes()?);
        }

        let created_at = self.created_at.to_le_bytes();
        let count = (self.credentials.len() as u64).to_le_bytes();
        let mut fields: Vec<&[u8]> = vec![
            self.holder_did.as_bytes(),
            self.verifier_did.as_bytes(),
            self.purpose.as_bytes(),
            created_at.as_slice(),
            count.as_slice(),
        ];
        for (credential, bytes) in self.credentials.iter().zip(&signed) {
            fields.extend([
                credential.issuer_did.as_bytes(),
                credential.proof.kind(),
                bytes.as_slice(),
                credential.signature.as_slice(),
            ]);
        }
        Ok(hash_fields(PRESENTATION_CONTEXT, &fields))
    }

    /// Sign with the holder's DID key.
    pub fn sign(mut self, holder: &SigningKeyPair) -> Result<Self, RegistryError> {
        self.signature = sign(&self.digest()?, holder).as_bytes().to_vec();
        Ok(self)
    }
}

/// Outcome of checking one presented credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialCheck {
    pub issuer_did: String,
    pub credential_hash: String,
    pub signature_valid: bool,
    pub disclosure_valid: bool,
    pub ledger_valid: bool,
    pub disclosed: Claims,
}

impl CredentialCheck {
    pub fn is_valid(&self) -> bool {
        self.signature_valid && self.disclosure_valid && self.ledger_valid
    }
}

/// Outcome of [`crate::RegistryFacade::verify_presentation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationVerification {
    pub is_valid: bool,
    /// One message per failed check, in check order.
    pub errors: Vec<String>,
    pub holder_did: String,
    pub verifier_did: String,
    pub purpose: String,
    pub holder_signature_valid: bool,
    pub consent_valid: bool,
    pub credentials: Vec<CredentialCheck>,
}
