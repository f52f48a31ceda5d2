//! Selective disclosure of credential claims using salted BLAKE3 commitments.
//!
//! The issuer commits to each claim separately and signs the commitment
//! root. A holder reveals a chosen subset together with their salts; the
//! verifier recomputes the root from the revealed claims and the hidden
//! commitments, so withheld claims stay bound to the signature.

use std::collections::BTreeMap;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CryptoError;
use crate::hashing::{hash_fields, Hash};

/// Length of the random salt mixed into each claim commitment.
pub const SALT_LEN: usize = 16;

const CLAIM_CONTEXT: &str = "sphyre 2024 disclosure-claim v1";
const ROOT_CONTEXT: &str = "sphyre 2024 disclosure-root v1";

/// Claim name to JSON value.
pub type Claims = BTreeMap<String, Value>;

/// A claim value with the salt used to commit to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaltedClaim {
    pub value: Value,
    /// Hex-encoded salt.
    pub salt: String,
}

impl SaltedClaim {
    fn commitment(&self, name: &str) -> Result<Hash, CryptoError> {
        let salt = hex::decode(&self.salt)
            .map_err(|e| CryptoError::InvalidInput(format!("salt of '{}': {}", name, e)))?;
        commit_claim(name, &self.value, &salt)
    }
}

/// Commitment to one claim: `H(name, canonical JSON value, salt)`.
pub fn commit_claim(name: &str, value: &Value, salt: &[u8]) -> Result<Hash, CryptoError> {
    let encoded = serde_json::to_vec(value)
        .map_err(|e| CryptoError::InvalidInput(format!("claim '{}': {}", name, e)))?;
    Ok(hash_fields(CLAIM_CONTEXT, &[name.as_bytes(), encoded.as_slice(), salt]))
}

/// Root over `(name, commitment)` pairs in name order.
pub fn commitment_root(commitments: &BTreeMap<String, Hash>) -> Hash {
    let mut fields: Vec<&[u8]> = Vec::with_capacity(commitments.len() * 2);
    for (name, commitment) in commitments {
        fields.push(name.as_bytes());
        fields.push(commitment);
    }
    hash_fields(ROOT_CONTEXT, &fields)
}

/// Every claim of a credential subject, each with its own salt.
///
/// Kept by the issuer while signing and handed to the holder, who needs the
/// salts to disclose later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    claims: BTreeMap<String, SaltedClaim>,
}

impl ClaimSet {
    /// Salt and commit to every claim. Empty claim names are rejected.
    pub fn new(claims: Claims) -> Result<Self, CryptoError> {
        let mut salted = BTreeMap::new();
        for (name, value) in claims {
            if name.is_empty() {
                return Err(CryptoError::InvalidInput("claim name must not be empty".into()));
            }
            let mut salt = [0u8; SALT_LEN];
            rand::rngs::OsRng.fill_bytes(&mut salt);
            salted.insert(
                name,
                SaltedClaim {
                    value,
                    salt: hex::encode(salt),
                },
            );
        }
        Ok(Self { claims: salted })
    }

    /// Build from a JSON object such as a `credentialSubject`.
    pub fn from_json(subject: &Value) -> Result<Self, CryptoError> {
        let object = subject
            .as_object()
            .ok_or_else(|| CryptoError::InvalidInput("claims must be a JSON object".into()))?;
        Self::new(object.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.claims.keys().map(String::as_str).collect()
    }

    pub fn commitments(&self) -> Result<BTreeMap<String, Hash>, CryptoError> {
        self.claims
            .iter()
            .map(|(name, claim)| Ok((name.clone(), claim.commitment(name)?)))
            .collect()
    }

    /// The value the issuer signs.
    pub fn root(&self) -> Result<Hash, CryptoError> {
        Ok(commitment_root(&self.commitments()?))
    }

    /// Reveal `names` and keep every other claim behind its commitment.
    pub fn disclose(&self, names: &[&str]) -> Result<Disclosure, CryptoError> {
        for name in names {
            if !self.claims.contains_key(*name) {
                return Err(CryptoError::InvalidInput(format!("claim '{}' not found", name)));
            }
        }
        let mut disclosure = Disclosure::default();
        for (name, claim) in &self.claims {
            if names.contains(&name.as_str()) {
                disclosure.revealed.insert(name.clone(), claim.clone());
            } else {
                disclosure
                    .hidden
                    .insert(name.clone(), hex::encode(claim.commitment(name)?));
            }
        }
        tracing::debug!(
            revealed = disclosure.revealed.len(),
            hidden = disclosure.hidden.len(),
            "claims disclosed"
        );
        Ok(disclosure)
    }
}

/// What a verifier receives: revealed claims with salts, and hex
/// commitments for the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Disclosure {
    pub revealed: BTreeMap<String, SaltedClaim>,
    pub hidden: BTreeMap<String, String>,
}

impl Disclosure {
    /// Recompute the commitment root.
    pub fn root(&self) -> Result<Hash, CryptoError> {
        let mut commitments = BTreeMap::new();
        for (name, claim) in &self.revealed {
            commitments.insert(name.clone(), claim.commitment(name)?);
        }
        for (name, commitment) in &self.hidden {
            if commitments.contains_key(name) {
                return Err(CryptoError::InvalidInput(format!(
                    "claim '{}' is both revealed and hidden",
                    name
                )));
            }
            let bytes: Hash = hex::decode(commitment)
                .ok()
                .and_then(|b| b.try_into().ok())
                .ok_or_else(|| {
                    CryptoError::InvalidInput(format!("malformed commitment for '{}'", name))
                })?;
            commitments.insert(name.clone(), bytes);
        }
        Ok(commitment_root(&commitments))
    }

    /// Whether the disclosure reproduces `expected_root`. Fails closed.
    pub fn verify(&self, expected_root: &Hash) -> bool {
        matches!(self.root(), Ok(root) if root == *expected_root)
    }

    /// The revealed claim values.
    pub fn claims(&self) -> Claims {
        self.revealed
            .iter()
            .map(|(name, claim)| (name.clone(), claim.value.clone()))
            .collect()
    }
}
