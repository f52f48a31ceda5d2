use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// `expires_at` value meaning "never expires".
pub const NO_EXPIRY: Timestamp = 0;

/// Length of an identity in bytes.
pub const IDENTITY_LEN: usize = 20;

/// Account reference for callers, owners, and registry instances.
///
/// Identities are 20-byte values rendered as `0x`-prefixed hex. The all-zero
/// identity is the null identity and is never a valid owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity([u8; IDENTITY_LEN]);

impl Identity {
    /// The null identity.
    pub const ZERO: Identity = Identity([0u8; IDENTITY_LEN]);

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive the identity controlled by a signing public key.
    ///
    /// The identity is the first 20 bytes of the BLAKE3 hash of the key.
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let digest = blake3::hash(public_key);
        let mut bytes = [0u8; IDENTITY_LEN];
        bytes.copy_from_slice(&digest.as_bytes()[..IDENTITY_LEN]);
        Self(bytes)
    }

    /// Derive a deterministic identity from a sequence of labelled parts.
    /// Used to address registry instances.
    pub fn derive(context: &str, parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(context);
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        let digest = hasher.finalize();
        let mut bytes = [0u8; IDENTITY_LEN];
        bytes.copy_from_slice(&digest.as_bytes()[..IDENTITY_LEN]);
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }

    /// Whether this is the null identity.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; IDENTITY_LEN]
    }

    /// Encode as `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Identity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)
            .map_err(|e| CoreError::InvalidIdentity(format!("invalid hex '{}': {}", s, e)))?;
        let arr: [u8; IDENTITY_LEN] = bytes.as_slice().try_into().map_err(|_| {
            CoreError::InvalidIdentity(format!(
                "identity must be {} bytes, got {}",
                IDENTITY_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl TryFrom<String> for Identity {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Identity> for String {
    fn from(id: Identity) -> Self {
        id.to_hex()
    }
}

/// Roles held in the access control directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May register credentials and schemas.
    Issuer,
    /// May manage roles, revoke any credential, and update any schema.
    Verifier,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Issuer => write!(f, "issuer"),
            Self::Verifier => write!(f, "verifier"),
        }
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "issuer" => Ok(Self::Issuer),
            "verifier" => Ok(Self::Verifier),
            other => Err(CoreError::InvalidRole(other.to_string())),
        }
    }
}

/// Scope of data access granted by a consent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    ReadOnly,
    ReadWrite,
    FullAccess,
    /// Single retrieval; enforcement of "single" is the relying party's job.
    OneTime,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "read_only"),
            Self::ReadWrite => write!(f, "read_write"),
            Self::FullAccess => write!(f, "full_access"),
            Self::OneTime => write!(f, "one_time"),
        }
    }
}

impl FromStr for AccessLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read_only" => Ok(Self::ReadOnly),
            "read_write" => Ok(Self::ReadWrite),
            "full_access" => Ok(Self::FullAccess),
            "one_time" => Ok(Self::OneTime),
            other => Err(CoreError::InvalidAccessLevel(other.to_string())),
        }
    }
}
