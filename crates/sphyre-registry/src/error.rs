use sphyre_core::{Identity, LifecycleViolation};

/// Registry errors.
///
/// Every ledger operation fails fast with one of these; nothing is retried
/// or swallowed internally.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthorized: {caller} may not {action}")]
    Unauthorized { caller: Identity, action: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already registered: {0}")]
    AlreadyRegistered(String),

    #[error("already revoked: {0}")]
    AlreadyRevoked(String),

    #[error("index {index} out of bounds (len {len})")]
    OutOfBounds { index: usize, len: usize },

    #[error("crypto error: {0}")]
    Crypto(#[from] sphyre_crypto::CryptoError),

    #[error("identity error: {0}")]
    Identity(#[from] sphyre_identity::IdentityError),

    #[error("configuration error: {0}")]
    Config(#[from] sphyre_core::CoreError),
}

impl RegistryError {
    pub(crate) fn unauthorized(caller: &Identity, action: &str) -> Self {
        Self::Unauthorized {
            caller: *caller,
            action: action.to_string(),
        }
    }

    /// Map a rejected lifecycle transition on `key` to the matching error kind.
    pub(crate) fn from_lifecycle(violation: LifecycleViolation, key: &str) -> Self {
        match violation {
            LifecycleViolation::AlreadyRegistered => Self::AlreadyRegistered(key.to_string()),
            LifecycleViolation::AlreadyRevoked => Self::AlreadyRevoked(key.to_string()),
            LifecycleViolation::NotRegistered | LifecycleViolation::NotRevoked => {
                Self::NotFound(key.to_string())
            }
        }
    }
}

/// Reject empty string arguments.
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), RegistryError> {
    if value.is_empty() {
        return Err(RegistryError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}
