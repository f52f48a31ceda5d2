/// Identity-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("DID not found: {0}")]
    DidNotFound(String),

    #[error("invalid DID format: {0}")]
    InvalidDid(String),

    #[error("duplicate DID: {0}")]
    DuplicateDid(String),

    #[error("DID resolution failed: {0}")]
    DidResolution(String),

    #[error("DID document update not signed by the current controller key: {0}")]
    Unauthorized(String),

    #[error("DID document has no usable verification key: {0}")]
    MissingVerificationKey(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] sphyre_crypto::CryptoError),
}
