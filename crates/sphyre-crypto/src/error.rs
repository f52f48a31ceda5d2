/// Cryptographic operation errors.
///
/// Malformed inputs are always reported here; a well-formed signature that
/// does not verify is `Ok(false)`, never an error.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key generation failed: {0}")]
    KeyGenerationError(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid signature length: expected {expected}, got {actual}")]
    InvalidSignatureLength { expected: usize, actual: usize },

    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    #[error("encapsulation failed: {0}")]
    EncapsulationError(String),

    #[error("decapsulation failed: {0}")]
    DecapsulationError(String),

    #[error("encryption failed: {0}")]
    EncryptionError(String),

    #[error("decryption failed: {0}")]
    DecryptionError(String),

    #[error("key derivation failed: {0}")]
    KeyDerivationError(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("token signature verification failed")]
    TokenSignatureInvalid,

    #[error("token expired at {expired_at} (now {now})")]
    TokenExpired { expired_at: u64, now: u64 },

    #[error("token not valid before {not_before} (now {now})")]
    TokenNotYetValid { not_before: u64, now: u64 },
}
