//! Kyber-768 key encapsulation.
//!
//! The shared secret produced here is never handed out as key material
//! directly: callers go through [`SharedSecret::derive_key`].

use pqc_kyber::{KYBER_CIPHERTEXTBYTES, KYBER_PUBLICKEYBYTES, KYBER_SECRETKEYBYTES};
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Length of a Kyber public key.
pub const KEM_PUBLIC_KEY_LEN: usize = KYBER_PUBLICKEYBYTES;
/// Length of a Kyber secret key.
pub const KEM_SECRET_KEY_LEN: usize = KYBER_SECRETKEYBYTES;
/// Length of a Kyber ciphertext.
pub const KEM_CIPHERTEXT_LEN: usize = KYBER_CIPHERTEXTBYTES;
/// Length of the encapsulated shared secret.
pub const SHARED_SECRET_LEN: usize = 32;

/// Secret produced by encapsulation / decapsulation. Zeroized on drop.
#[derive(PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; SHARED_SECRET_LEN]);

impl SharedSecret {
    /// Derive a 32-byte symmetric key bound to `context` (BLAKE3 KDF).
    pub fn derive_key(&self, context: &str) -> [u8; 32] {
        blake3::derive_key(context, &self.0)
    }

    /// Raw secret bytes. Only for comparing both sides of an exchange.
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

/// Kyber public key (recipient side of an encapsulation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KemPublicKey {
    bytes: Vec<u8>,
}

impl KemPublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEM_PUBLIC_KEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEM_PUBLIC_KEY_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

/// Kyber key pair. The secret half is zeroized on drop.
pub struct KemKeyPair {
    public: KemPublicKey,
    secret: Vec<u8>,
}

impl KemKeyPair {
    /// Generate a fresh key pair from OS entropy.
    pub fn generate() -> Result<Self, CryptoError> {
        let keys = pqc_kyber::keypair(&mut OsRng)
            .map_err(|e| CryptoError::KeyGenerationError(format!("kyber keypair: {:?}", e)))?;
        Ok(Self {
            public: KemPublicKey {
                bytes: keys.public.to_vec(),
            },
            secret: keys.secret.to_vec(),
        })
    }

    /// Rebuild a key pair from stored halves.
    pub fn from_parts(public: &[u8], secret: &[u8]) -> Result<Self, CryptoError> {
        if secret.len() != KEM_SECRET_KEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEM_SECRET_KEY_LEN,
                actual: secret.len(),
            });
        }
        Ok(Self {
            public: KemPublicKey::from_bytes(public)?,
            secret: secret.to_vec(),
        })
    }

    pub fn public_key(&self) -> &KemPublicKey {
        &self.public
    }

    /// Raw secret key bytes. Use with caution; prefer [`decapsulate`].
    pub fn secret_bytes(&self) -> &[u8] {
        &self.secret
    }
}

impl Drop for KemKeyPair {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

/// Encapsulate a fresh shared secret to a recipient public key.
///
/// Returns the secret and the ciphertext the recipient needs to recover it.
pub fn encapsulate(recipient: &KemPublicKey) -> Result<(SharedSecret, Vec<u8>), CryptoError> {
    let (ciphertext, secret) = pqc_kyber::encapsulate(recipient.as_bytes(), &mut OsRng)
        .map_err(|e| CryptoError::EncapsulationError(format!("{:?}", e)))?;
    Ok((SharedSecret(secret), ciphertext.to_vec()))
}

/// Recover the shared secret from a ciphertext with the recipient's secret key.
pub fn decapsulate(secret_key: &[u8], ciphertext: &[u8]) -> Result<SharedSecret, CryptoError> {
    if secret_key.len() != KEM_SECRET_KEY_LEN {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEM_SECRET_KEY_LEN,
            actual: secret_key.len(),
        });
    }
    if ciphertext.len() != KEM_CIPHERTEXT_LEN {
        return Err(CryptoError::InvalidCiphertext(format!(
            "expected {} bytes, got {}",
            KEM_CIPHERTEXT_LEN,
            ciphertext.len()
        )));
    }
    let secret = pqc_kyber::decapsulate(ciphertext, secret_key)
        .map_err(|e| CryptoError::DecapsulationError(format!("{:?}", e)))?;
    Ok(SharedSecret(secret))
}
