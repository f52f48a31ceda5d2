use crystals_dilithium::dilithium2::{Keypair, PublicKey, PUBLICKEYBYTES};
use rand::rngs::OsRng;
use rand::RngCore;
use sphyre_core::Identity;
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Length of the seed a Dilithium key pair is regenerated from.
pub const SEED_LEN: usize = 32;

/// Length of a Dilithium2 public key.
pub const PUBLIC_KEY_LEN: usize = PUBLICKEYBYTES;

/// Dilithium2 key pair for signing operations.
///
/// Only the 32-byte seed is persisted; the expanded key is rebuilt from it.
/// The seed is zeroized on drop.
pub struct SigningKeyPair {
    seed: [u8; SEED_LEN],
    keypair: Keypair,
}

impl SigningKeyPair {
    /// Generate a new random key pair using OS-provided entropy.
    pub fn generate() -> Self {
        let mut seed = [0u8; SEED_LEN];
        OsRng.fill_bytes(&mut seed);
        let kp = Self::from_seed(&seed);
        seed.zeroize();
        kp
    }

    /// Deterministically create a key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SEED_LEN]) -> Self {
        let keypair = Keypair::generate(Some(&seed[..]));
        Self {
            seed: *seed,
            keypair,
        }
    }

    /// Create a key pair from raw seed bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut seed: [u8; SEED_LEN] =
            bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: SEED_LEN,
                actual: bytes.len(),
            })?;
        let kp = Self::from_seed(&seed);
        seed.zeroize();
        Ok(kp)
    }

    /// Get the public key.
    pub fn public_key(&self) -> SigningPublicKey {
        SigningPublicKey {
            bytes: self.keypair.public.to_bytes().to_vec(),
        }
    }

    /// Identity controlled by this key pair.
    pub fn identity(&self) -> Identity {
        Identity::from_public_key(&self.keypair.public.to_bytes())
    }

    /// Raw seed bytes. Use with caution; prefer the signing functions.
    pub fn seed_bytes(&self) -> [u8; SEED_LEN] {
        self.seed
    }

    pub(crate) fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl Drop for SigningKeyPair {
    fn drop(&mut self) {
        self.seed.zeroize();
    }
}

impl std::fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("public_key", &self.public_key().to_hex())
            .finish_non_exhaustive()
    }
}

/// Dilithium2 public key for verification operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SigningPublicKey {
    bytes: Vec<u8>,
}

impl SigningPublicKey {
    /// Create from raw bytes. The length is checked before use.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != PUBLIC_KEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: PUBLIC_KEY_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encode as hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Decode from hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Identity controlled by this key.
    pub fn identity(&self) -> Identity {
        Identity::from_public_key(&self.bytes)
    }

    pub(crate) fn to_dilithium(&self) -> PublicKey {
        PublicKey::from_bytes(&self.bytes)
    }
}
