use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;

use crate::error::CryptoError;
use crate::kem::{self, KemKeyPair, KemPublicKey, KEM_CIPHERTEXT_LEN};

/// BLAKE3 context binding a KEM shared secret to its use as an AEAD key.
pub const SEAL_KEY_CONTEXT: &str = "sphyre 2024 kem-seal chacha20poly1305 v1";

/// ChaCha20-Poly1305 nonce length.
pub const NONCE_LEN: usize = 12;

/// Poly1305 tag length appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Payload sealed to a Kyber public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    /// Kyber ciphertext carrying the shared secret.
    pub kem_ciphertext: Vec<u8>,
    /// Random 12-byte nonce for ChaCha20-Poly1305.
    pub nonce: [u8; NONCE_LEN],
    /// Encrypted data (ciphertext + 16-byte Poly1305 tag).
    pub ciphertext: Vec<u8>,
}

impl SealedPayload {
    /// Serialize to bytes: kem_ciphertext (fixed) + nonce (12) + ciphertext (variable).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(self.kem_ciphertext.len() + NONCE_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.kem_ciphertext);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Deserialize from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let header = KEM_CIPHERTEXT_LEN + NONCE_LEN;
        if bytes.len() < header + TAG_LEN {
            return Err(CryptoError::InvalidCiphertext(format!(
                "sealed payload too short: {} bytes",
                bytes.len()
            )));
        }
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[KEM_CIPHERTEXT_LEN..header]);
        Ok(Self {
            kem_ciphertext: bytes[..KEM_CIPHERTEXT_LEN].to_vec(),
            nonce,
            ciphertext: bytes[header..].to_vec(),
        })
    }
}

fn random_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Encrypt with a 32-byte key and an explicit nonce.
pub fn encrypt_with_key(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| CryptoError::EncryptionError(format!("cipher init failed: {}", e)))?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| CryptoError::EncryptionError(format!("encryption failed: {}", e)))
}

/// Decrypt with a 32-byte key. Any tag mismatch is an error; no partial
/// plaintext is ever returned.
pub fn decrypt_with_key(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| CryptoError::DecryptionError(format!("cipher init failed: {}", e)))?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::DecryptionError("authentication tag mismatch".into()))
}

/// Encrypt plaintext for a recipient using Kyber encapsulation + ChaCha20-Poly1305.
///
/// A fresh shared secret is encapsulated to `recipient`, run through the BLAKE3
/// KDF, and used as the AEAD key with a random nonce.
pub fn seal(recipient: &KemPublicKey, plaintext: &[u8]) -> Result<SealedPayload, CryptoError> {
    let (shared_secret, kem_ciphertext) = kem::encapsulate(recipient)?;
    let key = shared_secret.derive_key(SEAL_KEY_CONTEXT);
    let nonce = random_nonce();
    let ciphertext = encrypt_with_key(&key, &nonce, plaintext)?;

    Ok(SealedPayload {
        kem_ciphertext,
        nonce,
        ciphertext,
    })
}

/// Decrypt a sealed payload with the recipient's Kyber key pair.
pub fn open(payload: &SealedPayload, recipient: &KemKeyPair) -> Result<Vec<u8>, CryptoError> {
    let shared_secret = kem::decapsulate(recipient.secret_bytes(), &payload.kem_ciphertext)?;
    let key = shared_secret.derive_key(SEAL_KEY_CONTEXT);
    decrypt_with_key(&key, &payload.nonce, &payload.ciphertext)
}
