use argon2::Argon2;
use rand::RngCore;
use zeroize::Zeroize;

use crate::encryption::{decrypt_with_key, encrypt_with_key, NONCE_LEN, TAG_LEN};
use crate::error::CryptoError;

/// Salt length for password-derived keys.
pub const SALT_LEN: usize = 16;

/// Derive a 32-byte key from a password using Argon2id.
pub fn derive_key_from_password(password: &[u8], salt: &[u8]) -> Result<[u8; 32], CryptoError> {
    let mut key = [0u8; 32];
    Argon2::default()
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| CryptoError::KeyDerivationError(format!("argon2 failed: {}", e)))?;
    Ok(key)
}

/// Encrypt data under a password. Output layout: salt (16) + nonce (12) + ciphertext.
pub fn encrypt_with_password(password: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let mut key = derive_key_from_password(password, &salt)?;
    let result = encrypt_with_key(&key, &nonce, plaintext);
    key.zeroize();
    let ciphertext = result?;

    let mut out = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Reverse of [`encrypt_with_password`].
pub fn decrypt_with_password(password: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if data.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
        return Err(CryptoError::InvalidCiphertext(format!(
            "password-encrypted blob too short: {} bytes",
            data.len()
        )));
    }
    let (salt, rest) = data.split_at(SALT_LEN);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(nonce_bytes);

    let mut key = derive_key_from_password(password, salt)?;
    let result = decrypt_with_key(&key, &nonce, ciphertext);
    key.zeroize();
    result
}
