use crystals_dilithium::dilithium2::SIGNBYTES;

use crate::error::CryptoError;
use crate::keys::{SigningKeyPair, SigningPublicKey};

/// Length of a Dilithium2 signature.
pub const SIGNATURE_LEN: usize = SIGNBYTES;

/// Dilithium2 signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    bytes: Vec<u8>,
}

impl Signature {
    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Create from raw bytes. Wrong lengths are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(CryptoError::InvalidSignatureLength {
                expected: SIGNATURE_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
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
}

/// Sign a message using Dilithium2.
pub fn sign(message: &[u8], keypair: &SigningKeyPair) -> Signature {
    Signature {
        bytes: keypair.keypair().sign(message).to_vec(),
    }
}

/// Verify a Dilithium2 signature. A mismatch is `false`, never an error.
pub fn verify(message: &[u8], signature: &Signature, pubkey: &SigningPublicKey) -> bool {
    let sig: [u8; SIGNATURE_LEN] = match signature.as_bytes().try_into() {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    pubkey.to_dilithium().verify(message, &sig)
}

/// Verify raw signature and key bytes.
///
/// Malformed lengths are errors; a well-formed signature that does not
/// verify is `Ok(false)`.
pub fn verify_bytes(
    message: &[u8],
    signature: &[u8],
    public_key: &[u8],
) -> Result<bool, CryptoError> {
    let signature = Signature::from_bytes(signature)?;
    let pubkey = SigningPublicKey::from_bytes(public_key)?;
    Ok(verify(message, &signature, &pubkey))
}

/// Sign a credential payload (serialized bytes) using Dilithium2.
pub fn sign_credential(payload: &[u8], keypair: &SigningKeyPair) -> Signature {
    sign(payload, keypair)
}

/// Verify a credential payload's Dilithium2 signature.
pub fn verify_credential(payload: &[u8], signature: &Signature, pubkey: &SigningPublicKey) -> bool {
    verify(payload, signature, pubkey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::SigningKeyPair;

    #[test]
    fn test_sign_verify_roundtrip() {
        let kp = SigningKeyPair::generate();
        let message = b"hello Sphyre registry";
        let sig = sign(message, &kp);
        assert!(verify(message, &sig, &kp.public_key()));
    }

    #[test]
    fn test_verify_wrong_message_fails() {
        let kp = SigningKeyPair::generate();
        let sig = sign(b"correct message", &kp);
        assert!(!verify(b"wrong message", &sig, &kp.public_key()));
    }

    #[test]
    fn test_verify_wrong_key_fails() {
        let kp1 = SigningKeyPair::generate();
        let kp2 = SigningKeyPair::generate();
        let sig = sign(b"test message", &kp1);
        assert!(!verify(b"test message", &sig, &kp2.public_key()));
    }

    #[test]
    fn test_sign_empty_message() {
        let kp = SigningKeyPair::generate();
        let sig = sign(b"", &kp);
        assert!(verify(b"", &sig, &kp.public_key()));
    }

    #[test]
    fn test_sign_large_message() {
        let kp = SigningKeyPair::generate();
        let message = vec![0xABu8; 10_000];
        let sig = sign(&message, &kp);
        assert!(verify(&message, &sig, &kp.public_key()));
    }

    #[test]
    fn test_single_bit_flip_in_message_fails() {
        let kp = SigningKeyPair::from_seed(&[11u8; 32]);
        let message = b"credential-hash-0xabc".to_vec();
        let sig = sign(&message, &kp);
        for i in 0..message.len() {
            let mut flipped = message.clone();
            flipped[i] ^= 0x01;
            assert!(!verify(&flipped, &sig, &kp.public_key()), "byte {}", i);
        }
    }

    #[test]
    fn test_bit_flip_in_signature_fails() {
        let kp = SigningKeyPair::generate();
        let sig = sign(b"payload", &kp);
        let mut bytes = sig.as_bytes().to_vec();
        bytes[0] ^= 0x01;
        let tampered = Signature::from_bytes(&bytes).unwrap();
        assert!(!verify(b"payload", &tampered, &kp.public_key()));
    }

    #[test]
    fn test_every_signature_bit_flip_fails() {
        let kp = SigningKeyPair::from_seed(&[23u8; 32]);
        let pk = kp.public_key();
        let sig = sign(b"payload", &kp);
        let original = sig.as_bytes().to_vec();
        let mut bytes = original.clone();
        // Covers the packed hint section at the tail too.
        for bit in 0..original.len() * 8 {
            bytes[bit / 8] ^= 1 << (bit % 8);
            let tampered = Signature::from_bytes(&bytes).unwrap();
            assert!(!verify(b"payload", &tampered, &pk), "bit {}", bit);
            bytes[bit / 8] = original[bit / 8];
        }
    }

    #[test]
    fn test_signature_bytes_roundtrip() {
        let kp = SigningKeyPair::generate();
        let sig = sign(b"test", &kp);
        assert_eq!(sig.as_bytes().len(), SIGNATURE_LEN);
        let sig2 = Signature::from_bytes(sig.as_bytes()).unwrap();
        assert_eq!(sig, sig2);
        assert_eq!(Signature::from_hex(&sig.to_hex()).unwrap(), sig);
    }

    #[test]
    fn test_signature_from_invalid_bytes() {
        assert!(matches!(
            Signature::from_bytes(&[0u8; 32]),
            Err(CryptoError::InvalidSignatureLength { actual: 32, .. })
        ));
    }

    #[test]
    fn test_verify_bytes_malformed_is_error() {
        let kp = SigningKeyPair::generate();
        let sig = sign(b"m", &kp);
        let pk = kp.public_key();
        assert!(verify_bytes(b"m", &sig.as_bytes()[..10], pk.as_bytes()).is_err());
        assert!(verify_bytes(b"m", sig.as_bytes(), &pk.as_bytes()[..10]).is_err());
        assert!(verify_bytes(b"m", sig.as_bytes(), pk.as_bytes()).unwrap());
        assert!(!verify_bytes(b"x", sig.as_bytes(), pk.as_bytes()).unwrap());
    }

    #[test]
    fn test_sign_verify_credential() {
        let kp = SigningKeyPair::generate();
        let payload = b"credential-payload-bytes";
        let sig = sign_credential(payload, &kp);
        assert!(verify_credential(payload, &sig, &kp.public_key()));
    }

    #[test]
    fn test_verify_credential_tampered_payload() {
        let kp = SigningKeyPair::generate();
        let sig = sign_credential(b"original-payload", &kp);
        assert!(!verify_credential(b"tampered-payload", &sig, &kp.public_key()));
    }
}
