//! Sphyre Crypto: post-quantum key encapsulation and signatures, authenticated
//! encryption, hashing, and bearer tokens.
//!
//! Two primitives are composed but kept independent:
//! - Kyber-768 key encapsulation feeding a BLAKE3 key derivation and
//!   ChaCha20-Poly1305 ([`kem`], [`encryption`]).
//! - Dilithium2 signatures over credential payloads and tokens
//!   ([`keys`], [`signing`], [`token`]).
//!
//! [`disclosure`] adds salted claim commitments so holders can reveal part
//! of a signed credential.

pub mod disclosure;
pub mod encryption;
pub mod error;
pub mod hashing;
pub mod kdf;
pub mod kem;
pub mod keys;
pub mod signing;
pub mod token;

pub use disclosure::{ClaimSet, Claims, Disclosure, SaltedClaim};
pub use encryption::{open, seal, SealedPayload};
pub use error::CryptoError;
pub use hashing::{consent_key, credential_id, hash, hash_hex, Hash};
pub use kem::{decapsulate, encapsulate, KemKeyPair, KemPublicKey, SharedSecret};
pub use keys::{SigningKeyPair, SigningPublicKey};
pub use signing::{sign, sign_credential, verify, verify_bytes, verify_credential, Signature};
pub use token::{decode_unverified, issue_token, verify_token, TokenClaims, TokenHeader};
