/// BLAKE3 hash (32 bytes).
pub type Hash = [u8; 32];

const CREDENTIAL_ID_CONTEXT: &str = "sphyre 2024 credential-id v1";
const CONSENT_KEY_CONTEXT: &str = "sphyre 2024 consent-key v1";

/// Hash arbitrary data using BLAKE3.
pub fn hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Hash arbitrary data and encode the digest as hex.
pub fn hash_hex(data: &[u8]) -> String {
    hex::encode(hash(data))
}

/// Domain-separated hash over a list of fields.
///
/// Each field is prefixed with its length, so `("ab", "c")` and `("a", "bc")`
/// never collide.
pub fn hash_fields(context: &str, fields: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    for field in fields {
        hasher.update(&(field.len() as u64).to_le_bytes());
        hasher.update(field);
    }
    *hasher.finalize().as_bytes()
}

/// Ledger key of a credential: `H(subject_did, credential_hash)`.
pub fn credential_id(subject_did: &str, credential_hash: &str) -> Hash {
    hash_fields(
        CREDENTIAL_ID_CONTEXT,
        &[subject_did.as_bytes(), credential_hash.as_bytes()],
    )
}

/// Ledger key of a consent: `H(subject_did, party_did, purpose)`.
pub fn consent_key(subject_did: &str, party_did: &str, purpose: &str) -> Hash {
    hash_fields(
        CONSENT_KEY_CONTEXT,
        &[
            subject_did.as_bytes(),
            party_did.as_bytes(),
            purpose.as_bytes(),
        ],
    )
}
