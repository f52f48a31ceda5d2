//! Integration test: an issuer signs a credential with Dilithium2, anchors
//! its hash in the registry, seals it to the holder with Kyber, and a
//! verifier checks everything through the registry's identity backend.

use sphyre_core::ManualClock;
use sphyre_crypto::{
    hash_hex, issue_token, open, seal, sign_credential, verify_token, CryptoError, KemKeyPair,
    SealedPayload, TokenClaims,
};
use sphyre_identity::{IdentityError, IdentityResolver};
use sphyre_integration_tests::{Fixture, GENESIS};
use sphyre_registry::RegistryError;

fn credential_json(subject_did: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "type": ["VerifiableCredential", "KycBasic"],
        "credentialSubject": {
            "id": subject_did,
            "country": "BR",
            "over18": true
        }
    }))
    .unwrap()
}

#[test]
fn test_issue_anchor_deliver_verify() {
    let fx = Fixture::new();
    let issuer = fx.issuer();
    let holder = fx.actor();
    let holder_kem = KemKeyPair::generate().unwrap();

    // Issuer signs and anchors.
    let payload = credential_json(&holder.did);
    let signature = sign_credential(&payload, &issuer.keypair);
    let credential_hash = hash_hex(&payload);
    fx.registry
        .register_credential(&issuer.identity, &holder.did, &credential_hash, "sealed://holder")
        .unwrap();

    // Delivered confidentially to the holder.
    let sealed = seal(holder_kem.public_key(), &payload).unwrap();
    let wire = sealed.to_bytes();
    let received = open(&SealedPayload::from_bytes(&wire).unwrap(), &holder_kem).unwrap();
    assert_eq!(received, payload);

    // Verifier: signature via the registry's resolver, then ledger status.
    assert!(fx
        .registry
        .verify_credential_signature(&issuer.did, &received, signature.as_bytes())
        .unwrap());
    assert!(fx
        .registry
        .is_credential_valid(&holder.did, &hash_hex(&received)));
}

#[test]
fn test_tampered_credential_rejected() {
    let fx = Fixture::new();
    let issuer = fx.issuer();
    let holder = fx.actor();

    let payload = credential_json(&holder.did);
    let signature = sign_credential(&payload, &issuer.keypair);
    fx.registry
        .register_credential(&issuer.identity, &holder.did, &hash_hex(&payload), "")
        .unwrap();

    let mut forged = payload.clone();
    let last = forged.len() - 2;
    forged[last] ^= 0x01;

    assert!(!fx
        .registry
        .verify_credential_signature(&issuer.did, &forged, signature.as_bytes())
        .unwrap());
    assert!(!fx
        .registry
        .is_credential_valid(&holder.did, &hash_hex(&forged)));
}

#[test]
fn test_signature_from_wrong_issuer() {
    let fx = Fixture::new();
    let issuer = fx.issuer();
    let impostor = fx.actor();
    let payload = credential_json("did:sphyre:holder");

    let signature = sign_credential(&payload, &impostor.keypair);
    assert!(!fx
        .registry
        .verify_credential_signature(&issuer.did, &payload, signature.as_bytes())
        .unwrap());
}

#[test]
fn test_malformed_inputs_are_errors() {
    let fx = Fixture::new();
    let issuer = fx.issuer();
    let payload = credential_json("did:sphyre:holder");

    assert!(matches!(
        fx.registry
            .verify_credential_signature(&issuer.did, &payload, &[0u8; 12]),
        Err(RegistryError::Crypto(CryptoError::InvalidSignatureLength { .. }))
    ));

    let signature = sign_credential(&payload, &issuer.keypair);
    assert!(matches!(
        fx.registry.verify_credential_signature(
            "did:sphyre:11111111111111111111111111111111",
            &payload,
            signature.as_bytes()
        ),
        Err(RegistryError::Identity(_))
    ));
    assert!(matches!(
        fx.registry.resolve_did("did:web:example.com"),
        Err(RegistryError::Identity(IdentityError::DidNotFound(_)))
    ));
}

#[test]
fn test_revoked_credential_still_verifies_signature() {
    let fx = Fixture::new();
    let issuer = fx.issuer();
    let holder = fx.actor();
    let payload = credential_json(&holder.did);
    let signature = sign_credential(&payload, &issuer.keypair);
    let h = hash_hex(&payload);

    fx.registry
        .register_credential(&issuer.identity, &holder.did, &h, "")
        .unwrap();
    fx.registry
        .revoke_credential(&issuer.identity, &holder.did, &h)
        .unwrap();

    // Cryptographically intact, but the ledger says no.
    assert!(fx
        .registry
        .verify_credential_signature(&issuer.did, &payload, signature.as_bytes())
        .unwrap());
    assert!(!fx.registry.is_credential_valid(&holder.did, &h));
}

#[test]
fn test_sealed_payload_for_someone_else() {
    let alice = KemKeyPair::generate().unwrap();
    let mallory = KemKeyPair::generate().unwrap();
    let sealed = seal(alice.public_key(), b"consent receipt").unwrap();

    assert!(open(&sealed, &mallory).is_err());
    assert_eq!(open(&sealed, &alice).unwrap(), b"consent receipt");
}

#[test]
fn test_bearer_token_for_registered_did() {
    let fx = Fixture::new();
    let issuer = fx.issuer();
    let holder = fx.actor();
    let clock = ManualClock::new(GENESIS);

    let claims =
        TokenClaims::new(&issuer.did, &holder.did, GENESIS, 300).with_audience("verifier-portal");
    let token = issue_token(&claims, &issuer.keypair).unwrap();

    let issuer_key = fx.registry.resolver().public_key(&issuer.did).unwrap();
    let verified = verify_token(&token, &issuer_key, &clock).unwrap();
    assert_eq!(verified.sub, holder.did);
    assert_eq!(verified.aud.as_deref(), Some("verifier-portal"));

    clock.set(GENESIS + 300);
    assert!(verify_token(&token, &issuer_key, &clock).is_ok());
    clock.set(GENESIS + 301);
    assert!(matches!(
        verify_token(&token, &issuer_key, &clock),
        Err(CryptoError::TokenExpired { .. })
    ));

    let holder_key = fx.registry.resolver().public_key(&holder.did).unwrap();
    clock.set(GENESIS);
    assert!(matches!(
        verify_token(&token, &holder_key, &clock),
        Err(CryptoError::TokenSignatureInvalid)
    ));
}
