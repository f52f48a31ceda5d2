//! Integration test: a holder presents issuer-signed credentials, whole or
//! selectively disclosed, to a relying party gated by consent.

use serde_json::json;
use sphyre_core::{AccessLevel, NO_EXPIRY};
use sphyre_crypto::{hash_hex, sign, sign_credential, ClaimSet};
use sphyre_integration_tests::{Actor, Fixture, GENESIS};
use sphyre_registry::{ConsentGrant, Presentation, PresentedCredential, RegistryError};

const PURPOSE: &str = "account-opening";

struct Scene {
    fx: Fixture,
    issuer: Actor,
    holder: Actor,
    bank: Actor,
}

impl Scene {
    fn new() -> Self {
        let fx = Fixture::new();
        let issuer = fx.issuer();
        let holder = fx.actor();
        let bank = fx.actor();
        Self {
            fx,
            issuer,
            holder,
            bank,
        }
    }

    fn consent(&self) {
        self.fx
            .registry
            .grant_consent(
                &self.holder.identity,
                ConsentGrant {
                    subject_did: &self.holder.did,
                    party_did: &self.bank.did,
                    purpose: PURPOSE,
                    data_categories: "identity",
                    access_level: AccessLevel::OneTime,
                    expires_at: NO_EXPIRY,
                },
            )
            .unwrap();
    }

    /// Issue and anchor a full JSON credential for the holder.
    fn full_credential(&self) -> PresentedCredential {
        let payload = serde_json::to_vec(&json!({
            "type": ["VerifiableCredential", "KycBasic"],
            "credentialSubject": { "id": self.holder.did, "country": "BR", "over18": true }
        }))
        .unwrap();
        let signature = sign_credential(&payload, &self.issuer.keypair);
        self.fx
            .registry
            .register_credential(&self.issuer.identity, &self.holder.did, &hash_hex(&payload), "")
            .unwrap();
        PresentedCredential::full(&self.issuer.did, &payload, &signature)
    }

    /// Issue and anchor a commitment-root credential; return its claim set.
    fn committed_credential(&self) -> (ClaimSet, sphyre_crypto::Hash, sphyre_crypto::Signature) {
        let claims = ClaimSet::from_json(&json!({
            "name": "Alice Souza",
            "dob": "1990-01-15",
            "country": "BR",
            "kyc_level": 3
        }))
        .unwrap();
        let root = claims.root().unwrap();
        let signature = sign(&root, &self.issuer.keypair);
        self.fx
            .registry
            .register_credential(&self.issuer.identity, &self.holder.did, &hash_hex(&root), "")
            .unwrap();
        (claims, root, signature)
    }

    fn present(&self, credentials: Vec<PresentedCredential>) -> Presentation {
        Presentation::new(&self.holder.did, &self.bank.did, PURPOSE, GENESIS, credentials)
            .sign(&self.holder.keypair)
            .unwrap()
    }
}

#[test]
fn test_full_presentation_accepted() {
    let scene = Scene::new();
    scene.consent();
    let presentation = scene.present(vec![scene.full_credential()]);

    let result = scene.fx.registry.verify_presentation(&presentation).unwrap();
    assert!(result.is_valid, "{:?}", result.errors);
    assert!(result.holder_signature_valid);
    assert!(result.consent_valid);
    assert_eq!(result.credentials.len(), 1);
    assert_eq!(result.credentials[0].disclosed["country"], json!("BR"));
    assert!(!result.credentials[0].disclosed.contains_key("id"));
}

#[test]
fn test_selective_presentation_hides_claims() {
    let scene = Scene::new();
    scene.consent();
    let (claims, root, signature) = scene.committed_credential();
    let disclosure = claims.disclose(&["country", "kyc_level"]).unwrap();
    let presentation = scene.present(vec![PresentedCredential::selective(
        &scene.issuer.did,
        &root,
        disclosure,
        &signature,
    )]);

    let result = scene.fx.registry.verify_presentation(&presentation).unwrap();
    assert!(result.is_valid, "{:?}", result.errors);
    let disclosed = &result.credentials[0].disclosed;
    assert_eq!(disclosed.len(), 2);
    assert_eq!(disclosed["kyc_level"], json!(3));
    assert!(!disclosed.contains_key("name"));
    assert!(!disclosed.contains_key("dob"));
}

#[test]
fn test_altered_disclosure_rejected() {
    let scene = Scene::new();
    scene.consent();
    let (claims, root, signature) = scene.committed_credential();
    let mut disclosure = claims.disclose(&["country"]).unwrap();
    disclosure.revealed.get_mut("country").unwrap().value = json!("US");
    let presentation = scene.present(vec![PresentedCredential::selective(
        &scene.issuer.did,
        &root,
        disclosure,
        &signature,
    )]);

    let result = scene.fx.registry.verify_presentation(&presentation).unwrap();
    assert!(!result.is_valid);
    let check = &result.credentials[0];
    assert!(check.signature_valid);
    assert!(check.ledger_valid);
    assert!(!check.disclosure_valid);
    assert_eq!(result.errors.len(), 1);
}

#[test]
fn test_consent_gate() {
    let scene = Scene::new();
    let presentation = scene.present(vec![scene.full_credential()]);

    let result = scene.fx.registry.verify_presentation(&presentation).unwrap();
    assert!(!result.is_valid);
    assert!(!result.consent_valid);
    assert!(result.credentials[0].is_valid());

    scene.consent();
    assert!(scene.fx.registry.verify_presentation(&presentation).unwrap().is_valid);

    scene
        .fx
        .registry
        .revoke_consent(&scene.holder.identity, &scene.holder.did, &scene.bank.did, PURPOSE)
        .unwrap();
    assert!(!scene.fx.registry.verify_presentation(&presentation).unwrap().consent_valid);
}

#[test]
fn test_revoked_credential_rejected() {
    let scene = Scene::new();
    scene.consent();
    let credential = scene.full_credential();
    let hash = credential.proof.credential_hash().unwrap();
    scene
        .fx
        .registry
        .revoke_credential(&scene.issuer.identity, &scene.holder.did, &hash)
        .unwrap();

    let result = scene
        .fx
        .registry
        .verify_presentation(&scene.present(vec![credential]))
        .unwrap();
    assert!(!result.is_valid);
    assert!(result.credentials[0].signature_valid);
    assert!(!result.credentials[0].ledger_valid);
}

#[test]
fn test_tampered_presentation_signature() {
    let scene = Scene::new();
    scene.consent();
    let mut presentation = scene.present(vec![scene.full_credential()]);
    presentation.created_at += 1;

    let result = scene.fx.registry.verify_presentation(&presentation).unwrap();
    assert!(!result.is_valid);
    assert!(!result.holder_signature_valid);
    assert!(result.credentials[0].is_valid());

    // The holder's credential re-presented by someone else.
    let stranger = scene.fx.actor();
    let stolen = presentation.credentials[0].clone();
    let result = scene
        .fx
        .registry
        .verify_presentation(
            &Presentation::new(&stranger.did, &scene.bank.did, PURPOSE, GENESIS, vec![stolen])
                .sign(&stranger.keypair)
                .unwrap(),
        )
        .unwrap();
    assert!(!result.is_valid);
    assert!(result.holder_signature_valid);
    assert!(result.credentials[0].signature_valid);
    assert!(!result.credentials[0].ledger_valid);
}

#[test]
fn test_malformed_presentations_are_errors() {
    let scene = Scene::new();
    let unsigned = Presentation::new(
        &scene.holder.did,
        &scene.bank.did,
        PURPOSE,
        GENESIS,
        vec![scene.full_credential()],
    );
    assert!(matches!(
        scene.fx.registry.verify_presentation(&unsigned),
        Err(RegistryError::Crypto(_))
    ));

    let mut no_purpose = scene.present(Vec::new());
    no_purpose.purpose.clear();
    assert!(matches!(
        scene.fx.registry.verify_presentation(&no_purpose),
        Err(RegistryError::InvalidInput(_))
    ));

    let unknown = Presentation::new(
        "did:sphyre:11111111111111111111111111111111",
        &scene.bank.did,
        PURPOSE,
        GENESIS,
        Vec::new(),
    )
    .sign(&scene.holder.keypair)
    .unwrap();
    assert!(matches!(
        scene.fx.registry.verify_presentation(&unknown),
        Err(RegistryError::Identity(_))
    ));
}
