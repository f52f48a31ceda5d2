//! Integration test: consent grant, expiry, revocation, and re-grant
//! driven through a factory-created registry on a manual clock.

use sphyre_core::{AccessLevel, RecordStatus, RegistryEvent, NO_EXPIRY};
use sphyre_integration_tests::{Fixture, GENESIS};
use sphyre_registry::{consent_key, ConsentGrant, RegistryError};

const PURPOSE: &str = "loan-underwriting";

fn grant<'a>(subject: &'a str, party: &'a str, expires_at: u64) -> ConsentGrant<'a> {
    ConsentGrant {
        subject_did: subject,
        party_did: party,
        purpose: PURPOSE,
        data_categories: "income,employment",
        access_level: AccessLevel::ReadOnly,
        expires_at,
    }
}

#[test]
fn test_grant_and_expiry_boundary() {
    let fx = Fixture::new();
    let subject = fx.actor();
    let party = fx.actor();
    let expires = GENESIS + 3_600;

    let key = fx
        .registry
        .grant_consent(&subject.identity, grant(&subject.did, &party.did, expires))
        .unwrap();
    assert_eq!(key, consent_key(&subject.did, &party.did, PURPOSE));
    assert!(fx.registry.is_consent_valid(&subject.did, &party.did, PURPOSE));

    fx.clock.set(expires);
    assert!(fx.registry.is_consent_valid(&subject.did, &party.did, PURPOSE));

    fx.clock.set(expires + 1);
    assert!(!fx.registry.is_consent_valid(&subject.did, &party.did, PURPOSE));

    // Expired but still on record, and still active in the lifecycle sense.
    let info = fx.registry.consent_info(&subject.did, &party.did, PURPOSE).unwrap();
    assert_eq!(info.status(), RecordStatus::Active);
    assert!(!info.is_valid_at(expires + 1));
}

#[test]
fn test_no_expiry_never_lapses() {
    let fx = Fixture::new();
    let subject = fx.actor();
    let party = fx.actor();
    fx.registry
        .grant_consent(&subject.identity, grant(&subject.did, &party.did, NO_EXPIRY))
        .unwrap();

    fx.clock.advance(100 * 365 * 24 * 3_600);
    assert!(fx.registry.is_consent_valid(&subject.did, &party.did, PURPOSE));
}

#[test]
fn test_past_expiry_accepted_but_invalid() {
    let fx = Fixture::new();
    let subject = fx.actor();
    let party = fx.actor();
    fx.registry
        .grant_consent(&subject.identity, grant(&subject.did, &party.did, GENESIS - 1))
        .unwrap();
    assert!(!fx.registry.is_consent_valid(&subject.did, &party.did, PURPOSE));
}

#[test]
fn test_revoke_then_regrant_reactivates() {
    let fx = Fixture::new();
    let subject = fx.actor();
    let party = fx.actor();

    fx.registry
        .grant_consent(&subject.identity, grant(&subject.did, &party.did, NO_EXPIRY))
        .unwrap();
    fx.clock.advance(10);
    fx.registry
        .revoke_consent(&subject.identity, &subject.did, &party.did, PURPOSE)
        .unwrap();

    let revoked = fx.registry.consent_info(&subject.did, &party.did, PURPOSE).unwrap();
    assert_eq!(revoked.status(), RecordStatus::Revoked);
    assert_eq!(revoked.revoked_at, Some(GENESIS + 10));
    assert!(!fx.registry.is_consent_valid(&subject.did, &party.did, PURPOSE));

    assert!(matches!(
        fx.registry
            .revoke_consent(&subject.identity, &subject.did, &party.did, PURPOSE),
        Err(RegistryError::AlreadyRevoked(_))
    ));

    fx.clock.advance(10);
    let mut renewed = grant(&subject.did, &party.did, GENESIS + 1_000);
    renewed.access_level = AccessLevel::OneTime;
    fx.registry.grant_consent(&subject.identity, renewed).unwrap();

    let info = fx.registry.consent_info(&subject.did, &party.did, PURPOSE).unwrap();
    assert_eq!(info.status(), RecordStatus::Active);
    assert_eq!(info.access_level, AccessLevel::OneTime);
    assert_eq!(info.registered_at, GENESIS + 20);
    assert!(info.revoked_at.is_none());
    assert!(fx.registry.is_consent_valid(&subject.did, &party.did, PURPOSE));
    assert_eq!(fx.registry.consents().count(), 1);

    let grants: Vec<bool> = fx
        .registry
        .events()
        .snapshot()
        .into_iter()
        .filter_map(|e| match e.event {
            RegistryEvent::ConsentGranted { reactivated, .. } => Some(reactivated),
            _ => None,
        })
        .collect();
    assert_eq!(grants, vec![false, true]);
}

#[test]
fn test_regrant_overwrites_terms() {
    let fx = Fixture::new();
    let subject = fx.actor();
    let party = fx.actor();

    fx.registry
        .grant_consent(&subject.identity, grant(&subject.did, &party.did, NO_EXPIRY))
        .unwrap();
    let mut narrower = grant(&subject.did, &party.did, GENESIS + 60);
    narrower.data_categories = "income";
    fx.registry.grant_consent(&subject.identity, narrower).unwrap();

    let info = fx.registry.consent_info(&subject.did, &party.did, PURPOSE).unwrap();
    assert_eq!(info.data_categories, "income");
    assert_eq!(info.expires_at, GENESIS + 60);
}

#[test]
fn test_consents_are_keyed_by_triple() {
    let fx = Fixture::new();
    let subject = fx.actor();
    let bank = fx.actor();
    let insurer = fx.actor();

    fx.registry
        .grant_consent(&subject.identity, grant(&subject.did, &bank.did, NO_EXPIRY))
        .unwrap();

    assert!(fx.registry.is_consent_valid(&subject.did, &bank.did, PURPOSE));
    assert!(!fx.registry.is_consent_valid(&subject.did, &insurer.did, PURPOSE));
    assert!(!fx.registry.is_consent_valid(&subject.did, &bank.did, "marketing"));
    assert!(matches!(
        fx.registry
            .revoke_consent(&subject.identity, &subject.did, &insurer.did, PURPOSE),
        Err(RegistryError::NotFound(_))
    ));
}

#[test]
fn test_empty_fields_rejected() {
    let fx = Fixture::new();
    let subject = fx.actor();
    assert!(matches!(
        fx.registry
            .grant_consent(&subject.identity, grant(&subject.did, "", NO_EXPIRY)),
        Err(RegistryError::InvalidInput(_))
    ));
    assert!(matches!(
        fx.registry
            .revoke_consent(&subject.identity, "", "did:sphyre:p", PURPOSE),
        Err(RegistryError::InvalidInput(_))
    ));
    assert_eq!(fx.registry.consents().count(), 0);
}

#[test]
fn test_concurrent_grant_and_revoke_stay_consistent() {
    let fx = Fixture::new();
    let subject = fx.actor();
    let party = fx.actor();
    fx.registry
        .grant_consent(&subject.identity, grant(&subject.did, &party.did, NO_EXPIRY))
        .unwrap();

    std::thread::scope(|s| {
        for i in 0..8 {
            let fx = &fx;
            let subject = &subject;
            let party = &party;
            s.spawn(move || {
                if i % 2 == 0 {
                    let _ = fx.registry.revoke_consent(
                        &subject.identity,
                        &subject.did,
                        &party.did,
                        PURPOSE,
                    );
                } else {
                    let _ = fx
                        .registry
                        .grant_consent(&subject.identity, grant(&subject.did, &party.did, NO_EXPIRY));
                }
            });
        }
    });

    let info = fx.registry.consent_info(&subject.did, &party.did, PURPOSE).unwrap();
    assert_eq!(info.is_revoked, info.revoked_at.is_some());
    assert_eq!(
        fx.registry.is_consent_valid(&subject.did, &party.did, PURPOSE),
        !info.is_revoked
    );
}
