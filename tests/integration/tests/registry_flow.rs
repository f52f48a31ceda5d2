//! Integration test: registry creation, roles, credentials, and schemas
//! across the factory, facade, and ledgers.

use std::sync::Arc;

use sphyre_core::{Identity, RecordStatus, RegistryEvent, Role};
use sphyre_integration_tests::{Fixture, GENESIS};
use sphyre_registry::{credential_key, RegistryError};

// =========================================================================
// Factory-created registries
// =========================================================================

#[test]
fn test_factory_hands_over_control() {
    let fx = Fixture::new();
    let reg = &fx.registry;
    let factory_id = fx.factory.address();

    assert_eq!(reg.owner(), fx.owner.identity);
    assert_eq!(reg.access().members(Role::Verifier), vec![fx.owner.identity]);
    assert!(reg.access().members(Role::Issuer).is_empty());

    // The factory holds nothing after setup.
    assert!(matches!(
        reg.add_issuer(&factory_id, &factory_id),
        Err(RegistryError::Unauthorized { .. })
    ));

    let events: Vec<_> = reg.events().snapshot().into_iter().map(|e| e.event).collect();
    assert_eq!(
        events.last(),
        Some(&RegistryEvent::RoleRevoked {
            role: Role::Verifier,
            account: factory_id,
            actor: factory_id,
        })
    );
}

#[test]
fn test_tenants_do_not_share_state() {
    let fx = Fixture::new();
    let other_owner = fx.actor();
    let other = fx
        .factory
        .create_registry(&other_owner.identity, "other", "")
        .unwrap();

    let issuer = fx.issuer();
    fx.registry
        .register_credential(&issuer.identity, "did:sphyre:alice", "0xabc", "ipfs://cred")
        .unwrap();
    fx.registry
        .register_schema(&issuer.identity, "kyc", "ipfs://kyc-v1")
        .unwrap();

    assert!(!other.is_issuer(&issuer.identity));
    assert!(!other.is_credential_valid("did:sphyre:alice", "0xabc"));
    assert!(!other.is_schema_registered("kyc"));
    assert!(matches!(
        other.register_credential(&issuer.identity, "did:sphyre:alice", "0xabc", ""),
        Err(RegistryError::Unauthorized { .. })
    ));
    assert_eq!(fx.factory.count(), 2);
}

// =========================================================================
// Credential lifecycle
// =========================================================================

#[test]
fn test_credential_register_and_revoke() {
    let fx = Fixture::new();
    let issuer = fx.issuer();
    let subject = fx.actor();

    let id = fx
        .registry
        .register_credential(&issuer.identity, &subject.did, "0xfeed", "ipfs://meta")
        .unwrap();
    assert_eq!(id, credential_key(&subject.did, "0xfeed"));
    assert!(fx.registry.is_credential_valid(&subject.did, "0xfeed"));

    fx.clock.advance(60);
    fx.registry
        .revoke_credential(&fx.owner.identity, &subject.did, "0xfeed")
        .unwrap();

    let info = fx.registry.credential_info(&subject.did, "0xfeed").unwrap();
    assert_eq!(info.status(), RecordStatus::Revoked);
    assert_eq!(info.registered_at, GENESIS);
    assert_eq!(info.revoked_at, Some(GENESIS + 60));
    assert_eq!(info.revoked_by, Some(fx.owner.identity));
    assert!(!fx.registry.is_credential_valid(&subject.did, "0xfeed"));

    // Revocation is terminal.
    assert!(matches!(
        fx.registry
            .register_credential(&issuer.identity, &subject.did, "0xfeed", ""),
        Err(RegistryError::AlreadyRegistered(_))
    ));
    assert!(matches!(
        fx.registry
            .revoke_credential(&issuer.identity, &subject.did, "0xfeed"),
        Err(RegistryError::AlreadyRevoked(_))
    ));
}

#[test]
fn test_removed_issuer_keeps_records_but_loses_write() {
    let fx = Fixture::new();
    let issuer = fx.issuer();
    fx.registry
        .register_credential(&issuer.identity, "did:sphyre:bob", "h1", "")
        .unwrap();

    assert!(fx
        .registry
        .remove_issuer(&fx.owner.identity, &issuer.identity)
        .unwrap());
    assert!(fx.registry.is_credential_valid("did:sphyre:bob", "h1"));
    assert!(matches!(
        fx.registry
            .register_credential(&issuer.identity, "did:sphyre:bob", "h2", ""),
        Err(RegistryError::Unauthorized { .. })
    ));

    // The original registrant may still revoke its own record.
    fx.registry
        .revoke_credential(&issuer.identity, "did:sphyre:bob", "h1")
        .unwrap();
}

#[test]
fn test_outsider_cannot_revoke() {
    let fx = Fixture::new();
    let issuer = fx.issuer();
    let outsider = fx.actor();
    fx.registry
        .register_credential(&issuer.identity, "did:sphyre:carol", "h", "")
        .unwrap();

    assert!(matches!(
        fx.registry
            .revoke_credential(&outsider.identity, "did:sphyre:carol", "h"),
        Err(RegistryError::Unauthorized { .. })
    ));
    assert!(matches!(
        fx.registry
            .revoke_credential(&outsider.identity, "did:sphyre:carol", "missing"),
        Err(RegistryError::NotFound(_))
    ));
    assert!(fx.registry.is_credential_valid("did:sphyre:carol", "h"));
}

#[test]
fn test_concurrent_registration_single_winner() {
    let fx = Fixture::new();
    let issuers: Vec<_> = (0..8).map(|_| fx.issuer()).collect();
    let registry = Arc::clone(&fx.registry);
    let before = registry.events().len();

    let outcomes: Vec<Result<String, RegistryError>> = std::thread::scope(|s| {
        let handles: Vec<_> = issuers
            .iter()
            .map(|issuer| {
                let registry = &registry;
                let caller = issuer.identity;
                s.spawn(move || registry.register_credential(&caller, "did:sphyre:x", "h", "u"))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .filter(|o| o.is_err())
        .all(|o| matches!(o, Err(RegistryError::AlreadyRegistered(_)))));
    assert_eq!(registry.events().len(), before + 1);
}

// =========================================================================
// Schemas
// =========================================================================

#[test]
fn test_schema_versions_and_history() {
    let fx = Fixture::new();
    let issuer = fx.issuer();

    assert_eq!(
        fx.registry
            .register_schema(&issuer.identity, "kyc", "ipfs://v1")
            .unwrap(),
        1
    );
    fx.clock.advance(5);
    assert_eq!(
        fx.registry
            .register_schema(&issuer.identity, "kyc", "ipfs://v2")
            .unwrap(),
        2
    );
    fx.registry
        .register_schema(&issuer.identity, "employment", "ipfs://e1")
        .unwrap();

    assert_eq!(fx.registry.schema_uri("kyc").unwrap(), "ipfs://v2");
    assert_eq!(fx.registry.schema_count(), 2);
    assert_eq!(fx.registry.schema_id_at(0).unwrap(), "kyc");
    assert_eq!(fx.registry.schema_id_at(1).unwrap(), "employment");

    let history = fx.registry.schema_history("kyc");
    let uris: Vec<_> = history.iter().map(|r| r.schema_uri.as_str()).collect();
    assert_eq!(uris, vec!["ipfs://v1", "ipfs://v2"]);
    assert_eq!(history[1].timestamp, GENESIS + 5);
}

#[test]
fn test_schema_update_guarded() {
    let fx = Fixture::new();
    let author = fx.issuer();
    let rival = fx.issuer();
    fx.registry
        .register_schema(&author.identity, "kyc", "ipfs://v1")
        .unwrap();

    assert!(matches!(
        fx.registry
            .register_schema(&rival.identity, "kyc", "ipfs://evil"),
        Err(RegistryError::Unauthorized { .. })
    ));

    // A Verifier that is also an Issuer may curate.
    fx.registry
        .add_issuer(&fx.owner.identity, &fx.owner.identity)
        .unwrap();
    assert_eq!(
        fx.registry
            .register_schema(&fx.owner.identity, "kyc", "ipfs://v2")
            .unwrap(),
        2
    );
}

// =========================================================================
// Ownership and events
// =========================================================================

#[test]
fn test_ownership_transfer_and_metadata() {
    let fx = Fixture::new();
    let successor = fx.actor();

    fx.registry
        .transfer_ownership(&fx.owner.identity, &successor.identity)
        .unwrap();
    assert_eq!(fx.registry.owner(), successor.identity);
    assert!(matches!(
        fx.registry
            .update_metadata(&fx.owner.identity, "renamed", ""),
        Err(RegistryError::Unauthorized { .. })
    ));
    fx.registry
        .update_metadata(&successor.identity, "renamed", "new owner")
        .unwrap();
    assert_eq!(fx.registry.metadata().name, "renamed");

    assert!(matches!(
        fx.registry
            .transfer_ownership(&successor.identity, &Identity::ZERO),
        Err(RegistryError::Unauthorized { .. })
    ));
}

#[test]
fn test_event_sequences_are_dense() {
    let fx = Fixture::new();
    let issuer = fx.issuer();
    fx.registry
        .register_credential(&issuer.identity, "did:sphyre:d", "h", "")
        .unwrap();
    fx.registry
        .register_schema(&issuer.identity, "s", "u")
        .unwrap();

    let events = fx.registry.events().snapshot();
    for (i, e) in events.iter().enumerate() {
        assert_eq!(e.sequence, i as u64);
    }
    let tail = fx.registry.events().since(events.len() as u64 - 2);
    assert_eq!(tail.len(), 2);
    assert!(matches!(tail[0].event, RegistryEvent::CredentialRegistered { .. }));
    assert!(matches!(tail[1].event, RegistryEvent::SchemaRegistered { .. }));
}

#[test]
fn test_status_reports_binding() {
    let fx = Fixture::new();
    let status = fx.registry.status();
    assert!(status.registry_accessible);
    assert_eq!(status.network_id, 1);
    assert_eq!(status.version, "1.0.0");
    assert_eq!(status.owner, fx.owner.identity.to_hex());
    assert_eq!(status.registry_address, fx.registry.address().to_hex());

    let factory = fx.factory.status();
    assert_eq!(factory.registry_count, 1);
    assert_eq!(factory.did_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_registries_used_from_many_tasks() {
    let fx = Arc::new(Fixture::new());
    let issuer = fx.issuer();
    let caller = issuer.identity;

    let mut tasks = Vec::new();
    for i in 0..32 {
        let fx = Arc::clone(&fx);
        tasks.push(tokio::task::spawn_blocking(move || {
            fx.registry
                .register_credential(&caller, &format!("did:sphyre:{}", i), "h", "")
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(fx.registry.credentials().count(), 32);
}
