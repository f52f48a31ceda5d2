//! Fixtures shared by the cross-crate tests.

use std::sync::Arc;

use sphyre_core::{Identity, ManualClock, RegistryConfig};
use sphyre_crypto::SigningKeyPair;
use sphyre_registry::{RegistryFacade, RegistryFactory};

/// Start time every fixture clock is set to.
pub const GENESIS: u64 = 1_700_000_000;

/// A key holder with its DID registered in the factory's directory.
pub struct Actor {
    pub keypair: SigningKeyPair,
    pub identity: Identity,
    pub did: String,
}

/// A factory on a manual clock with one registry owned by `owner`.
pub struct Fixture {
    pub clock: Arc<ManualClock>,
    pub factory: RegistryFactory,
    pub registry: Arc<RegistryFacade>,
    pub owner: Actor,
}

impl Fixture {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(GENESIS));
        let factory = RegistryFactory::new(RegistryConfig::default(), clock.clone())
            .expect("default config is valid");
        let owner = actor(&factory);
        let registry = factory
            .create_registry(&owner.identity, "fixture", "integration registry")
            .expect("registry creation");
        tracing::debug!(
            registry = %registry.address(),
            owner = %owner.identity,
            genesis = GENESIS,
            "fixture registry ready"
        );
        Self {
            clock,
            factory,
            registry,
            owner,
        }
    }

    pub fn actor(&self) -> Actor {
        actor(&self.factory)
    }

    /// A fresh actor holding the Issuer role on the fixture registry.
    pub fn issuer(&self) -> Actor {
        let issuer = self.actor();
        self.registry
            .add_issuer(&self.owner.identity, &issuer.identity)
            .expect("owner is a verifier");
        issuer
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a key pair and register its DID with the factory's directory.
pub fn actor(factory: &RegistryFactory) -> Actor {
    let keypair = SigningKeyPair::generate();
    let did = factory
        .directory()
        .register(&keypair.public_key())
        .expect("fresh key registers");
    tracing::trace!(did = %did, identity = %keypair.identity(), "fixture actor registered");
    Actor {
        identity: keypair.identity(),
        keypair,
        did,
    }
}
