use std::sync::{Arc, PoisonError, RwLock};

use sphyre_core::{Clock, EventLog, Identity, RegistryConfig, RegistryEvent};
use sphyre_identity::{DidDirectory, IdentityResolver, LocalResolver};

use crate::error::{require_non_empty, RegistryError};
use crate::facade::{RegistryFacade, RegistryMetadata};
use crate::status::FactoryStatus;

const FACTORY_ADDRESS_CONTEXT: &str = "sphyre 2024 registry-factory address v1";
const REGISTRY_ADDRESS_CONTEXT: &str = "sphyre 2024 registry address v1";

/// Creates isolated registry instances that share one identity backend.
///
/// The DID directory and its resolver are created here once and handed to
/// every registry; credential, schema, and consent state stays per instance.
pub struct RegistryFactory {
    address: Identity,
    config: RegistryConfig,
    clock: Arc<dyn Clock>,
    directory: Arc<DidDirectory>,
    resolver: Arc<dyn IdentityResolver>,
    registries: RwLock<Vec<Arc<RegistryFacade>>>,
    events: EventLog,
}

impl RegistryFactory {
    pub fn new(config: RegistryConfig, clock: Arc<dyn Clock>) -> Result<Self, RegistryError> {
        config.validate()?;
        let address = Identity::derive(
            FACTORY_ADDRESS_CONTEXT,
            &[
                &config.network_id.to_le_bytes(),
                config.network_name.as_bytes(),
            ],
        );
        let directory = Arc::new(DidDirectory::new(clock.clone()));
        let resolver: Arc<dyn IdentityResolver> = Arc::new(LocalResolver::new(directory.clone()));

        tracing::info!(
            factory = %address,
            network_id = config.network_id,
            network = %config.network_name,
            "registry factory ready"
        );
        Ok(Self {
            address,
            config,
            clock,
            directory,
            resolver,
            registries: RwLock::new(Vec::new()),
            events: EventLog::new(),
        })
    }

    pub fn address(&self) -> Identity {
        self.address
    }

    /// Create a registry owned by `caller`.
    ///
    /// The factory deploys it, makes `caller` a Verifier and the owner, then
    /// drops its own Verifier role so it keeps no authority over the tenant.
    pub fn create_registry(
        &self,
        caller: &Identity,
        name: &str,
        description: &str,
    ) -> Result<Arc<RegistryFacade>, RegistryError> {
        if caller.is_zero() {
            return Err(RegistryError::InvalidInput(
                "caller must not be the null identity".into(),
            ));
        }
        if *caller == self.address {
            return Err(RegistryError::InvalidInput(
                "caller must not be the factory itself".into(),
            ));
        }
        require_non_empty("name", name)?;

        let mut registries = self.registries.write().unwrap_or_else(PoisonError::into_inner);
        let index = registries.len() as u64;
        let address = Identity::derive(
            REGISTRY_ADDRESS_CONTEXT,
            &[self.address.as_bytes(), &index.to_le_bytes()],
        );

        let facade = RegistryFacade::new(
            self.address,
            address,
            RegistryMetadata {
                name: name.to_string(),
                description: description.to_string(),
            },
            self.config.clone(),
            self.clock.clone(),
            self.resolver.clone(),
        )?;
        facade.add_verifier(&self.address, caller)?;
        facade.transfer_ownership(&self.address, caller)?;
        facade.remove_verifier(&self.address, &self.address)?;

        let facade = Arc::new(facade);
        registries.push(facade.clone());
        self.events.append(
            self.clock.now(),
            RegistryEvent::RegistryCreated {
                registry: address,
                owner: *caller,
                name: name.to_string(),
            },
        );
        drop(registries);

        tracing::info!(registry = %address, owner = %caller, name, index, "registry created");
        Ok(facade)
    }

    pub fn count(&self) -> usize {
        self.registries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Registry at `index` in creation order.
    pub fn handle_at(&self, index: usize) -> Result<Arc<RegistryFacade>, RegistryError> {
        let registries = self.registries.read().unwrap_or_else(PoisonError::into_inner);
        registries
            .get(index)
            .cloned()
            .ok_or(RegistryError::OutOfBounds {
                index,
                len: registries.len(),
            })
    }

    /// All registries in creation order.
    pub fn all_handles(&self) -> Vec<Arc<RegistryFacade>> {
        self.registries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Look a registry up by its address.
    pub fn find(&self, address: &Identity) -> Option<Arc<RegistryFacade>> {
        self.registries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|r| r.address() == *address)
            .cloned()
    }

    /// The shared DID directory.
    pub fn directory(&self) -> &Arc<DidDirectory> {
        &self.directory
    }

    /// The shared identity-resolution backend.
    pub fn resolver(&self) -> &Arc<dyn IdentityResolver> {
        &self.resolver
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn status(&self) -> FactoryStatus {
        FactoryStatus {
            factory_address: self.address.to_hex(),
            accessible: self.events.is_healthy() && !self.registries.is_poisoned(),
            network_id: self.config.network_id,
            registry_count: self.count(),
            did_count: self.directory.count(),
        }
    }
}
