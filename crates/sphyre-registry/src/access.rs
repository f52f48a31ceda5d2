use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use sphyre_core::{Clock, EventLog, Identity, RegistryEvent, Role};

use crate::error::RegistryError;

/// Role membership and single-owner administration for one registry.
///
/// Roles are a set of `(role, account)` pairs. Only Verifiers manage roles;
/// only the owner transfers ownership.
pub struct AccessControl {
    roles: RwLock<HashSet<(Role, Identity)>>,
    owner: RwLock<Identity>,
    clock: Arc<dyn Clock>,
    events: Arc<EventLog>,
}

impl AccessControl {
    /// Create the directory. The deployer becomes owner and Verifier.
    pub fn new(
        deployer: Identity,
        clock: Arc<dyn Clock>,
        events: Arc<EventLog>,
    ) -> Result<Self, RegistryError> {
        if deployer.is_zero() {
            return Err(RegistryError::InvalidInput(
                "deployer must not be the null identity".into(),
            ));
        }
        let now = clock.now();
        let mut roles = HashSet::new();
        roles.insert((Role::Verifier, deployer));
        events.append(
            now,
            RegistryEvent::RoleGranted {
                role: Role::Verifier,
                account: deployer,
                actor: deployer,
            },
        );
        events.append(
            now,
            RegistryEvent::OwnershipTransferred {
                previous: Identity::ZERO,
                new_owner: deployer,
            },
        );
        Ok(Self {
            roles: RwLock::new(roles),
            owner: RwLock::new(deployer),
            clock,
            events,
        })
    }

    pub fn has_role(&self, role: Role, account: &Identity) -> bool {
        self.roles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(role, *account))
    }

    /// Fail with `Unauthorized` unless `caller` holds `role`.
    pub fn require_role(
        &self,
        caller: &Identity,
        role: Role,
        action: &str,
    ) -> Result<(), RegistryError> {
        if self.has_role(role, caller) {
            return Ok(());
        }
        tracing::warn!(caller = %caller, required = %role, action, "role check failed");
        Err(RegistryError::unauthorized(caller, action))
    }

    /// Grant `role` to `account`. Returns `false` if it was already held.
    pub fn grant_role(
        &self,
        caller: &Identity,
        role: Role,
        account: &Identity,
    ) -> Result<bool, RegistryError> {
        if account.is_zero() {
            return Err(RegistryError::InvalidInput(
                "cannot grant a role to the null identity".into(),
            ));
        }
        let mut roles = self.roles.write().unwrap_or_else(PoisonError::into_inner);
        if !roles.contains(&(Role::Verifier, *caller)) {
            tracing::warn!(caller = %caller, role = %role, account = %account, "grant denied");
            return Err(RegistryError::unauthorized(caller, "grant roles"));
        }
        if !roles.insert((role, *account)) {
            tracing::debug!(role = %role, account = %account, "role already held");
            return Ok(false);
        }
        self.events.append(
            self.clock.now(),
            RegistryEvent::RoleGranted {
                role,
                account: *account,
                actor: *caller,
            },
        );
        tracing::info!(role = %role, account = %account, actor = %caller, "role granted");
        Ok(true)
    }

    /// Revoke `role` from `account`. Returns `false` if it was not held.
    pub fn revoke_role(
        &self,
        caller: &Identity,
        role: Role,
        account: &Identity,
    ) -> Result<bool, RegistryError> {
        let mut roles = self.roles.write().unwrap_or_else(PoisonError::into_inner);
        if !roles.contains(&(Role::Verifier, *caller)) {
            tracing::warn!(caller = %caller, role = %role, account = %account, "revoke denied");
            return Err(RegistryError::unauthorized(caller, "revoke roles"));
        }
        if !roles.remove(&(role, *account)) {
            tracing::debug!(role = %role, account = %account, "role not held");
            return Ok(false);
        }
        self.events.append(
            self.clock.now(),
            RegistryEvent::RoleRevoked {
                role,
                account: *account,
                actor: *caller,
            },
        );
        tracing::info!(role = %role, account = %account, actor = %caller, "role revoked");
        Ok(true)
    }

    pub fn owner(&self) -> Identity {
        *self.owner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail with `Unauthorized` unless `caller` is the owner.
    pub fn require_owner(&self, caller: &Identity, action: &str) -> Result<(), RegistryError> {
        if self.owner() == *caller {
            return Ok(());
        }
        tracing::warn!(caller = %caller, action, "owner check failed");
        Err(RegistryError::unauthorized(caller, action))
    }

    /// Hand ownership to `new_owner`. Only the current owner may call this.
    pub fn transfer_ownership(
        &self,
        caller: &Identity,
        new_owner: &Identity,
    ) -> Result<(), RegistryError> {
        let mut owner = self.owner.write().unwrap_or_else(PoisonError::into_inner);
        if *owner != *caller {
            tracing::warn!(caller = %caller, "ownership transfer denied");
            return Err(RegistryError::unauthorized(caller, "transfer ownership"));
        }
        if new_owner.is_zero() {
            return Err(RegistryError::unauthorized(
                caller,
                "transfer ownership to the null identity",
            ));
        }
        let previous = *owner;
        *owner = *new_owner;
        self.events.append(
            self.clock.now(),
            RegistryEvent::OwnershipTransferred {
                previous,
                new_owner: *new_owner,
            },
        );
        tracing::info!(previous = %previous, new_owner = %new_owner, "ownership transferred");
        Ok(())
    }

    /// Members of `role`, sorted.
    pub fn members(&self, role: Role) -> Vec<Identity> {
        let roles = self.roles.read().unwrap_or_else(PoisonError::into_inner);
        let mut members: Vec<Identity> = roles
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, account)| *account)
            .collect();
        members.sort();
        members
    }

    /// False if a writer panicked while holding one of the locks.
    pub fn is_healthy(&self) -> bool {
        !self.roles.is_poisoned() && !self.owner.is_poisoned()
    }
}
