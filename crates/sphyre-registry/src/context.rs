use std::sync::Arc;

use sphyre_core::{Clock, EventLog, Identity, RegistryEvent, Timestamp};

use crate::access::AccessControl;
use crate::error::RegistryError;

/// State shared by the ledgers of one registry instance.
///
/// Each facade builds its own context, so instances never share roles,
/// events, or records.
#[derive(Clone)]
pub struct LedgerContext {
    pub access: Arc<AccessControl>,
    pub clock: Arc<dyn Clock>,
    pub events: Arc<EventLog>,
}

impl LedgerContext {
    /// Fresh context whose access directory is owned by `deployer`.
    pub fn new(deployer: Identity, clock: Arc<dyn Clock>) -> Result<Self, RegistryError> {
        let events = Arc::new(EventLog::new());
        let access = Arc::new(AccessControl::new(deployer, clock.clone(), events.clone())?);
        Ok(Self {
            access,
            clock,
            events,
        })
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub(crate) fn emit(&self, timestamp: Timestamp, event: RegistryEvent) -> u64 {
        self.events.append(timestamp, event)
    }
}
