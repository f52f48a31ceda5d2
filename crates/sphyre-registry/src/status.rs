use serde::{Deserialize, Serialize};

/// Health and binding of one registry instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStatus {
    /// Hex address of the registry instance.
    pub registry_address: String,
    /// Whether every backing store can be read and written.
    pub registry_accessible: bool,
    /// Network / partition identifier the registry is bound to.
    pub network_id: u64,
    pub network_name: String,
    pub version: String,
    pub owner: String,
    pub event_count: usize,
}

/// Health of a registry factory and its shared identity backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryStatus {
    pub factory_address: String,
    pub accessible: bool,
    pub network_id: u64,
    pub registry_count: usize,
    pub did_count: usize,
}
