use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Configuration shared by every registry a factory creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Network / partition identifier reported by status checks.
    #[serde(default = "default_network_id")]
    pub network_id: u64,
    /// Human-readable network name.
    #[serde(default = "default_network_name")]
    pub network_name: String,
    /// Versioned identifier stamped on every registry instance.
    #[serde(default = "default_registry_version")]
    pub registry_version: String,
}

fn default_network_id() -> u64 {
    1
}
fn default_network_name() -> String {
    "sphyre-local".into()
}
fn default_registry_version() -> String {
    "1.0.0".into()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            network_id: default_network_id(),
            network_name: default_network_name(),
            registry_version: default_registry_version(),
        }
    }
}

impl RegistryConfig {
    /// Reject configurations no registry can be built from.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.registry_version.trim().is_empty() {
            return Err(CoreError::Config("registry_version must not be empty".into()));
        }
        if self.network_name.trim().is_empty() {
            return Err(CoreError::Config("network_name must not be empty".into()));
        }
        Ok(())
    }
}
