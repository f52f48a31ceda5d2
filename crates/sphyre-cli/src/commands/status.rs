//! `sphyre status`: instantiate a registry from config and report its health.

use clap::Args;
use serde::Serialize;
use sphyre_core::SystemClock;
use sphyre_crypto::SigningKeyPair;
use sphyre_registry::{FactoryStatus, RegistryFactory, RegistryStatus};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::SphyreConfig;
use crate::keyfile::KeyFile;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Signing key file whose identity owns the registry (ephemeral otherwise).
    #[arg(short, long)]
    pub key: Option<PathBuf>,
    /// Registry name.
    #[arg(long, default_value = "local")]
    pub name: String,
    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct StatusReport {
    factory: FactoryStatus,
    registry: RegistryStatus,
}

pub fn run(args: &StatusArgs, config: &SphyreConfig) -> anyhow::Result<()> {
    let owner = match &args.key {
        Some(path) => KeyFile::load(path)?.signing_public_key()?.identity(),
        None => SigningKeyPair::generate().identity(),
    };

    let factory = RegistryFactory::new(config.network.clone(), Arc::new(SystemClock))?;
    let registry = factory.create_registry(&owner, &args.name, "sphyre status check")?;
    let report = StatusReport {
        factory: factory.status(),
        registry: registry.status(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let r = &report.registry;
    println!("Registry Status:");
    println!("  Address:     {}", r.registry_address);
    println!("  Accessible:  {}", r.registry_accessible);
    println!("  Network:     {} ({})", r.network_name, r.network_id);
    println!("  Version:     {}", r.version);
    println!("  Owner:       {}", r.owner);
    println!("  Events:      {}", r.event_count);
    println!("Factory:");
    println!("  Address:     {}", report.factory.factory_address);
    println!("  Registries:  {}", report.factory.registry_count);
    Ok(())
}
