//! `sphyre init`: write a default configuration file.

use clap::Args;
use std::path::Path;

use crate::config::SphyreConfig;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitArgs, config_path: &Path) -> anyhow::Result<()> {
    if config_path.exists() && !args.force {
        anyhow::bail!("configuration file already exists at {}", config_path.display());
    }

    SphyreConfig::default().save(config_path)?;
    tracing::info!(path = %config_path.display(), "wrote default config");
    println!("Initialized Sphyre configuration at {}", config_path.display());
    println!("Run 'sphyre keygen --out signing.json' to create a signing key.");
    Ok(())
}
