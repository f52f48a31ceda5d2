//! `sphyre keygen`: generate a signing or KEM key pair into a key file.

use clap::Args;
use sphyre_crypto::{KemKeyPair, SigningKeyPair};
use std::path::PathBuf;

use crate::keyfile::{KeyFile, KeyKind};

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Kind of key to generate.
    #[arg(long, value_enum, default_value = "signing")]
    pub kind: KeyKind,
    /// Output key file.
    #[arg(short, long)]
    pub out: PathBuf,
    /// Protect the secret key with this passphrase.
    #[arg(long)]
    pub passphrase: Option<String>,
    /// Overwrite an existing key file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &KeygenArgs) -> anyhow::Result<()> {
    let passphrase = args.passphrase.as_deref();
    let file = match args.kind {
        KeyKind::Signing => KeyFile::signing(&SigningKeyPair::generate(), passphrase)?,
        KeyKind::Kem => KeyFile::kem(&KemKeyPair::generate()?, passphrase)?,
    };
    file.save(&args.out, args.force)?;
    tracing::info!(kind = ?args.kind, path = %args.out.display(), encrypted = file.encrypted, "key generated");

    println!("Wrote {:?} key to {}", args.kind, args.out.display());
    if let Some(did) = &file.did {
        println!("  DID:       {}", did);
    }
    if let Some(identity) = &file.identity {
        println!("  Identity:  {}", identity);
    }
    println!("  Protected: {}", file.encrypted);
    Ok(())
}
