//! `sphyre open`: decrypt a payload sealed to one of our KEM keys.

use anyhow::Context;
use clap::Args;
use sphyre_crypto::{open, SealedPayload};
use std::path::PathBuf;

use super::{print_bytes, read_file};
use crate::keyfile::KeyFile;

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// KEM key file.
    #[arg(short, long)]
    pub key: PathBuf,
    /// Passphrase for a protected key file.
    #[arg(long)]
    pub passphrase: Option<String>,
    /// Hex-encoded sealed payload.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub payload: Option<String>,
    /// Read the hex payload from a file.
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    /// Write the plaintext here instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &OpenArgs) -> anyhow::Result<()> {
    let keypair = KeyFile::load(&args.key)?.kem_keypair(args.passphrase.as_deref())?;
    let encoded = match (&args.payload, &args.file) {
        (Some(p), _) => p.clone(),
        (None, Some(path)) => String::from_utf8(read_file(path)?).context("payload is not text")?,
        (None, None) => anyhow::bail!("either --payload or --file is required"),
    };
    let bytes = hex::decode(encoded.trim()).context("payload is not valid hex")?;
    let plaintext = open(&SealedPayload::from_bytes(&bytes)?, &keypair)?;

    match &args.out {
        Some(path) => {
            std::fs::write(path, &plaintext)?;
            println!("Opened {} bytes to {}", plaintext.len(), path.display());
        }
        None => print_bytes(&plaintext),
    }
    Ok(())
}
