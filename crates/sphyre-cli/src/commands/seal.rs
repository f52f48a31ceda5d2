//! `sphyre seal`: encrypt a message to a Kyber-768 public key.

use clap::Args;
use sphyre_crypto::{seal, KemPublicKey};
use std::path::PathBuf;

use super::MessageInput;
use crate::keyfile::KeyFile;

#[derive(Args, Debug)]
pub struct SealArgs {
    /// Hex-encoded recipient KEM public key.
    #[arg(long, conflicts_with = "recipient_key", required_unless_present = "recipient_key")]
    pub recipient: Option<String>,
    /// Recipient KEM key file.
    #[arg(long)]
    pub recipient_key: Option<PathBuf>,
    #[command(flatten)]
    pub input: MessageInput,
    /// Write the hex payload here instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &SealArgs) -> anyhow::Result<()> {
    let recipient = match (&args.recipient, &args.recipient_key) {
        (Some(hex), _) => KemPublicKey::from_hex(hex)?,
        (None, Some(path)) => KeyFile::load(path)?.kem_public_key()?,
        (None, None) => anyhow::bail!("either --recipient or --recipient-key is required"),
    };
    let plaintext = args.input.read()?;
    let payload = hex::encode(seal(&recipient, &plaintext)?.to_bytes());

    match &args.out {
        Some(path) => {
            std::fs::write(path, &payload)?;
            println!("Sealed {} bytes to {}", plaintext.len(), path.display());
        }
        None => println!("{}", payload),
    }
    Ok(())
}
