//! `sphyre sign`: sign a message with a Dilithium2 key.

use clap::Args;
use sphyre_crypto::sign_credential;
use std::path::PathBuf;

use super::MessageInput;
use crate::keyfile::KeyFile;

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Signing key file.
    #[arg(short, long)]
    pub key: PathBuf,
    /// Passphrase for a protected key file.
    #[arg(long)]
    pub passphrase: Option<String>,
    #[command(flatten)]
    pub input: MessageInput,
}

pub fn run(args: &SignArgs) -> anyhow::Result<()> {
    let keypair = KeyFile::load(&args.key)?.signing_keypair(args.passphrase.as_deref())?;
    let message = args.input.read()?;
    let signature = sign_credential(&message, &keypair);
    tracing::debug!(signer = %keypair.identity(), len = message.len(), "message signed");
    println!("{}", signature.to_hex());
    Ok(())
}
