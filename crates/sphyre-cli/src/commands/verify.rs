//! `sphyre verify`: verify a Dilithium2 signature.

use clap::Args;
use sphyre_crypto::{verify_bytes, Signature};

use super::{MessageInput, PublicKeyInput};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub signer: PublicKeyInput,
    /// Hex-encoded signature.
    #[arg(short, long)]
    pub signature: String,
    #[command(flatten)]
    pub input: MessageInput,
}

pub fn run(args: &VerifyArgs) -> anyhow::Result<()> {
    let public_key = args.signer.resolve()?;
    let signature = Signature::from_hex(&args.signature)?;
    let message = args.input.read()?;

    if verify_bytes(&message, signature.as_bytes(), public_key.as_bytes())? {
        println!("Signature valid (signer {})", public_key.identity());
        Ok(())
    } else {
        anyhow::bail!("signature is not valid for this message and key")
    }
}
