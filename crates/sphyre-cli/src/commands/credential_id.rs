//! `sphyre credential-id`: derive the ledger key of a credential.

use clap::Args;
use sphyre_registry::credential_key;

#[derive(Args, Debug)]
pub struct CredentialIdArgs {
    /// Subject DID.
    #[arg(short, long)]
    pub subject: String,
    /// Credential content hash.
    #[arg(long)]
    pub hash: String,
}

pub fn run(args: &CredentialIdArgs) -> anyhow::Result<()> {
    if args.subject.is_empty() || args.hash.is_empty() {
        anyhow::bail!("subject and hash must not be empty");
    }
    println!("{}", credential_key(&args.subject, &args.hash));
    Ok(())
}
