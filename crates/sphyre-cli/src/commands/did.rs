//! `sphyre did`: show the DID and identity of a signing key.

use clap::Args;
use sphyre_core::{Clock, SystemClock};
use sphyre_identity::{did_from_public_key, DidDocument};
use std::path::PathBuf;

use crate::keyfile::KeyFile;

#[derive(Args, Debug)]
pub struct DidArgs {
    /// Signing key file.
    #[arg(short, long)]
    pub key: PathBuf,
    /// Print the full DID document as JSON.
    #[arg(long)]
    pub document: bool,
}

pub fn run(args: &DidArgs) -> anyhow::Result<()> {
    let public_key = KeyFile::load(&args.key)?.signing_public_key()?;
    let did = did_from_public_key(&public_key);

    if args.document {
        let doc = DidDocument::new(did, &public_key, SystemClock.now());
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("DID:       {}", did);
        println!("Identity:  {}", public_key.identity());
    }
    Ok(())
}
