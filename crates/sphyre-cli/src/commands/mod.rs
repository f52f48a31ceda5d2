pub mod credential_id;
pub mod did;
pub mod init;
pub mod keygen;
pub mod open;
pub mod seal;
pub mod sign;
pub mod status;
pub mod token;
pub mod verify;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use sphyre_crypto::SigningPublicKey;

use crate::keyfile::KeyFile;

/// Message given inline or read from a file.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct MessageInput {
    /// Message text.
    #[arg(short, long)]
    pub message: Option<String>,
    /// Read the message from a file.
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

impl MessageInput {
    pub fn read(&self) -> anyhow::Result<Vec<u8>> {
        match (&self.message, &self.file) {
            (Some(m), _) => Ok(m.as_bytes().to_vec()),
            (None, Some(path)) => read_file(path),
            (None, None) => anyhow::bail!("either --message or --file is required"),
        }
    }
}

/// Signing public key given as hex or taken from a key file.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct PublicKeyInput {
    /// Hex-encoded Dilithium2 public key.
    #[arg(long)]
    pub public_key: Option<String>,
    /// Key file to take the public key from.
    #[arg(long)]
    pub key: Option<PathBuf>,
}

impl PublicKeyInput {
    pub fn resolve(&self) -> anyhow::Result<SigningPublicKey> {
        match (&self.public_key, &self.key) {
            (Some(hex), _) => Ok(SigningPublicKey::from_hex(hex)?),
            (None, Some(path)) => KeyFile::load(path)?.signing_public_key(),
            (None, None) => anyhow::bail!("either --public-key or --key is required"),
        }
    }
}

pub fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

/// Print `bytes` as UTF-8 when possible, hex otherwise.
pub fn print_bytes(bytes: &[u8]) {
    match std::str::from_utf8(bytes) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", hex::encode(bytes)),
    }
}
