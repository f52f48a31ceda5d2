//! JSON key files holding one signing or KEM key pair.
//!
//! The secret is hex encoded, either in the clear or as an Argon2-protected
//! blob (`salt ‖ nonce ‖ ciphertext`) when a passphrase was given.

use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sphyre_crypto::kdf::{decrypt_with_password, encrypt_with_password};
use sphyre_crypto::{KemKeyPair, KemPublicKey, SigningKeyPair, SigningPublicKey};
use sphyre_identity::did_from_public_key;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// Dilithium2 signing key.
    Signing,
    /// Kyber-768 encapsulation key.
    Kem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyFile {
    pub kind: KeyKind,
    pub public_key: String,
    /// DID and account identity; signing keys only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    pub encrypted: bool,
    pub secret: String,
    pub created_at: String,
}

impl KeyFile {
    pub fn signing(keypair: &SigningKeyPair, passphrase: Option<&str>) -> anyhow::Result<Self> {
        let public = keypair.public_key();
        let seed = Zeroizing::new(keypair.seed_bytes());
        let (encrypted, secret) = protect(seed.as_slice(), passphrase)?;
        Ok(Self {
            kind: KeyKind::Signing,
            public_key: public.to_hex(),
            did: Some(did_from_public_key(&public)),
            identity: Some(public.identity().to_hex()),
            encrypted,
            secret,
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    pub fn kem(keypair: &KemKeyPair, passphrase: Option<&str>) -> anyhow::Result<Self> {
        let (encrypted, secret) = protect(keypair.secret_bytes(), passphrase)?;
        Ok(Self {
            kind: KeyKind::Kem,
            public_key: keypair.public_key().to_hex(),
            did: None,
            identity: None,
            encrypted,
            secret,
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading key file {}", path.display()))?;
        let file: KeyFile = serde_json::from_str(&contents)
            .with_context(|| format!("parsing key file {}", path.display()))?;
        Ok(file)
    }

    /// Write the key file, refusing to replace an existing one unless `force`.
    pub fn save(&self, path: &Path, force: bool) -> anyhow::Result<()> {
        if path.exists() && !force {
            anyhow::bail!("key file already exists at {}", path.display());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn signing_public_key(&self) -> anyhow::Result<SigningPublicKey> {
        self.expect_kind(KeyKind::Signing)?;
        Ok(SigningPublicKey::from_hex(&self.public_key)?)
    }

    pub fn kem_public_key(&self) -> anyhow::Result<KemPublicKey> {
        self.expect_kind(KeyKind::Kem)?;
        Ok(KemPublicKey::from_hex(&self.public_key)?)
    }

    pub fn signing_keypair(&self, passphrase: Option<&str>) -> anyhow::Result<SigningKeyPair> {
        self.expect_kind(KeyKind::Signing)?;
        let seed = self.secret_bytes(passphrase)?;
        let keypair = SigningKeyPair::from_bytes(&seed)?;
        if keypair.public_key().to_hex() != self.public_key {
            anyhow::bail!("secret key does not match the recorded public key");
        }
        Ok(keypair)
    }

    pub fn kem_keypair(&self, passphrase: Option<&str>) -> anyhow::Result<KemKeyPair> {
        let public = self.kem_public_key()?;
        let secret = self.secret_bytes(passphrase)?;
        Ok(KemKeyPair::from_parts(public.as_bytes(), &secret)?)
    }

    fn secret_bytes(&self, passphrase: Option<&str>) -> anyhow::Result<Zeroizing<Vec<u8>>> {
        let raw = Zeroizing::new(hex::decode(&self.secret).context("secret is not valid hex")?);
        if !self.encrypted {
            return Ok(raw);
        }
        let passphrase = passphrase.context("key file is passphrase-protected")?;
        let plain = decrypt_with_password(passphrase.as_bytes(), &raw)
            .context("wrong passphrase or corrupted key file")?;
        Ok(Zeroizing::new(plain))
    }

    fn expect_kind(&self, kind: KeyKind) -> anyhow::Result<()> {
        if self.kind != kind {
            anyhow::bail!("expected a {:?} key file, found {:?}", kind, self.kind);
        }
        Ok(())
    }
}

fn protect(secret: &[u8], passphrase: Option<&str>) -> anyhow::Result<(bool, String)> {
    match passphrase {
        Some(p) if !p.is_empty() => {
            let blob = encrypt_with_password(p.as_bytes(), secret)?;
            Ok((true, hex::encode(blob)))
        }
        _ => Ok((false, hex::encode(secret))),
    }
}
