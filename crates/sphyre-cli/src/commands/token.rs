//! `sphyre token`: issue and verify Dilithium2 bearer tokens.

use clap::{Args, Subcommand};
use sphyre_core::{Clock, SystemClock};
use sphyre_crypto::{issue_token, verify_token, TokenClaims};
use sphyre_identity::did_from_public_key;
use std::path::PathBuf;

use super::PublicKeyInput;
use crate::config::SphyreConfig;
use crate::keyfile::KeyFile;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Issue a token signed by a key file.
    Issue(IssueArgs),
    /// Verify a token and print its claims.
    Verify(VerifyTokenArgs),
}

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Signing key file.
    #[arg(short, long)]
    pub key: PathBuf,
    /// Passphrase for a protected key file.
    #[arg(long)]
    pub passphrase: Option<String>,
    /// Subject DID.
    #[arg(short, long)]
    pub subject: String,
    /// Intended audience.
    #[arg(short, long)]
    pub audience: Option<String>,
    /// Lifetime in seconds (defaults to `tokens.ttl_secs`).
    #[arg(long)]
    pub ttl: Option<u64>,
}

#[derive(Args, Debug)]
pub struct VerifyTokenArgs {
    /// The encoded token.
    pub token: String,
    #[command(flatten)]
    pub issuer: PublicKeyInput,
}

pub fn run(args: &TokenArgs, config: &SphyreConfig) -> anyhow::Result<()> {
    match &args.command {
        TokenCommand::Issue(a) => issue(a, config),
        TokenCommand::Verify(a) => verify(a),
    }
}

fn issue(args: &IssueArgs, config: &SphyreConfig) -> anyhow::Result<()> {
    let keypair = KeyFile::load(&args.key)?.signing_keypair(args.passphrase.as_deref())?;
    let issuer = config
        .tokens
        .issuer
        .clone()
        .unwrap_or_else(|| did_from_public_key(&keypair.public_key()));
    let ttl = args.ttl.unwrap_or(config.tokens.ttl_secs);

    let mut claims = TokenClaims::new(&issuer, &args.subject, SystemClock.now(), ttl);
    if let Some(aud) = &args.audience {
        claims = claims.with_audience(aud.clone());
    }
    let token = issue_token(&claims, &keypair)?;
    tracing::info!(iss = %claims.iss, sub = %claims.sub, jti = %claims.jti, exp = claims.exp, "token issued");
    println!("{}", token);
    Ok(())
}

fn verify(args: &VerifyTokenArgs) -> anyhow::Result<()> {
    let public_key = args.issuer.resolve()?;
    let claims = verify_token(args.token.trim(), &public_key, &SystemClock)?;
    println!("{}", serde_json::to_string_pretty(&claims)?);
    Ok(())
}
