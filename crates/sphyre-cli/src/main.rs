//! Sphyre CLI: post-quantum key management and registry tooling.
//!
//! Subcommands: init, keygen, did, sign, verify, seal, open, token,
//! credential-id, status.

mod commands;
mod config;
mod keyfile;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::SphyreConfig;

/// Sphyre: credential registry and consent engine.
#[derive(Parser, Debug)]
#[command(name = "sphyre", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, default_value = "sphyre.toml")]
    config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init(commands::init::InitArgs),
    /// Generate a signing or KEM key pair.
    Keygen(commands::keygen::KeygenArgs),
    /// Show the DID of a signing key.
    Did(commands::did::DidArgs),
    /// Sign a message.
    Sign(commands::sign::SignArgs),
    /// Verify a signature.
    Verify(commands::verify::VerifyArgs),
    /// Encrypt a message to a KEM public key.
    Seal(commands::seal::SealArgs),
    /// Decrypt a sealed payload.
    Open(commands::open::OpenArgs),
    /// Issue or verify bearer tokens.
    Token(commands::token::TokenArgs),
    /// Derive the ledger key of a credential.
    CredentialId(commands::credential_id::CredentialIdArgs),
    /// Report the health of an in-memory registry built from config.
    Status(commands::status::StatusArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.command {
        Commands::Init(_) => SphyreConfig::default(),
        _ => SphyreConfig::load(&cli.config)?,
    };
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    init_tracing(&config);

    match &cli.command {
        Commands::Init(args) => commands::init::run(args, &cli.config),
        Commands::Keygen(args) => commands::keygen::run(args),
        Commands::Did(args) => commands::did::run(args),
        Commands::Sign(args) => commands::sign::run(args),
        Commands::Verify(args) => commands::verify::run(args),
        Commands::Seal(args) => commands::seal::run(args),
        Commands::Open(args) => commands::open::run(args),
        Commands::Token(args) => commands::token::run(args, &config),
        Commands::CredentialId(args) => commands::credential_id::run(args),
        Commands::Status(args) => commands::status::run(args, &config),
    }
}

/// Logs go to stderr so command output stays pipeable.
fn init_tracing(config: &SphyreConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if config.json_logs() {
        builder.json().init();
    } else {
        builder.init();
    }
}
