//! checkpoint-cli - Verify BLS-signed committee checkpoints
//!
//! This CLI provides commands for generating keys and signed fixtures,
//! verifying checkpoint bundles, and proving and checking event inclusion.

mod commands;
mod config;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{fixture, keygen, prove, verify, verify_event};
use console::style;

/// CLI for verifying BLS-signed checkpoints over BN254
#[derive(Parser)]
#[command(name = "checkpoint-cli")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Common options shared across commands
#[derive(Args, Clone)]
pub struct CommonArgs {
    /// Chain id the checkpoints are signed for (defaults to the bundle's)
    #[arg(long, env = "CHECKPOINT_CHAIN_ID")]
    pub chain_id: Option<u64>,

    /// Signing domain: an application label, or 32 bytes of 0x-prefixed hex
    #[arg(short, long, env = "CHECKPOINT_DOMAIN")]
    pub domain: Option<String>,

    /// Bitmap convention (signers, non-signers)
    #[arg(short, long, env = "CHECKPOINT_CONVENTION")]
    pub convention: Option<String>,

    /// Signed message (checkpoint, feed)
    #[arg(short, long, env = "CHECKPOINT_MESSAGE")]
    pub message: Option<String>,

    /// Output format (human, json)
    #[arg(long, default_value = "human")]
    pub output: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate BLS keypairs
    Keygen(keygen::KeygenArgs),

    /// Generate a signed checkpoint scenario
    Fixture(fixture::FixtureArgs),

    /// Verify one or more checkpoint bundles
    Verify(verify::VerifyArgs),

    /// Build an inclusion proof for an event leaf
    Prove(prove::ProveArgs),

    /// Verify a checkpoint, then an event proof against its root
    VerifyEvent(verify_event::VerifyEventArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Keygen(args) => {
            let config = config::Config::load(&args.common)?;
            keygen::run(&config, args)
        }
        Commands::Fixture(args) => {
            let config = config::Config::load(&args.common)?;
            fixture::run(&config, args)
        }
        Commands::Verify(args) => {
            let config = config::Config::load(&args.common)?;
            verify::run(&config, args)
        }
        Commands::Prove(args) => {
            let config = config::Config::load(&args.common)?;
            prove::run(&config, args)
        }
        Commands::VerifyEvent(args) => {
            let config = config::Config::load(&args.common)?;
            verify_event::run(&config, args)
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
