//! Fixture command - generate a signed checkpoint scenario

use crate::config::Config;
use crate::CommonArgs;
use anyhow::{Context, Result};
use checkpoint_core::merkle::MerkleMode;
use checkpoint_verifier_sdk::{decode_hex, ScenarioBuilder};
use clap::Args;
use console::style;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct FixtureArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Where to write the scenario JSON
    #[arg(long)]
    out: PathBuf,

    /// Committee size
    #[arg(long, default_value_t = 12)]
    validators: usize,

    /// Voting power of each validator
    #[arg(long, default_value_t = 1000)]
    power: u128,

    /// Attestation bitmap in hex (default: every validator signs)
    #[arg(long)]
    bitmap: Option<String>,

    #[arg(long, default_value_t = 1)]
    block: u64,

    #[arg(long, default_value_t = 1)]
    epoch: u64,

    #[arg(long, default_value_t = 0)]
    round: u64,

    /// Seed for the committee's keys
    #[arg(long, default_value_t = 2024)]
    seed: u64,

    /// Event tree mode (positional, sorted)
    #[arg(long, default_value = "sorted")]
    mode: String,

    /// Sign for a different chain than the bundle declares
    #[arg(long)]
    signing_chain_id: Option<u64>,
}

pub fn run(config: &Config, args: FixtureArgs) -> Result<()> {
    let mode: MerkleMode = args
        .mode
        .parse()
        .map_err(|_| anyhow::anyhow!("Unknown merkle mode {:?}", args.mode))?;

    let mut builder = ScenarioBuilder::new()
        .chain_id(config.chain_id.unwrap_or(1))
        .domain(config.domain)
        .convention(config.convention)
        .committee_size(args.validators)
        .voting_power(args.power)
        .block_number(args.block)
        .epoch(args.epoch)
        .block_round(args.round)
        .seed(args.seed)
        .merkle_mode(mode)
        .signed_message(config.signed_message);
    if let Some(bitmap) = &args.bitmap {
        builder = builder.bitmap(decode_hex("bitmap", bitmap)?);
    }
    if let Some(chain_id) = args.signing_chain_id {
        builder = builder.signing_chain_id(chain_id);
    }

    let scenario = builder.build()?;
    let fixture = scenario.fixture();
    fs::write(&args.out, serde_json::to_string_pretty(&fixture)?)
        .with_context(|| format!("Failed to write fixture to {:?}", args.out))?;

    if config.json_output {
        println!(
            "{}",
            serde_json::json!({
                "path": args.out,
                "signers": scenario.signers.len(),
                "event_root": fixture.bundle.header.event_root,
            })
        );
    } else if !config.quiet {
        println!(
            "{} Wrote scenario to {:?}",
            style("✓").green().bold(),
            args.out
        );
        println!();
        println!(
            "  Signers: {} of {}",
            scenario.signers.len(),
            scenario.checkpoint.validator_set.len()
        );
        println!("  Bitmap: {}", fixture.bundle.attestation.bitmap);
        println!("  Event root: {}", fixture.bundle.header.event_root);
    }
    Ok(())
}
