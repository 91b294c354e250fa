//! Verify command - verify checkpoint bundles

use crate::config::Config;
use crate::CommonArgs;
use anyhow::{Context, Result};
use checkpoint_core::SignedCheckpoint;
use checkpoint_verifier_sdk::{decode_hex_array, CheckpointBundle, CheckpointClient, VerificationReport};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Args)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Bundle or scenario files to verify
    #[arg(required = true)]
    bundles: Vec<PathBuf>,

    /// Trusted validator set hash (0x-prefixed hex)
    #[arg(long)]
    expected_validator_set_hash: Option<String>,

    /// Reject bitmaps shorter than the committee needs
    #[arg(long)]
    strict_bitmap: bool,

    /// Also check every validator's G1 key against its G2 key
    #[arg(long)]
    check_keys: bool,

    /// Worker threads
    #[arg(long)]
    workers: Option<usize>,
}

pub fn run(config: &Config, args: VerifyArgs) -> Result<()> {
    let bundles = args
        .bundles
        .iter()
        .map(|path| {
            CheckpointBundle::load(path)
                .with_context(|| format!("Failed to load bundle: {:?}", path))
        })
        .collect::<Result<Vec<_>>>()?;

    let fallback_chain_id = bundles.first().map(|b| b.chain_id).unwrap_or(1);
    let mut verifier_config = config.verifier_config(fallback_chain_id);
    if args.strict_bitmap {
        verifier_config = verifier_config.with_strict_bitmap_length(true);
    }
    if let Some(hash) = &args.expected_validator_set_hash {
        verifier_config = verifier_config
            .with_expected_validator_set_hash(decode_hex_array("expected_validator_set_hash", hash)?);
    }
    let chain_id = verifier_config.chain_id;
    let client = CheckpointClient::new(verifier_config)
        .with_workers(args.workers.unwrap_or(config.workers));

    let mut checkpoints: Vec<SignedCheckpoint> = Vec::with_capacity(bundles.len());
    for (bundle, path) in bundles.iter().zip(&args.bundles) {
        anyhow::ensure!(
            bundle.chain_id == chain_id,
            "{:?} is for chain {}, verifying chain {}",
            path,
            bundle.chain_id,
            chain_id
        );
        let checkpoint = bundle
            .to_signed()
            .with_context(|| format!("Invalid bundle: {:?}", path))?;
        if args.check_keys {
            client
                .check_committee_keys(&checkpoint)
                .with_context(|| format!("Inconsistent committee in {:?}", path))?;
        }
        checkpoints.push(checkpoint);
    }

    if config.human() {
        println!(
            "{} Verifying {} checkpoint(s) for chain {} on {} worker(s)...",
            style("→").cyan().bold(),
            checkpoints.len(),
            chain_id,
            client.workers()
        );
        println!();
    }

    let pb = if config.human() {
        let pb = ProgressBar::new(checkpoints.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} checkpoints - {msg}")?
                .progress_chars("█▓░"),
        );
        pb.set_message("pairing...");
        Some(pb)
    } else {
        None
    };

    let results = client.verify_many_with_progress(&checkpoints, |done| {
        if let Some(pb) = &pb {
            pb.inc(done as u64);
        }
    });

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    let mut failures = 0usize;
    let mut rows = Vec::with_capacity(results.len());
    for (path, result) in args.bundles.iter().zip(&results) {
        match result {
            Ok(verified) => {
                let report = VerificationReport::from(verified);
                if config.human() {
                    println!(
                        "{} {:?}: block {} accepted, power {} / {}",
                        style("✓").green().bold(),
                        path,
                        report.block_number,
                        report.signed_voting_power,
                        report.total_voting_power
                    );
                }
                rows.push(serde_json::json!({ "path": path, "verified": true, "report": report }));
            }
            Err(err) => {
                failures += 1;
                if config.human() {
                    println!("{} {:?}: {}", style("✗").red().bold(), path, err);
                }
                rows.push(serde_json::json!({
                    "path": path,
                    "verified": false,
                    "kind": format!("{:?}", err.kind()),
                    "error": err.to_string(),
                }));
            }
        }
    }

    if config.json_output {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }

    anyhow::ensure!(
        failures == 0,
        "{} of {} checkpoint(s) failed verification",
        failures,
        results.len()
    );
    Ok(())
}
