//! Verify-event command - verify a checkpoint, then an event proof under it

use crate::config::Config;
use crate::CommonArgs;
use anyhow::{Context, Result};
use checkpoint_verifier_sdk::{CheckpointBundle, EventProofJson};
use clap::Args;
use console::style;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct VerifyEventArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Bundle or scenario file holding the checkpoint
    #[arg(long)]
    bundle: PathBuf,

    /// Proof file written by `prove`
    #[arg(long)]
    proof: PathBuf,
}

pub fn run(config: &Config, args: VerifyEventArgs) -> Result<()> {
    let bundle = CheckpointBundle::load(&args.bundle)
        .with_context(|| format!("Failed to load bundle: {:?}", args.bundle))?;
    let proof: EventProofJson = serde_json::from_str(
        &fs::read_to_string(&args.proof)
            .with_context(|| format!("Failed to read proof file: {:?}", args.proof))?,
    )?;

    let client = config.client(bundle.chain_id);
    let verified = client.verify_bundle(&bundle)?;
    let included = client.verify_event_json(&verified, &proof)?;

    if config.json_output {
        println!(
            "{}",
            serde_json::json!({
                "block_number": verified.header().block_number,
                "leaf": proof.leaf,
                "included": included,
            })
        );
    } else if !config.quiet {
        println!(
            "{} Checkpoint at block {} verified",
            style("✓").green().bold(),
            verified.header().block_number
        );
        if included {
            println!("{} Event {} is included", style("✓").green().bold(), proof.leaf);
        } else {
            println!("{} Event {} is not included", style("✗").red().bold(), proof.leaf);
        }
    }

    anyhow::ensure!(included, "Event proof does not match the checkpoint's event root");
    Ok(())
}
