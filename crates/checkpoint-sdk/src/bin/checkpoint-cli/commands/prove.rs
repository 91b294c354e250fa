//! Prove command - build an inclusion proof for one event leaf

use crate::config::Config;
use crate::CommonArgs;
use anyhow::{Context, Result};
use checkpoint_core::merkle::MerkleTree;
use checkpoint_verifier_sdk::{EventProofJson, LeavesFile};
use clap::Args;
use console::style;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct ProveArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Leaves file, or a scenario file (its `leaves` and `merkle_mode` are used)
    #[arg(long)]
    leaves: PathBuf,

    /// Index of the leaf, in the order the file lists them
    #[arg(long)]
    index: usize,

    /// Write the proof to this file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

pub fn run(config: &Config, args: ProveArgs) -> Result<()> {
    let content = fs::read_to_string(&args.leaves)
        .with_context(|| format!("Failed to read leaves file: {:?}", args.leaves))?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    let file: LeavesFile = match (value.get("merkle_mode"), value.get("leaves")) {
        (Some(mode), Some(leaves)) => LeavesFile {
            mode: serde_json::from_value(mode.clone())?,
            leaves: serde_json::from_value(leaves.clone())?,
        },
        _ => serde_json::from_value(value)?,
    };

    let mode = file.mode()?;
    let leaves = file.leaves()?;
    let tree = MerkleTree::build(&leaves, mode)?;
    let leaf = leaves
        .get(args.index)
        .with_context(|| format!("Leaf {} out of range ({} leaves)", args.index, leaves.len()))?;
    let proof = tree.prove(args.index)?;
    let json = EventProofJson::new(mode, &tree.root(), leaf, &proof);
    let rendered = serde_json::to_string_pretty(&json)?;

    match &args.out {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write proof to {:?}", path))?;
            if config.human() {
                println!(
                    "{} Wrote proof for leaf {} ({} siblings) to {:?}",
                    style("✓").green().bold(),
                    args.index,
                    proof.siblings.len(),
                    path
                );
                println!("  Root: {}", json.root);
            }
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
