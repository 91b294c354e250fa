//! Keygen command - generate BLS keypairs

use crate::config::Config;
use crate::CommonArgs;
use anyhow::{Context, Result};
use checkpoint_core::keys::{new_keypair, new_keypair_os, KeyPair};
use checkpoint_core::CurveContext;
use checkpoint_verifier_sdk::KeyJson;
use clap::Args;
use console::style;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct KeygenArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Number of keypairs to generate
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Derive keys from a seed instead of the OS generator (test keys only)
    #[arg(long)]
    seed: Option<u64>,

    /// Write the keys to this file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

pub fn run(config: &Config, args: KeygenArgs) -> Result<()> {
    let ctx = CurveContext::init();
    let keys: Vec<KeyPair> = match args.seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..args.count).map(|_| new_keypair(ctx, &mut rng)).collect()
        }
        None => (0..args.count).map(|_| new_keypair_os(ctx)).collect(),
    };
    let json: Vec<KeyJson> = keys.iter().map(KeyJson::from).collect();
    let rendered = serde_json::to_string_pretty(&json)?;

    match &args.out {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write keys to {:?}", path))?;
            if config.human() {
                println!(
                    "{} Wrote {} keypair(s) to {:?}",
                    style("✓").green().bold(),
                    keys.len(),
                    path
                );
            }
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
