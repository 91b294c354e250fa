//! Rust SDK for verifying BLS-signed committee checkpoints
//!
//! This crate wraps `checkpoint_core` with hex JSON bundle files, a
//! multi-threaded client and deterministic scenario generation.
//!
//! # Example
//!
//! ```ignore
//! use checkpoint_verifier_sdk::{CheckpointBundle, CheckpointClient};
//! use checkpoint_core::VerifierConfig;
//!
//! let bundle = CheckpointBundle::load(Path::new("checkpoint.json"))?;
//! let client = CheckpointClient::new(VerifierConfig::new(
//!     bundle.chain_id,
//!     domain,
//!     BitmapConvention::NonSigners,
//! ));
//!
//! let verified = client.verify_bundle(&bundle)?;
//! println!("signed power: {}", verified.signed_voting_power());
//! ```

mod client;
mod error;
pub mod fixtures;
mod types;

pub use client::{CheckpointClient, DEFAULT_WORKERS};
pub use error::{Result, SdkError};
pub use fixtures::{Scenario, ScenarioBuilder};
pub use types::*;
