//! BLS checkpoint verification over BN254
//!
//! A committee of validators signs checkpoints that commit to a batch of
//! events through a Merkle root. This crate verifies that enough voting
//! power signed a checkpoint and that an event is included under its root.
//!
//! # Example
//!
//! ```ignore
//! use checkpoint_core::{CheckpointVerifier, CurveContext, VerifierConfig};
//! use checkpoint_core::bitmap::BitmapConvention;
//! use checkpoint_core::config::{domain_from_label, DEFAULT_DOMAIN_LABEL};
//!
//! let ctx = CurveContext::init();
//! let config = VerifierConfig::new(
//!     1,
//!     domain_from_label(DEFAULT_DOMAIN_LABEL),
//!     BitmapConvention::NonSigners,
//! );
//! let verifier = CheckpointVerifier::new(ctx, config);
//!
//! let verified = verifier.verify(&signed_checkpoint)?;
//! let included = verifier.verify_event_inclusion(&verified, &leaf, &proof, mode)?;
//! ```

pub mod bitmap;
pub mod checkpoint;
pub mod codec;
pub mod config;
pub mod curve;
pub mod debug;
pub mod errors;
pub mod events;
pub mod field;
pub mod hash;
pub mod keys;
pub mod merkle;
pub mod ops;
pub mod transcript;
pub mod types;
pub mod verifier;

pub use checkpoint::{
    Attestation, CheckpointHeader, CheckpointMetadata, SignedCheckpoint, ValidatorEntry,
    ValidatorSet,
};
pub use config::{SignedMessage, VerifierConfig};
pub use curve::CurveContext;
pub use errors::{ErrorKind, VerifyError};
pub use verifier::{CheckpointVerifier, VerifiedCheckpoint};
