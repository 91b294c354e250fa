//! Error types for the checkpoint verifier SDK

use checkpoint_core::errors::{KeyError, MerkleError};
use checkpoint_core::VerifyError;
use thiserror::Error;

/// Errors that can occur while loading, building or verifying checkpoints
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Verification failed: {0}")]
    Verify(#[from] VerifyError),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Merkle error: {0}")]
    Merkle(#[from] MerkleError),

    #[error("Invalid hex in {field}: {source}")]
    Hex {
        field: &'static str,
        #[source]
        source: hex::FromHexError,
    },

    #[error("Invalid length for {field}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid bundle: {0}")]
    InvalidBundle(String),

    #[error("Validator {index} has G1 and G2 keys from different secrets")]
    InconsistentValidatorKeys { index: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SdkError>;
