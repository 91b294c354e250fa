//! Error types for checkpoint verification

extern crate alloc;
use alloc::string::String;
use thiserror::Error;

use crate::types::Digest;

/// Flat failure classification returned to callers of the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidDomainLength,
    InvalidSignaturePoint,
    InvalidPublicKeyPoint,
    MalformedBitmap,
    ValidatorSetHashMismatch,
    SignatureVerificationFailed,
    InsufficientVotingPower,
    MerkleProofMismatch,
    VotingPowerOverflow,
    Curve,
}

/// Top-level verification error
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Merkle error: {0}")]
    Merkle(#[from] MerkleError),

    #[error("BN254 error: {0}")]
    Bn254(#[from] Bn254Error),

    #[error("Malformed bitmap: {0}")]
    MalformedBitmap(String),

    #[error("Validator set hash mismatch: expected 0x{}, computed 0x{}", hex_of(.expected), hex_of(.computed))]
    ValidatorSetHashMismatch { expected: Digest, computed: Digest },

    #[error("Aggregate signature verification failed")]
    SignatureVerificationFailed,

    #[error("Insufficient voting power: signed {signed} of {total}")]
    InsufficientVotingPower { signed: u128, total: u128 },

    #[error("Voting power overflow")]
    VotingPowerOverflow,
}

impl VerifyError {
    /// Classify this error into the flat kind reported to callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VerifyError::Key(KeyError::InvalidDomainLength { .. }) => ErrorKind::InvalidDomainLength,
            VerifyError::Key(KeyError::InvalidSignaturePoint) => ErrorKind::InvalidSignaturePoint,
            VerifyError::Key(KeyError::InvalidPublicKeyPoint) => ErrorKind::InvalidPublicKeyPoint,
            VerifyError::Key(KeyError::Bn254(_) | KeyError::ExpansionTooLong { .. })
            | VerifyError::Bn254(_) => ErrorKind::Curve,
            VerifyError::Merkle(_) => ErrorKind::MerkleProofMismatch,
            VerifyError::MalformedBitmap(_) => ErrorKind::MalformedBitmap,
            VerifyError::ValidatorSetHashMismatch { .. } => ErrorKind::ValidatorSetHashMismatch,
            VerifyError::SignatureVerificationFailed => ErrorKind::SignatureVerificationFailed,
            VerifyError::InsufficientVotingPower { .. } => ErrorKind::InsufficientVotingPower,
            VerifyError::VotingPowerOverflow => ErrorKind::VotingPowerOverflow,
        }
    }
}

/// Key, signature and hash-to-curve errors
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Invalid domain length: {actual} bytes")]
    InvalidDomainLength { actual: usize },

    #[error("Cannot expand a message to {requested} bytes")]
    ExpansionTooLong { requested: usize },

    #[error("Invalid signature point")]
    InvalidSignaturePoint,

    #[error("Invalid public key point")]
    InvalidPublicKeyPoint,

    #[error("BN254 error: {0}")]
    Bn254(#[from] Bn254Error),
}

/// Merkle tree construction and proof errors
#[derive(Debug, Error)]
pub enum MerkleError {
    #[error("Merkle proof mismatch: {0}")]
    MerkleProofMismatch(String),

    #[error("Cannot build a tree without leaves")]
    EmptyTree,

    #[error("Leaf index {index} out of range for {len} leaves")]
    LeafIndexOutOfRange { index: usize, len: usize },
}

/// BN254 operation errors
#[derive(Debug, Error)]
pub enum Bn254Error {
    #[error("Syscall error: {0}")]
    SyscallError(String),

    #[error("Invalid G1 point")]
    InvalidG1,

    #[error("Invalid G2 point")]
    InvalidG2,

    #[error("Pairing check failed")]
    PairingFailed,
}

fn hex_of(digest: &Digest) -> String {
    crate::debug::bytes_to_hex(digest)
}
