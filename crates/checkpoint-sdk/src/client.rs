//! Off-chain client for verifying checkpoints and event proofs

use std::thread;

use checkpoint_core::merkle::{MerkleMode, MerkleProof};
use checkpoint_core::types::Digest;
use checkpoint_core::{
    CheckpointVerifier, CurveContext, SignedCheckpoint, VerifiedCheckpoint, VerifierConfig,
    VerifyError,
};

use crate::error::{Result, SdkError};
use crate::types::{CheckpointBundle, EventProofJson};

/// Default number of worker threads for `verify_many`
pub const DEFAULT_WORKERS: usize = 4;

/// Client for verifying checkpoints
///
/// # Example
///
/// ```ignore
/// use checkpoint_verifier_sdk::CheckpointClient;
///
/// let client = CheckpointClient::new(config).with_workers(8);
/// let verified = client.verify(&checkpoint)?;
/// let included = client.verify_event(&verified, &leaf, &proof, MerkleMode::Sorted)?;
/// ```
#[derive(Debug, Clone)]
pub struct CheckpointClient {
    ctx: &'static CurveContext,
    config: VerifierConfig,
    workers: usize,
}

impl CheckpointClient {
    /// Create a client; the curve context is built on first use.
    pub fn new(config: VerifierConfig) -> Self {
        Self {
            ctx: CurveContext::init(),
            config,
            workers: DEFAULT_WORKERS,
        }
    }

    /// Set the number of worker threads used by `verify_many`
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn verifier(&self) -> CheckpointVerifier<'static> {
        CheckpointVerifier::new(self.ctx, self.config.clone())
    }

    /// Verify one checkpoint
    pub fn verify(&self, checkpoint: &SignedCheckpoint) -> Result<VerifiedCheckpoint> {
        Ok(self.verifier().verify(checkpoint)?)
    }

    /// Verify a bundle loaded from disk.
    ///
    /// The bundle's declared chain id must match the configured one.
    pub fn verify_bundle(&self, bundle: &CheckpointBundle) -> Result<VerifiedCheckpoint> {
        if bundle.chain_id != self.config.chain_id {
            return Err(SdkError::InvalidBundle(format!(
                "bundle is for chain {}, client verifies chain {}",
                bundle.chain_id, self.config.chain_id
            )));
        }
        self.verify(&bundle.to_signed()?)
    }

    /// Verify many checkpoints across worker threads.
    ///
    /// Results come back in input order.
    pub fn verify_many(
        &self,
        checkpoints: &[SignedCheckpoint],
    ) -> Vec<std::result::Result<VerifiedCheckpoint, VerifyError>> {
        self.verify_many_with_progress(checkpoints, |_| {})
    }

    /// Like `verify_many`, calling `on_chunk(n)` as each chunk of `n`
    /// checkpoints finishes.
    pub fn verify_many_with_progress<F>(
        &self,
        checkpoints: &[SignedCheckpoint],
        on_chunk: F,
    ) -> Vec<std::result::Result<VerifiedCheckpoint, VerifyError>>
    where
        F: Fn(usize) + Sync,
    {
        if checkpoints.is_empty() {
            return Vec::new();
        }

        let chunk_size = checkpoints.len().div_ceil(self.workers);
        let verifier = self.verifier();
        log::debug!(
            "verifying {} checkpoints in chunks of {}",
            checkpoints.len(),
            chunk_size
        );

        thread::scope(|scope| {
            let handles: Vec<_> = checkpoints
                .chunks(chunk_size)
                .map(|chunk| {
                    let verifier = &verifier;
                    let on_chunk = &on_chunk;
                    scope.spawn(move || {
                        let results = verifier.verify_batch(chunk);
                        on_chunk(chunk.len());
                        results
                    })
                })
                .collect();

            handles
                .into_iter()
                .zip(checkpoints.chunks(chunk_size))
                .flat_map(|(handle, chunk)| match handle.join() {
                    Ok(results) => results,
                    // A panicked worker re-verifies its chunk on this thread.
                    Err(_) => {
                        log::warn!("worker panicked, verifying chunk inline");
                        chunk.iter().map(|c| verifier.verify(c)).collect()
                    }
                })
                .collect()
        })
    }

    /// Check a leaf against a verified checkpoint's event root
    pub fn verify_event(
        &self,
        verified: &VerifiedCheckpoint,
        leaf: &Digest,
        proof: &MerkleProof,
        mode: MerkleMode,
    ) -> Result<bool> {
        Ok(self
            .verifier()
            .verify_event_inclusion(verified, leaf, proof, mode)?)
    }

    /// Check an event proof file against a verified checkpoint.
    ///
    /// A proof whose recorded root differs from the checkpoint's is rejected
    /// before hashing.
    pub fn verify_event_json(
        &self,
        verified: &VerifiedCheckpoint,
        proof: &EventProofJson,
    ) -> Result<bool> {
        if &proof.root()? != verified.event_root() {
            log::debug!("event proof was built for a different root");
            return Ok(false);
        }
        self.verify_event(verified, &proof.leaf()?, &proof.proof()?, proof.mode()?)
    }

    /// Reject committees where a validator's G1 and G2 keys disagree.
    pub fn check_committee_keys(&self, checkpoint: &SignedCheckpoint) -> Result<()> {
        match checkpoint.validator_set.find_inconsistent_key(self.ctx)? {
            Some(index) => Err(SdkError::InconsistentValidatorKeys { index }),
            None => Ok(()),
        }
    }
}
