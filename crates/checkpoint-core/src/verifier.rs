//! Checkpoint verification
//!
//! One verification call walks a fixed sequence of stages and stops at the
//! first failure; there is no partial acceptance:
//!
//! 1. INIT: hash the committee (and compare with a trusted hash if configured)
//! 2. DIGEST: compute the signed message (checkpoint or feed digest)
//! 3. RESOLVE_SIGNERS: bitmap -> signer subset, aggregate key and power
//! 4. VERIFY_SIGNATURE: one pairing check of the aggregate signature
//! 5. CHECK_QUORUM: signed power against the configured share of total power
//! 6. ACCEPTED
//!
//! A successful call returns a [`VerifiedCheckpoint`], the only way to reach
//! [`CheckpointVerifier::verify_event_inclusion`].

extern crate alloc;
use alloc::format;
use alloc::vec::Vec;

use core::fmt;

use crate::bitmap::{check_bitmap_shape, resolve_signers, SignerSet};
use crate::checkpoint::{CheckpointHeader, SignedCheckpoint};
use crate::codec::{checkpoint_digest, feed_digest, hash_validator_set};
use crate::config::{SignedMessage, VerifierConfig};
use crate::curve::CurveContext;
use crate::errors::VerifyError;
use crate::keys::{batch_verify, verify, BatchItem};
use crate::merkle::{verify_inclusion, MerkleMode, MerkleProof};
use crate::types::Digest;

/// Verification stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Digest,
    ResolveSigners,
    VerifySignature,
    CheckQuorum,
    Accepted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "INIT",
            Stage::Digest => "DIGEST",
            Stage::ResolveSigners => "RESOLVE_SIGNERS",
            Stage::VerifySignature => "VERIFY_SIGNATURE",
            Stage::CheckQuorum => "CHECK_QUORUM",
            Stage::Accepted => "ACCEPTED",
        };
        f.write_str(name)
    }
}

/// Proof that a checkpoint passed every stage. Only the verifier builds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCheckpoint {
    header: CheckpointHeader,
    digest: Digest,
    validator_set_hash: Digest,
    signers: Vec<usize>,
    signed_voting_power: u128,
    total_voting_power: u128,
}

impl VerifiedCheckpoint {
    pub fn header(&self) -> &CheckpointHeader {
        &self.header
    }

    pub fn event_root(&self) -> &Digest {
        &self.header.event_root
    }

    /// The digest the committee signed
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn validator_set_hash(&self) -> &Digest {
        &self.validator_set_hash
    }

    /// Indices of the validators counted as signers
    pub fn signers(&self) -> &[usize] {
        &self.signers
    }

    pub fn signed_voting_power(&self) -> u128 {
        self.signed_voting_power
    }

    pub fn total_voting_power(&self) -> u128 {
        self.total_voting_power
    }
}

/// Output of the stages before the pairing check.
struct Prepared {
    digest: Digest,
    validator_set_hash: Digest,
    signers: SignerSet,
}

/// Verifies signed checkpoints under one configuration.
#[derive(Debug, Clone)]
pub struct CheckpointVerifier<'c> {
    ctx: &'c CurveContext,
    config: VerifierConfig,
}

impl<'c> CheckpointVerifier<'c> {
    pub fn new(ctx: &'c CurveContext, config: VerifierConfig) -> Self {
        Self { ctx, config }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Run every stage on one checkpoint.
    pub fn verify(&self, checkpoint: &SignedCheckpoint) -> Result<VerifiedCheckpoint, VerifyError> {
        let mut stage = Stage::Init;
        let result = self.run(checkpoint, &mut stage);
        if let Err(err) = &result {
            log::warn!(
                "checkpoint at block {} rejected at {}: {}",
                checkpoint.header.block_number,
                stage,
                err
            );
        }
        result
    }

    fn run(
        &self,
        checkpoint: &SignedCheckpoint,
        stage: &mut Stage,
    ) -> Result<VerifiedCheckpoint, VerifyError> {
        let prepared = self.prepare(checkpoint, stage)?;

        enter(stage, Stage::VerifySignature);
        self.check_signature(checkpoint, &prepared)?;

        enter(stage, Stage::CheckQuorum);
        self.accept(checkpoint, prepared, stage)
    }

    /// INIT through RESOLVE_SIGNERS.
    fn prepare(
        &self,
        checkpoint: &SignedCheckpoint,
        stage: &mut Stage,
    ) -> Result<Prepared, VerifyError> {
        let set = &checkpoint.validator_set;
        let attestation = &checkpoint.attestation;

        enter(stage, Stage::Init);
        let validator_set_hash = hash_validator_set(set);
        crate::dbg_scalar!("validator_set_hash", &validator_set_hash);
        if let Some(expected) = self.config.expected_validator_set_hash {
            if expected != validator_set_hash {
                return Err(VerifyError::ValidatorSetHashMismatch {
                    expected,
                    computed: validator_set_hash,
                });
            }
        }

        enter(stage, Stage::Digest);
        let header = &checkpoint.header;
        let digest = match self.config.signed_message {
            SignedMessage::CheckpointDigest => checkpoint_digest(
                self.config.chain_id,
                header,
                &checkpoint.metadata,
                &validator_set_hash,
            ),
            SignedMessage::FeedDigest => feed_digest(&header.event_root, header.block_number),
        };
        crate::dbg_scalar!("signed_digest", &digest);

        enter(stage, Stage::ResolveSigners);
        if attestation.convention != self.config.convention {
            return Err(VerifyError::MalformedBitmap(format!(
                "attestation uses {} convention, verifier expects {}",
                attestation.convention, self.config.convention
            )));
        }
        check_bitmap_shape(
            set.len(),
            &attestation.bitmap,
            self.config.strict_bitmap_length,
        )?;
        let signers = resolve_signers(self.ctx, set, &attestation.bitmap, attestation.convention)?;
        log::debug!(
            "{} of {} validators counted, power {}",
            signers.indices.len(),
            set.len(),
            signers.aggregate_voting_power
        );
        if signers.is_empty() {
            return Err(VerifyError::InsufficientVotingPower {
                signed: 0,
                total: set.total_voting_power().ok_or(VerifyError::VotingPowerOverflow)?,
            });
        }

        Ok(Prepared {
            digest,
            validator_set_hash,
            signers,
        })
    }

    fn check_signature(
        &self,
        checkpoint: &SignedCheckpoint,
        prepared: &Prepared,
    ) -> Result<(), VerifyError> {
        let valid = verify(
            self.ctx,
            &checkpoint.attestation.aggregate_signature,
            &prepared.signers.aggregate_public_key,
            &prepared.digest,
            &self.config.domain,
        )?;
        if !valid {
            return Err(VerifyError::SignatureVerificationFailed);
        }
        Ok(())
    }

    /// CHECK_QUORUM through ACCEPTED.
    fn accept(
        &self,
        checkpoint: &SignedCheckpoint,
        prepared: Prepared,
        stage: &mut Stage,
    ) -> Result<VerifiedCheckpoint, VerifyError> {
        let total = checkpoint
            .validator_set
            .total_voting_power()
            .ok_or(VerifyError::VotingPowerOverflow)?;
        let signed = prepared.signers.aggregate_voting_power;

        let met = self
            .config
            .quorum
            .is_met(signed, total)
            .ok_or(VerifyError::VotingPowerOverflow)?;
        if !met {
            return Err(VerifyError::InsufficientVotingPower { signed, total });
        }

        enter(stage, Stage::Accepted);
        Ok(VerifiedCheckpoint {
            header: checkpoint.header.clone(),
            digest: prepared.digest,
            validator_set_hash: prepared.validator_set_hash,
            signers: prepared.signers.indices,
            signed_voting_power: signed,
            total_voting_power: total,
        })
    }

    /// Check that `leaf` is committed under a verified checkpoint's event root.
    pub fn verify_event_inclusion(
        &self,
        verified: &VerifiedCheckpoint,
        leaf: &Digest,
        proof: &MerkleProof,
        mode: MerkleMode,
    ) -> Result<bool, VerifyError> {
        let included = verify_inclusion(leaf, proof, verified.event_root(), mode)?;
        log::debug!(
            "event inclusion under block {}: {}",
            verified.header.block_number,
            included
        );
        Ok(included)
    }

    /// Verify many checkpoints, sharing one multi-pairing across all of them.
    ///
    /// Results are returned in input order. If the batched pairing fails,
    /// each remaining checkpoint is re-checked alone so the failure lands on
    /// the right one.
    pub fn verify_batch(
        &self,
        checkpoints: &[SignedCheckpoint],
    ) -> Vec<Result<VerifiedCheckpoint, VerifyError>> {
        let mut stages: Vec<Stage> = alloc::vec![Stage::Init; checkpoints.len()];
        let prepared: Vec<Result<Prepared, VerifyError>> = checkpoints
            .iter()
            .zip(stages.iter_mut())
            .map(|(checkpoint, stage)| self.prepare(checkpoint, stage))
            .collect();

        let items: Vec<BatchItem<'_>> = checkpoints
            .iter()
            .zip(&prepared)
            .filter_map(|(checkpoint, prepared)| {
                prepared.as_ref().ok().map(|prepared| BatchItem {
                    signature: checkpoint.attestation.aggregate_signature,
                    public_key: prepared.signers.aggregate_public_key,
                    message: &prepared.digest,
                })
            })
            .collect();

        let batch_ok = match batch_verify(self.ctx, &items, &self.config.domain) {
            Ok(ok) => ok,
            Err(err) => {
                log::debug!("batched pairing unavailable ({err}), verifying individually");
                false
            }
        };
        log::debug!(
            "batched pairing over {} checkpoints: {}",
            items.len(),
            batch_ok
        );
        drop(items);

        checkpoints
            .iter()
            .zip(prepared)
            .zip(stages)
            .map(|((checkpoint, prepared), mut stage)| {
                let result = prepared.and_then(|prepared| {
                    enter(&mut stage, Stage::VerifySignature);
                    if !batch_ok {
                        self.check_signature(checkpoint, &prepared)?;
                    }
                    enter(&mut stage, Stage::CheckQuorum);
                    self.accept(checkpoint, prepared, &mut stage)
                });
                if let Err(err) = &result {
                    log::warn!(
                        "checkpoint at block {} rejected at {}: {}",
                        checkpoint.header.block_number,
                        stage,
                        err
                    );
                }
                result
            })
            .collect()
    }
}

fn enter(stage: &mut Stage, next: Stage) {
    log::debug!("{} -> {}", stage, next);
    *stage = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::{encode_bitmap, BitmapConvention};
    use crate::checkpoint::{Attestation, CheckpointMetadata, ValidatorEntry, ValidatorSet};
    use crate::config::{domain_from_label, Quorum, DEFAULT_DOMAIN_LABEL};
    use crate::errors::ErrorKind;
    use crate::keys::{aggregate_signatures, new_keypair, sign, KeyPair};
    use crate::merkle::MerkleTree;
    use crate::types::G1;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const CHAIN_ID: u64 = 1;

    struct Committee {
        keys: Vec<KeyPair>,
        set: ValidatorSet,
    }

    fn committee(n: usize, power: u128) -> Committee {
        let ctx = CurveContext::init();
        let mut rng = StdRng::seed_from_u64(2024);
        let keys: Vec<KeyPair> = (0..n).map(|_| new_keypair(ctx, &mut rng)).collect();
        let set = keys
            .iter()
            .enumerate()
            .map(|(i, kp)| ValidatorEntry {
                address: [i as u8 + 1; 20],
                g1_public_key: kp.g1_public_key,
                g2_public_key: kp.g2_public_key,
                voting_power: power,
            })
            .collect();
        Committee { keys, set }
    }

    fn config(convention: BitmapConvention) -> VerifierConfig {
        VerifierConfig::new(CHAIN_ID, domain_from_label(DEFAULT_DOMAIN_LABEL), convention)
    }

    fn header(block_number: u64) -> CheckpointHeader {
        CheckpointHeader {
            epoch: 1,
            block_number,
            event_root: [0x11; 32],
        }
    }

    fn metadata(block_round: u64) -> CheckpointMetadata {
        CheckpointMetadata {
            block_hash: [0x22; 32],
            block_round,
            current_validator_set_hash: [0x33; 32],
        }
    }

    /// Sign with the validators `participating` and attest under `convention`.
    fn signed(
        committee: &Committee,
        header: CheckpointHeader,
        metadata: CheckpointMetadata,
        participating: &[usize],
        convention: BitmapConvention,
    ) -> SignedCheckpoint {
        let vs_hash = hash_validator_set(&committee.set);
        let digest = checkpoint_digest(CHAIN_ID, &header, &metadata, &vs_hash);
        signed_over(committee, header, metadata, participating, convention, &digest)
    }

    fn signed_over(
        committee: &Committee,
        header: CheckpointHeader,
        metadata: CheckpointMetadata,
        participating: &[usize],
        convention: BitmapConvention,
        digest: &Digest,
    ) -> SignedCheckpoint {
        let ctx = CurveContext::init();
        let domain = domain_from_label(DEFAULT_DOMAIN_LABEL);
        let sigs: Vec<G1> = participating
            .iter()
            .map(|&i| sign(ctx, &committee.keys[i].secret, digest, &domain).unwrap())
            .collect();
        SignedCheckpoint {
            header,
            metadata,
            validator_set: committee.set.clone(),
            attestation: Attestation {
                bitmap: encode_bitmap(committee.set.len(), participating, convention),
                convention,
                aggregate_signature: aggregate_signatures(ctx, &sigs).unwrap(),
            },
        }
    }

    #[test]
    fn test_full_participation_accepted() {
        let c = committee(12, 1000);
        let all: Vec<usize> = (0..12).collect();
        let cp = signed(&c, header(1), metadata(0), &all, BitmapConvention::NonSigners);
        assert_eq!(cp.attestation.bitmap, vec![0x00, 0x00]);

        let verifier = CheckpointVerifier::new(CurveContext::init(), config(BitmapConvention::NonSigners));
        let verified = verifier.verify(&cp).unwrap();
        assert_eq!(verified.signed_voting_power(), 12_000);
        assert_eq!(verified.total_voting_power(), 12_000);
        assert_eq!(verified.signers().len(), 12);
    }

    #[test]
    fn test_insufficient_power() {
        let c = committee(12, 1000);
        let cp = signed(&c, header(3), metadata(0), &[0], BitmapConvention::NonSigners);
        let verifier = CheckpointVerifier::new(CurveContext::init(), config(BitmapConvention::NonSigners));
        let err = verifier.verify(&cp).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientVotingPower);
        assert!(matches!(
            err,
            VerifyError::InsufficientVotingPower {
                signed: 1000,
                total: 12_000
            }
        ));
    }

    #[test]
    fn test_no_signers_fails_before_pairing() {
        let c = committee(4, 1000);
        let mut cp = signed(&c, header(1), metadata(0), &[0, 1, 2, 3], BitmapConvention::Signers);
        cp.attestation.bitmap = vec![0x00];
        let verifier = CheckpointVerifier::new(CurveContext::init(), config(BitmapConvention::Signers));
        let err = verifier.verify(&cp).unwrap_err();
        assert!(matches!(
            err,
            VerifyError::InsufficientVotingPower { signed: 0, total: 4000 }
        ));
    }

    #[test]
    fn test_wrong_block_round_fails_signature() {
        let c = committee(4, 1000);
        let all: Vec<usize> = (0..4).collect();
        let mut cp = signed(&c, header(1), metadata(0), &all, BitmapConvention::Signers);
        cp.metadata.block_round = 1;
        let verifier = CheckpointVerifier::new(CurveContext::init(), config(BitmapConvention::Signers));
        assert_eq!(
            verifier.verify(&cp).unwrap_err().kind(),
            ErrorKind::SignatureVerificationFailed
        );
    }

    #[test]
    fn test_convention_mismatch_is_malformed() {
        let c = committee(4, 1000);
        let all: Vec<usize> = (0..4).collect();
        let cp = signed(&c, header(1), metadata(0), &all, BitmapConvention::Signers);
        let verifier = CheckpointVerifier::new(CurveContext::init(), config(BitmapConvention::NonSigners));
        assert_eq!(verifier.verify(&cp).unwrap_err().kind(), ErrorKind::MalformedBitmap);
    }

    #[test]
    fn test_strict_bitmap_length() {
        let c = committee(12, 1000);
        let all: Vec<usize> = (0..12).collect();
        let mut cp = signed(&c, header(1), metadata(0), &all, BitmapConvention::NonSigners);
        cp.attestation.bitmap = vec![0x00];

        let lenient = CheckpointVerifier::new(CurveContext::init(), config(BitmapConvention::NonSigners));
        assert!(lenient.verify(&cp).is_ok());

        let strict = CheckpointVerifier::new(
            CurveContext::init(),
            config(BitmapConvention::NonSigners).with_strict_bitmap_length(true),
        );
        assert_eq!(strict.verify(&cp).unwrap_err().kind(), ErrorKind::MalformedBitmap);
    }

    #[test]
    fn test_expected_validator_set_hash() {
        let c = committee(3, 10);
        let all: Vec<usize> = (0..3).collect();
        let cp = signed(&c, header(1), metadata(0), &all, BitmapConvention::Signers);

        let trusted = CheckpointVerifier::new(
            CurveContext::init(),
            config(BitmapConvention::Signers).with_expected_validator_set_hash(hash_validator_set(&c.set)),
        );
        assert!(trusted.verify(&cp).is_ok());

        let other = CheckpointVerifier::new(
            CurveContext::init(),
            config(BitmapConvention::Signers).with_expected_validator_set_hash([0xee; 32]),
        );
        assert_eq!(
            other.verify(&cp).unwrap_err().kind(),
            ErrorKind::ValidatorSetHashMismatch
        );
    }

    #[test]
    fn test_custom_quorum() {
        let c = committee(4, 1000);
        let cp = signed(&c, header(1), metadata(0), &[0, 1], BitmapConvention::Signers);
        let half = CheckpointVerifier::new(
            CurveContext::init(),
            config(BitmapConvention::Signers).with_quorum(Quorum::new(1, 2).unwrap()),
        );
        assert!(half.verify(&cp).is_ok());

        let default = CheckpointVerifier::new(CurveContext::init(), config(BitmapConvention::Signers));
        assert!(default.verify(&cp).is_err());
    }

    #[test]
    fn test_feed_digest_message() {
        let c = committee(4, 1000);
        let h = header(9);
        let digest = feed_digest(&h.event_root, h.block_number);
        let cp = signed_over(&c, h, metadata(0), &[0, 1, 2], BitmapConvention::Signers, &digest);

        let feed = CheckpointVerifier::new(
            CurveContext::init(),
            config(BitmapConvention::Signers).with_signed_message(SignedMessage::FeedDigest),
        );
        let verified = feed.verify(&cp).unwrap();
        assert_eq!(verified.digest(), &digest);
        assert_eq!(verified.signed_voting_power(), 3000);

        // same signatures checked against the checkpoint digest
        let default = CheckpointVerifier::new(CurveContext::init(), config(BitmapConvention::Signers));
        assert_eq!(
            default.verify(&cp).unwrap_err().kind(),
            ErrorKind::SignatureVerificationFailed
        );

        // the feed digest ignores metadata but binds the block number
        let mut moved = cp.clone();
        moved.metadata.block_round = 5;
        assert!(feed.verify(&moved).is_ok());
        moved.header.block_number = 10;
        assert_eq!(
            feed.verify(&moved).unwrap_err().kind(),
            ErrorKind::SignatureVerificationFailed
        );
    }

    #[test]
    fn test_event_inclusion_after_verification() {
        let c = committee(3, 1);
        let leaves: Vec<Digest> = (0u8..5).map(|i| [i; 32]).collect();
        let tree = MerkleTree::build(&leaves, MerkleMode::Sorted).unwrap();
        let mut h = header(7);
        h.event_root = tree.root();

        let all: Vec<usize> = (0..3).collect();
        let cp = signed(&c, h, metadata(0), &all, BitmapConvention::Signers);
        let verifier = CheckpointVerifier::new(CurveContext::init(), config(BitmapConvention::Signers));
        let verified = verifier.verify(&cp).unwrap();

        let proof = tree.prove(2).unwrap();
        assert!(verifier
            .verify_event_inclusion(&verified, &leaves[2], &proof, MerkleMode::Sorted)
            .unwrap());
        assert!(!verifier
            .verify_event_inclusion(&verified, &leaves[3], &proof, MerkleMode::Sorted)
            .unwrap());
    }

    #[test]
    fn test_verify_batch_attributes_failures() {
        let c = committee(4, 1000);
        let all: Vec<usize> = (0..4).collect();
        let good1 = signed(&c, header(1), metadata(0), &all, BitmapConvention::Signers);
        let good2 = signed(&c, header(2), metadata(0), &all, BitmapConvention::Signers);
        let mut bad_sig = signed(&c, header(3), metadata(0), &all, BitmapConvention::Signers);
        bad_sig.metadata.block_round = 9;
        let weak = signed(&c, header(4), metadata(0), &[0], BitmapConvention::Signers);

        let verifier = CheckpointVerifier::new(CurveContext::init(), config(BitmapConvention::Signers));

        let results = verifier.verify_batch(&[good1.clone(), good2.clone()]);
        assert!(results.iter().all(|r| r.is_ok()));

        let results = verifier.verify_batch(&[good1, bad_sig, good2, weak]);
        assert!(results[0].is_ok());
        assert_eq!(
            results[1].as_ref().unwrap_err().kind(),
            ErrorKind::SignatureVerificationFailed
        );
        assert!(results[2].is_ok());
        assert_eq!(
            results[3].as_ref().unwrap_err().kind(),
            ErrorKind::InsufficientVotingPower
        );
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::ResolveSigners.to_string(), "RESOLVE_SIGNERS");
        assert_eq!(Stage::Accepted.to_string(), "ACCEPTED");
    }
}
