//! Checkpoint data model
//!
//! Fixed-shape records for the committee, the checkpoint header and
//! metadata, and the committee's attestation over them.

extern crate alloc;
use alloc::vec::Vec;

use crate::bitmap::BitmapConvention;
use crate::curve::CurveContext;
use crate::errors::{KeyError, VerifyError};
use crate::ops::pairing_check;
use crate::types::{Address, Digest, G1, G1_GENERATOR, G2, G2_GENERATOR_NEG};

/// One committee member.
///
/// `g1_public_key` and `g2_public_key` are images of the same secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorEntry {
    pub address: Address,
    pub g1_public_key: G1,
    pub g2_public_key: G2,
    pub voting_power: u128,
}

impl ValidatorEntry {
    /// Check that both public keys come from the same secret:
    /// e(pk1, -G2) · e(G1, pk2) == 1.
    pub fn keys_consistent(&self, ctx: &CurveContext) -> Result<bool, VerifyError> {
        ctx.decode_g1(&self.g1_public_key)
            .map_err(|_| KeyError::InvalidPublicKeyPoint)?;
        ctx.decode_g2(&self.g2_public_key)
            .map_err(|_| KeyError::InvalidPublicKeyPoint)?;
        Ok(pairing_check(&[
            (self.g1_public_key, G2_GENERATOR_NEG),
            (G1_GENERATOR, self.g2_public_key),
        ])?)
    }
}

/// Ordered committee. Position `i` is bit `i` of an attestation bitmap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatorSet {
    validators: Vec<ValidatorEntry>,
}

impl ValidatorSet {
    pub fn new(validators: Vec<ValidatorEntry>) -> Self {
        Self { validators }
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ValidatorEntry> {
        self.validators.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidatorEntry> {
        self.validators.iter()
    }

    pub fn validators(&self) -> &[ValidatorEntry] {
        &self.validators
    }

    /// Sum of all voting power, `None` on overflow.
    pub fn total_voting_power(&self) -> Option<u128> {
        self.validators
            .iter()
            .try_fold(0u128, |acc, v| acc.checked_add(v.voting_power))
    }

    /// Index of the first validator whose G1 and G2 keys disagree.
    pub fn find_inconsistent_key(&self, ctx: &CurveContext) -> Result<Option<usize>, VerifyError> {
        for (index, validator) in self.validators.iter().enumerate() {
            if !validator.keys_consistent(ctx)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }
}

impl FromIterator<ValidatorEntry> for ValidatorSet {
    fn from_iter<I: IntoIterator<Item = ValidatorEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The committed part of a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointHeader {
    pub epoch: u64,
    pub block_number: u64,
    pub event_root: Digest,
}

/// Context signed alongside the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointMetadata {
    pub block_hash: Digest,
    pub block_round: u64,
    pub current_validator_set_hash: Digest,
}

/// The committee's aggregate signature plus who took part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    pub bitmap: Vec<u8>,
    pub convention: BitmapConvention,
    pub aggregate_signature: G1,
}

/// Everything needed to verify one checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCheckpoint {
    pub header: CheckpointHeader,
    pub metadata: CheckpointMetadata,
    pub validator_set: ValidatorSet,
    pub attestation: Attestation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::new_keypair;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn validators(n: usize, power: u128) -> ValidatorSet {
        let ctx = CurveContext::init();
        let mut rng = StdRng::seed_from_u64(99);
        (0..n)
            .map(|i| {
                let kp = new_keypair(ctx, &mut rng);
                ValidatorEntry {
                    address: [i as u8; 20],
                    g1_public_key: kp.g1_public_key,
                    g2_public_key: kp.g2_public_key,
                    voting_power: power,
                }
            })
            .collect()
    }

    #[test]
    fn test_total_voting_power() {
        assert_eq!(validators(3, 1000).total_voting_power(), Some(3000));
        assert_eq!(ValidatorSet::default().total_voting_power(), Some(0));
    }

    #[test]
    fn test_total_voting_power_overflow() {
        let set = validators(2, u128::MAX);
        assert_eq!(set.total_voting_power(), None);
    }

    #[test]
    fn test_key_consistency() {
        let ctx = CurveContext::init();
        let mut set = validators(3, 1);
        assert_eq!(set.find_inconsistent_key(ctx).unwrap(), None);

        let swapped = set.validators[0].g1_public_key;
        set.validators[2].g1_public_key = swapped;
        assert_eq!(set.find_inconsistent_key(ctx).unwrap(), Some(2));
    }
}
