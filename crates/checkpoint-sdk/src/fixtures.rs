//! Deterministic signed-checkpoint scenarios
//!
//! A [`ScenarioBuilder`] generates a committee from a seed, commits a list
//! of events (rate updates or bridged messages) under an event root, and
//! has the participating validators sign the checkpoint or feed digest. Used by the CLI `fixture` command and
//! by the integration tests.

use checkpoint_core::bitmap::{bit_at, encode_bitmap, BitmapConvention};
use checkpoint_core::codec::{checkpoint_digest, feed_digest, hash_validator_set, keccak256};
use checkpoint_core::config::{domain_from_label, DEFAULT_DOMAIN_LABEL};
use checkpoint_core::events::{Event, RateUpdate};
use checkpoint_core::field::word_from_u64;
use checkpoint_core::keys::{aggregate_signatures, new_keypair, sign, KeyPair};
use checkpoint_core::merkle::{MerkleMode, MerkleProof, MerkleTree};
use checkpoint_core::types::{Digest, G1};
use checkpoint_core::{
    Attestation, CheckpointHeader, CheckpointMetadata, CurveContext, SignedCheckpoint,
    SignedMessage, ValidatorEntry, ValidatorSet, VerifierConfig,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::Result;
use crate::types::{encode_hex, mode_name, CheckpointBundle, EventJson, KeyJson, ScenarioFixture};

pub const DEFAULT_COMMITTEE_SIZE: usize = 12;
pub const DEFAULT_VOTING_POWER: u128 = 1000;
pub const DEFAULT_SEED: u64 = 2024;

/// Timestamp shared by the default rate updates
pub const DEFAULT_RATE_TIMESTAMP: u64 = 20_398_409_483;

/// Two rate updates (symbol 1 at 64000, symbol 2 at 3000).
pub fn default_events() -> Vec<Event> {
    vec![
        Event::Rate(RateUpdate {
            symbol: 1,
            rate: 64_000,
            timestamp: DEFAULT_RATE_TIMESTAMP,
        }),
        Event::Rate(RateUpdate {
            symbol: 2,
            rate: 3_000,
            timestamp: DEFAULT_RATE_TIMESTAMP,
        }),
    ]
}

/// Builder for a signed checkpoint scenario
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    chain_id: u64,
    signing_chain_id: Option<u64>,
    domain: Digest,
    committee_size: usize,
    voting_powers: Option<Vec<u128>>,
    voting_power: u128,
    convention: BitmapConvention,
    bitmap: Option<Vec<u8>>,
    block_number: u64,
    block_round: u64,
    epoch: u64,
    seed: u64,
    events: Vec<Event>,
    merkle_mode: MerkleMode,
    signed_message: SignedMessage,
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self {
            chain_id: 1,
            signing_chain_id: None,
            domain: domain_from_label(DEFAULT_DOMAIN_LABEL),
            committee_size: DEFAULT_COMMITTEE_SIZE,
            voting_powers: None,
            voting_power: DEFAULT_VOTING_POWER,
            convention: BitmapConvention::NonSigners,
            bitmap: None,
            block_number: 1,
            block_round: 0,
            epoch: 1,
            seed: DEFAULT_SEED,
            events: default_events(),
            merkle_mode: MerkleMode::Sorted,
            signed_message: SignedMessage::CheckpointDigest,
        }
    }
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Sign under a different chain id than the bundle declares
    pub fn signing_chain_id(mut self, chain_id: u64) -> Self {
        self.signing_chain_id = Some(chain_id);
        self
    }

    pub fn domain(mut self, domain: Digest) -> Self {
        self.domain = domain;
        self
    }

    pub fn committee_size(mut self, size: usize) -> Self {
        self.committee_size = size;
        self
    }

    /// Same power for every validator
    pub fn voting_power(mut self, power: u128) -> Self {
        self.voting_power = power;
        self.voting_powers = None;
        self
    }

    /// One power per validator; also sets the committee size
    pub fn voting_powers(mut self, powers: Vec<u128>) -> Self {
        self.committee_size = powers.len();
        self.voting_powers = Some(powers);
        self
    }

    pub fn convention(mut self, convention: BitmapConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Attest with this exact bitmap. Without one, every validator signs.
    pub fn bitmap(mut self, bitmap: Vec<u8>) -> Self {
        self.bitmap = Some(bitmap);
        self
    }

    pub fn block_number(mut self, block_number: u64) -> Self {
        self.block_number = block_number;
        self
    }

    pub fn block_round(mut self, block_round: u64) -> Self {
        self.block_round = block_round;
        self
    }

    pub fn epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Events committed under the root, in order. Accepts rate updates,
    /// bridged messages or a mix as [`Event`]s.
    pub fn events<I>(mut self, events: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Event>,
    {
        self.events = events.into_iter().map(Into::into).collect();
        self
    }

    pub fn merkle_mode(mut self, mode: MerkleMode) -> Self {
        self.merkle_mode = mode;
        self
    }

    /// Which digest the committee signs
    pub fn signed_message(mut self, signed_message: SignedMessage) -> Self {
        self.signed_message = signed_message;
        self
    }

    /// A verifier configuration matching this scenario
    pub fn verifier_config(&self) -> VerifierConfig {
        VerifierConfig::new(self.chain_id, self.domain, self.convention)
            .with_signed_message(self.signed_message)
    }

    pub fn build(&self) -> Result<Scenario> {
        let ctx = CurveContext::init();
        let mut rng = StdRng::seed_from_u64(self.seed);

        let powers = match &self.voting_powers {
            Some(powers) => powers.clone(),
            None => vec![self.voting_power; self.committee_size],
        };
        let keys: Vec<KeyPair> = powers
            .iter()
            .map(|_| new_keypair(ctx, &mut rng))
            .collect();
        let validator_set: ValidatorSet = keys
            .iter()
            .zip(&powers)
            .map(|(kp, &voting_power)| ValidatorEntry {
                address: address_of(&kp.g1_public_key),
                g1_public_key: kp.g1_public_key,
                g2_public_key: kp.g2_public_key,
                voting_power,
            })
            .collect();

        let leaves: Vec<Digest> = self.events.iter().map(Event::leaf_hash).collect();
        let tree = MerkleTree::build(&leaves, self.merkle_mode)?;

        let validator_set_hash = hash_validator_set(&validator_set);
        let header = CheckpointHeader {
            epoch: self.epoch,
            block_number: self.block_number,
            event_root: tree.root(),
        };
        let metadata = CheckpointMetadata {
            block_hash: keccak256(&word_from_u64(self.block_number)),
            block_round: self.block_round,
            current_validator_set_hash: validator_set_hash,
        };

        let n = validator_set.len();
        let bitmap = match &self.bitmap {
            Some(bitmap) => bitmap.clone(),
            None => encode_bitmap(n, &(0..n).collect::<Vec<_>>(), self.convention),
        };
        let signers: Vec<usize> = (0..n)
            .filter(|&i| self.convention.counts(bit_at(&bitmap, i)))
            .collect();

        let digest = match self.signed_message {
            SignedMessage::CheckpointDigest => checkpoint_digest(
                self.signing_chain_id.unwrap_or(self.chain_id),
                &header,
                &metadata,
                &validator_set_hash,
            ),
            SignedMessage::FeedDigest => feed_digest(&header.event_root, header.block_number),
        };
        let signatures = signers
            .iter()
            .map(|&i| sign(ctx, &keys[i].secret, &digest, &self.domain))
            .collect::<std::result::Result<Vec<G1>, _>>()?;
        let aggregate_signature = aggregate_signatures(ctx, &signatures)?;
        log::debug!(
            "scenario block {}: {} of {} validators signed",
            self.block_number,
            signers.len(),
            n
        );

        Ok(Scenario {
            chain_id: self.chain_id,
            checkpoint: SignedCheckpoint {
                header,
                metadata,
                validator_set,
                attestation: Attestation {
                    bitmap,
                    convention: self.convention,
                    aggregate_signature,
                },
            },
            signed_message: self.signed_message,
            keys,
            signers,
            events: self.events.clone(),
            leaves,
            tree,
        })
    }
}

/// Last 20 bytes of keccak256 of the G1 key
fn address_of(g1_public_key: &G1) -> [u8; 20] {
    let hash = keccak256(g1_public_key);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// A generated checkpoint with everything used to build it
#[derive(Debug, Clone)]
pub struct Scenario {
    pub chain_id: u64,
    pub checkpoint: SignedCheckpoint,
    pub signed_message: SignedMessage,
    pub keys: Vec<KeyPair>,
    /// Validators whose signatures are in the aggregate
    pub signers: Vec<usize>,
    pub events: Vec<Event>,
    pub leaves: Vec<Digest>,
    pub tree: MerkleTree,
}

impl Scenario {
    /// Inclusion proof for the `index`th event
    pub fn prove(&self, index: usize) -> Result<MerkleProof> {
        Ok(self.tree.prove(index)?)
    }

    pub fn bundle(&self) -> CheckpointBundle {
        CheckpointBundle::from_signed(self.chain_id, &self.checkpoint)
    }

    pub fn fixture(&self) -> ScenarioFixture {
        ScenarioFixture {
            bundle: self.bundle(),
            keys: self.keys.iter().map(KeyJson::from).collect(),
            merkle_mode: mode_name(self.tree.mode()).to_string(),
            signed_message: self.signed_message.to_string(),
            events: self.events.iter().map(EventJson::from).collect(),
            leaves: self.leaves.iter().map(|l| encode_hex(l)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkpoint_core::events::BridgedMessage;

    #[test]
    fn test_default_scenario_all_sign() {
        let scenario = ScenarioBuilder::new().build().unwrap();
        assert_eq!(scenario.signers.len(), DEFAULT_COMMITTEE_SIZE);
        assert_eq!(scenario.checkpoint.attestation.bitmap, vec![0x00, 0x00]);
        assert_eq!(scenario.leaves.len(), 2);
    }

    #[test]
    fn test_scenario_is_deterministic() {
        let a = ScenarioBuilder::new().seed(7).build().unwrap();
        let b = ScenarioBuilder::new().seed(7).build().unwrap();
        assert_eq!(a.checkpoint, b.checkpoint);
    }

    #[test]
    fn test_bitmap_selects_signers() {
        let scenario = ScenarioBuilder::new().bitmap(vec![0xfe]).build().unwrap();
        // bits 1..7 set: only validators 0 and 8..12 sign
        assert_eq!(scenario.signers, vec![0, 8, 9, 10, 11]);
    }

    #[test]
    fn test_fixture_leaves_match_events() {
        let scenario = ScenarioBuilder::new().build().unwrap();
        let fixture = scenario.fixture();
        assert_eq!(fixture.merkle_mode, "sorted");
        assert_eq!(fixture.signed_message, "checkpoint");
        assert_eq!(fixture.leaves[0], encode_hex(&scenario.events[0].leaf_hash()));
        assert_eq!(fixture.keys.len(), DEFAULT_COMMITTEE_SIZE);
    }

    #[test]
    fn test_mixed_events_and_feed_message() {
        let rate = RateUpdate {
            symbol: 3,
            rate: 42,
            timestamp: 1,
        };
        let message = BridgedMessage::with_rate(0, [1; 20], [2; 20], &rate);
        let scenario = ScenarioBuilder::new()
            .events(vec![Event::from(rate), Event::from(message.clone())])
            .signed_message(SignedMessage::FeedDigest)
            .build()
            .unwrap();
        assert_eq!(scenario.leaves, vec![rate.leaf_hash(), message.leaf_hash()]);
        assert_eq!(scenario.signed_message, SignedMessage::FeedDigest);
        assert_eq!(scenario.fixture().signed_message, "feed");
    }
}
