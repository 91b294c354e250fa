//! JSON bundle types
//!
//! Byte values travel as 0x-prefixed hex, voting power as a decimal string
//! (it does not fit a JSON number), G2 keys as four hex words in ABI order.

use std::fs;
use std::path::Path;

use checkpoint_core::bitmap::BitmapConvention;
use checkpoint_core::events::Event;
use checkpoint_core::keys::KeyPair;
use checkpoint_core::merkle::{MerkleMode, MerkleProof};
use checkpoint_core::types::{g2_coordinates, g2_from_coordinates, G2};
use checkpoint_core::{
    Attestation, CheckpointHeader, CheckpointMetadata, SignedCheckpoint, ValidatorEntry,
    ValidatorSet, VerifiedCheckpoint,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdkError};

/// Encode bytes as 0x-prefixed lowercase hex
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode 0x-prefixed (or bare) hex into a fixed-size array
pub fn decode_hex_array<const N: usize>(field: &'static str, s: &str) -> Result<[u8; N]> {
    let bytes = decode_hex(field, s)?;
    bytes.try_into().map_err(|bytes: Vec<u8>| SdkError::InvalidLength {
        field,
        expected: N,
        actual: bytes.len(),
    })
}

/// Decode 0x-prefixed (or bare) hex of any length
pub fn decode_hex(field: &'static str, s: &str) -> Result<Vec<u8>> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(trimmed).map_err(|source| SdkError::Hex { field, source })
}

fn encode_g2(point: &G2) -> [String; 4] {
    g2_coordinates(point).map(|word| encode_hex(&word))
}

fn decode_g2(field: &'static str, words: &[String; 4]) -> Result<G2> {
    let mut coords = [[0u8; 32]; 4];
    for (slot, word) in coords.iter_mut().zip(words) {
        *slot = decode_hex_array(field, word)?;
    }
    Ok(g2_from_coordinates(&coords))
}

fn parse_convention(s: &str) -> Result<BitmapConvention> {
    s.parse()
        .map_err(|_| SdkError::InvalidBundle(format!("unknown bitmap convention {s:?}")))
}

fn parse_mode(s: &str) -> Result<MerkleMode> {
    s.parse()
        .map_err(|_| SdkError::InvalidBundle(format!("unknown merkle mode {s:?}")))
}

/// Canonical name of a Merkle mode in bundle files
pub fn mode_name(mode: MerkleMode) -> &'static str {
    match mode {
        MerkleMode::Positional => "positional",
        MerkleMode::Sorted => "sorted",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorJson {
    pub address: String,
    pub g1_public_key: String,
    pub g2_public_key: [String; 4],
    pub voting_power: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderJson {
    pub epoch: u64,
    pub block_number: u64,
    pub event_root: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataJson {
    pub block_hash: String,
    pub block_round: u64,
    pub current_validator_set_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationJson {
    pub bitmap: String,
    pub convention: String,
    pub aggregate_signature: String,
}

/// One signed checkpoint with its committee, as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointBundle {
    pub chain_id: u64,
    pub header: HeaderJson,
    pub metadata: MetadataJson,
    pub validators: Vec<ValidatorJson>,
    pub attestation: AttestationJson,
}

impl CheckpointBundle {
    pub fn from_signed(chain_id: u64, checkpoint: &SignedCheckpoint) -> Self {
        Self {
            chain_id,
            header: HeaderJson {
                epoch: checkpoint.header.epoch,
                block_number: checkpoint.header.block_number,
                event_root: encode_hex(&checkpoint.header.event_root),
            },
            metadata: MetadataJson {
                block_hash: encode_hex(&checkpoint.metadata.block_hash),
                block_round: checkpoint.metadata.block_round,
                current_validator_set_hash: encode_hex(
                    &checkpoint.metadata.current_validator_set_hash,
                ),
            },
            validators: checkpoint
                .validator_set
                .iter()
                .map(|v| ValidatorJson {
                    address: encode_hex(&v.address),
                    g1_public_key: encode_hex(&v.g1_public_key),
                    g2_public_key: encode_g2(&v.g2_public_key),
                    voting_power: v.voting_power.to_string(),
                })
                .collect(),
            attestation: AttestationJson {
                bitmap: encode_hex(&checkpoint.attestation.bitmap),
                convention: checkpoint.attestation.convention.to_string(),
                aggregate_signature: encode_hex(&checkpoint.attestation.aggregate_signature),
            },
        }
    }

    pub fn to_signed(&self) -> Result<SignedCheckpoint> {
        let validators = self
            .validators
            .iter()
            .map(|v| {
                Ok(ValidatorEntry {
                    address: decode_hex_array("address", &v.address)?,
                    g1_public_key: decode_hex_array("g1_public_key", &v.g1_public_key)?,
                    g2_public_key: decode_g2("g2_public_key", &v.g2_public_key)?,
                    voting_power: v.voting_power.parse().map_err(|_| {
                        SdkError::InvalidBundle(format!(
                            "voting power {:?} is not a u128",
                            v.voting_power
                        ))
                    })?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SignedCheckpoint {
            header: CheckpointHeader {
                epoch: self.header.epoch,
                block_number: self.header.block_number,
                event_root: decode_hex_array("event_root", &self.header.event_root)?,
            },
            metadata: CheckpointMetadata {
                block_hash: decode_hex_array("block_hash", &self.metadata.block_hash)?,
                block_round: self.metadata.block_round,
                current_validator_set_hash: decode_hex_array(
                    "current_validator_set_hash",
                    &self.metadata.current_validator_set_hash,
                )?,
            },
            validator_set: ValidatorSet::new(validators),
            attestation: Attestation {
                bitmap: decode_hex("bitmap", &self.attestation.bitmap)?,
                convention: parse_convention(&self.attestation.convention)?,
                aggregate_signature: decode_hex_array(
                    "aggregate_signature",
                    &self.attestation.aggregate_signature,
                )?,
            },
        })
    }

    /// Load a bundle, or the bundle inside a scenario fixture.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        let bundle = match value.get("bundle") {
            Some(inner) => serde_json::from_value(inner.clone())?,
            None => serde_json::from_value(value)?,
        };
        Ok(bundle)
    }
}

/// Summary of an accepted checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Block the checkpoint commits to
    pub block_number: u64,
    pub epoch: u64,
    pub event_root: String,
    /// The digest the committee signed
    pub digest: String,
    pub validator_set_hash: String,
    /// Indices of the validators counted as signers
    pub signers: Vec<usize>,
    /// Decimal, like validator voting power in bundles
    pub signed_voting_power: String,
    pub total_voting_power: String,
}

impl From<&VerifiedCheckpoint> for VerificationReport {
    fn from(verified: &VerifiedCheckpoint) -> Self {
        Self {
            block_number: verified.header().block_number,
            epoch: verified.header().epoch,
            event_root: encode_hex(verified.event_root()),
            digest: encode_hex(verified.digest()),
            validator_set_hash: encode_hex(verified.validator_set_hash()),
            signers: verified.signers().to_vec(),
            signed_voting_power: verified.signed_voting_power().to_string(),
            total_voting_power: verified.total_voting_power().to_string(),
        }
    }
}

/// An inclusion proof for one event leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventProofJson {
    pub mode: String,
    pub root: String,
    pub leaf: String,
    pub leaf_index: usize,
    pub siblings: Vec<String>,
}

impl EventProofJson {
    pub fn new(
        mode: MerkleMode,
        root: &[u8; 32],
        leaf: &[u8; 32],
        proof: &MerkleProof,
    ) -> Self {
        Self {
            mode: mode_name(mode).to_string(),
            root: encode_hex(root),
            leaf: encode_hex(leaf),
            leaf_index: proof.leaf_index,
            siblings: proof.siblings.iter().map(|s| encode_hex(s)).collect(),
        }
    }

    pub fn mode(&self) -> Result<MerkleMode> {
        parse_mode(&self.mode)
    }

    pub fn leaf(&self) -> Result<[u8; 32]> {
        decode_hex_array("leaf", &self.leaf)
    }

    pub fn root(&self) -> Result<[u8; 32]> {
        decode_hex_array("root", &self.root)
    }

    pub fn proof(&self) -> Result<MerkleProof> {
        let siblings = self
            .siblings
            .iter()
            .map(|s| decode_hex_array("sibling", s))
            .collect::<Result<Vec<_>>>()?;
        Ok(MerkleProof {
            siblings,
            leaf_index: self.leaf_index,
        })
    }
}

/// A list of leaves to build a tree from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeavesFile {
    pub mode: String,
    pub leaves: Vec<String>,
}

impl LeavesFile {
    pub fn mode(&self) -> Result<MerkleMode> {
        parse_mode(&self.mode)
    }

    pub fn leaves(&self) -> Result<Vec<[u8; 32]>> {
        self.leaves
            .iter()
            .map(|l| decode_hex_array("leaf", l))
            .collect()
    }
}

/// A generated keypair. The secret is written in the clear; these files are
/// for fixtures and local testing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyJson {
    pub secret: String,
    pub g1_public_key: String,
    pub g2_public_key: [String; 4],
}

impl From<&KeyPair> for KeyJson {
    fn from(kp: &KeyPair) -> Self {
        Self {
            secret: encode_hex(&kp.secret.to_be_bytes()),
            g1_public_key: encode_hex(&kp.g1_public_key),
            g2_public_key: encode_g2(&kp.g2_public_key),
        }
    }
}

/// An event in JSON form, tagged by `kind`. Rates are decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventJson {
    Rate {
        symbol: u16,
        rate: String,
        timestamp: u64,
    },
    Message {
        id: u64,
        sender: String,
        receiver: String,
        data: String,
    },
}

impl From<&Event> for EventJson {
    fn from(event: &Event) -> Self {
        match event {
            Event::Rate(rate) => EventJson::Rate {
                symbol: rate.symbol,
                rate: rate.rate.to_string(),
                timestamp: rate.timestamp,
            },
            Event::Message(message) => EventJson::Message {
                id: message.id,
                sender: encode_hex(&message.sender),
                receiver: encode_hex(&message.receiver),
                data: encode_hex(&message.data),
            },
        }
    }
}

/// Everything a generated scenario produces: the bundle, the secrets that
/// signed it, and the events under its root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFixture {
    pub bundle: CheckpointBundle,
    pub keys: Vec<KeyJson>,
    pub merkle_mode: String,
    /// `checkpoint` or `feed`
    pub signed_message: String,
    pub events: Vec<EventJson>,
    pub leaves: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hex_array() {
        let word: [u8; 2] = decode_hex_array("f", "0x0102").unwrap();
        assert_eq!(word, [1, 2]);
        let bare: [u8; 2] = decode_hex_array("f", "0102").unwrap();
        assert_eq!(bare, [1, 2]);
    }

    #[test]
    fn test_decode_hex_array_wrong_length() {
        let err = decode_hex_array::<32>("event_root", "0x01").unwrap_err();
        assert!(matches!(
            err,
            SdkError::InvalidLength {
                field: "event_root",
                expected: 32,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_decode_hex_invalid() {
        assert!(matches!(
            decode_hex("bitmap", "0xzz"),
            Err(SdkError::Hex { field: "bitmap", .. })
        ));
    }

    #[test]
    fn test_event_json_tags() {
        use checkpoint_core::events::{BridgedMessage, RateUpdate};

        let rate = RateUpdate {
            symbol: 1,
            rate: 64_000,
            timestamp: 5,
        };
        let json = serde_json::to_value(EventJson::from(&Event::Rate(rate))).unwrap();
        assert_eq!(json["kind"], "rate");
        assert_eq!(json["rate"], "64000");

        let message = BridgedMessage::with_rate(4, [0xaa; 20], [0xbb; 20], &rate);
        let json = serde_json::to_value(EventJson::from(&Event::Message(message))).unwrap();
        assert_eq!(json["kind"], "message");
        assert_eq!(json["id"], 4);
        assert_eq!(json["sender"], encode_hex(&[0xaa; 20]));
    }

    #[test]
    fn test_event_proof_json() {
        let proof = MerkleProof {
            siblings: vec![[1u8; 32], [2u8; 32]],
            leaf_index: 3,
        };
        let json = EventProofJson::new(MerkleMode::Positional, &[9u8; 32], &[8u8; 32], &proof);
        assert_eq!(json.mode, "positional");
        assert_eq!(json.proof().unwrap(), proof);
        assert_eq!(json.mode().unwrap(), MerkleMode::Positional);
        assert_eq!(json.root().unwrap(), [9u8; 32]);
    }
}
