//! Canonical ABI encodings and digests
//!
//! Everything a validator signs is `keccak256(abi.encode(...))` of fixed
//! shape, so the encodings here must match the contract ABI byte for byte.

extern crate alloc;
use alloc::vec::Vec;

use sha3::{Digest as _, Keccak256};

use crate::checkpoint::{CheckpointHeader, CheckpointMetadata, ValidatorSet};
use crate::field::{word_from_u128, word_from_u64};
use crate::types::{g2_coordinates, Address, Digest};

/// A 32-byte ABI word
pub type Word = [u8; 32];

/// One ABI-encoded parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Any static 32-byte value (uint, bytes32, address, bool)
    Word(Word),
    /// Dynamic `bytes`
    Bytes(Vec<u8>),
    /// Dynamic array of static elements, already flattened to words.
    /// `len` is the element count, not the word count.
    Array { len: usize, words: Vec<Word> },
}

/// keccak256 of arbitrary bytes
pub fn keccak256(data: &[u8]) -> Digest {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// Left-pad an address to a word
pub fn address_word(address: &Address) -> Word {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address);
    word
}

/// `abi.encode(tokens...)`: static heads first, dynamic tails appended in order.
pub fn abi_encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * 32;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Word(word) => head.extend_from_slice(word),
            Token::Bytes(bytes) => {
                head.extend_from_slice(&word_from_u64((head_len + tail.len()) as u64));
                tail.extend_from_slice(&word_from_u64(bytes.len() as u64));
                tail.extend_from_slice(bytes);
                let padding = (32 - bytes.len() % 32) % 32;
                tail.resize(tail.len() + padding, 0);
            }
            Token::Array { len, words } => {
                head.extend_from_slice(&word_from_u64((head_len + tail.len()) as u64));
                tail.extend_from_slice(&word_from_u64(*len as u64));
                for word in words {
                    tail.extend_from_slice(word);
                }
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// `abi.encodePacked` of words: plain concatenation.
pub fn abi_encode_packed(words: &[Word]) -> Vec<u8> {
    words.concat()
}

/// `abi.encode(tuple(address, uint256[4], uint256)[])` of the committee.
pub fn encode_validator_set(set: &ValidatorSet) -> Vec<u8> {
    let mut words = Vec::with_capacity(set.len() * 6);
    for validator in set.iter() {
        words.push(address_word(&validator.address));
        words.extend(g2_coordinates(&validator.g2_public_key));
        words.push(word_from_u128(validator.voting_power));
    }
    abi_encode(&[Token::Array {
        len: set.len(),
        words,
    }])
}

/// Committee identity bound into every checkpoint digest.
pub fn hash_validator_set(set: &ValidatorSet) -> Digest {
    keccak256(&encode_validator_set(set))
}

/// The 32-byte message validators sign for a checkpoint.
///
/// Field order: chainId, blockNumber, blockHash, blockRound, epoch,
/// eventRoot, currentValidatorSetHash, validatorSetHash.
pub fn checkpoint_digest(
    chain_id: u64,
    header: &CheckpointHeader,
    metadata: &CheckpointMetadata,
    validator_set_hash: &Digest,
) -> Digest {
    let encoded = abi_encode(&[
        Token::Word(word_from_u64(chain_id)),
        Token::Word(word_from_u64(header.block_number)),
        Token::Word(metadata.block_hash),
        Token::Word(word_from_u64(metadata.block_round)),
        Token::Word(word_from_u64(header.epoch)),
        Token::Word(header.event_root),
        Token::Word(metadata.current_validator_set_hash),
        Token::Word(*validator_set_hash),
    ]);
    keccak256(&encoded)
}

/// `keccak256(abi.encodePacked(bytes32 root, uint256 block))`, the message of
/// the rate-feed flow.
pub fn feed_digest(event_root: &Digest, block_number: u64) -> Digest {
    keccak256(&abi_encode_packed(&[*event_root, word_from_u64(block_number)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::ValidatorEntry;
    use crate::types::{G1_GENERATOR, G2_GENERATOR};
    use hex_literal::hex;

    fn entry(byte: u8, power: u128) -> ValidatorEntry {
        ValidatorEntry {
            address: [byte; 20],
            g1_public_key: G1_GENERATOR,
            g2_public_key: G2_GENERATOR,
            voting_power: power,
        }
    }

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            keccak256(b""),
            hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }

    #[test]
    fn test_abi_encode_bytes_layout() {
        let encoded = abi_encode(&[Token::Word(word_from_u64(7)), Token::Bytes(vec![0xab; 33])]);
        // head: 2 words, tail: length + 2 padded words
        assert_eq!(encoded.len(), 32 * 5);
        assert_eq!(encoded[63], 0x40);
        assert_eq!(encoded[95], 33);
        assert_eq!(encoded[96..129], [0xab; 33]);
        assert!(encoded[129..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_validator_set_encoding_layout() {
        let set = ValidatorSet::new(vec![entry(1, 1000), entry(2, 2000)]);
        let encoded = encode_validator_set(&set);

        assert_eq!(encoded.len(), 32 * (2 + 2 * 6));
        assert_eq!(encoded[31], 0x20);
        assert_eq!(encoded[63], 2);
        // first tuple: address word, then g2 x_c0
        assert_eq!(encoded[64..76], [0u8; 12]);
        assert_eq!(encoded[76..96], [1u8; 20]);
        assert_eq!(encoded[96..128], G2_GENERATOR[0..32]);
        assert_eq!(encoded[224..256], word_from_u128(1000));
    }

    #[test]
    fn test_validator_set_hash_depends_on_order() {
        let a = ValidatorSet::new(vec![entry(1, 1000), entry(2, 1000)]);
        let b = ValidatorSet::new(vec![entry(2, 1000), entry(1, 1000)]);
        assert_ne!(hash_validator_set(&a), hash_validator_set(&b));
        assert_eq!(hash_validator_set(&a), hash_validator_set(&a.clone()));
    }

    #[test]
    fn test_validator_set_hash_ignores_g1_key() {
        let a = ValidatorSet::new(vec![entry(1, 1000)]);
        let mut other = entry(1, 1000);
        other.g1_public_key = [0u8; 64];
        let b = ValidatorSet::new(vec![other]);
        assert_eq!(hash_validator_set(&a), hash_validator_set(&b));
    }

    #[test]
    fn test_checkpoint_digest_binds_every_field() {
        let header = CheckpointHeader {
            epoch: 1,
            block_number: 10,
            event_root: [3u8; 32],
        };
        let metadata = CheckpointMetadata {
            block_hash: [4u8; 32],
            block_round: 0,
            current_validator_set_hash: [5u8; 32],
        };
        let vs_hash = [6u8; 32];
        let base = checkpoint_digest(1, &header, &metadata, &vs_hash);

        assert_ne!(base, checkpoint_digest(2, &header, &metadata, &vs_hash));
        assert_ne!(base, checkpoint_digest(1, &header, &metadata, &[7u8; 32]));

        let mut h = header.clone();
        h.epoch = 2;
        assert_ne!(base, checkpoint_digest(1, &h, &metadata, &vs_hash));

        let mut m = metadata.clone();
        m.block_round = 1;
        assert_ne!(base, checkpoint_digest(1, &header, &m, &vs_hash));
    }

    #[test]
    fn test_checkpoint_digest_is_keccak_of_eight_words() {
        let header = CheckpointHeader {
            epoch: 5,
            block_number: 9,
            event_root: [0x11; 32],
        };
        let metadata = CheckpointMetadata {
            block_hash: [0x22; 32],
            block_round: 3,
            current_validator_set_hash: [0x33; 32],
        };
        let mut buf = Vec::new();
        buf.extend_from_slice(&word_from_u64(1));
        buf.extend_from_slice(&word_from_u64(9));
        buf.extend_from_slice(&[0x22; 32]);
        buf.extend_from_slice(&word_from_u64(3));
        buf.extend_from_slice(&word_from_u64(5));
        buf.extend_from_slice(&[0x11; 32]);
        buf.extend_from_slice(&[0x33; 32]);
        buf.extend_from_slice(&[0x44; 32]);

        assert_eq!(
            checkpoint_digest(1, &header, &metadata, &[0x44; 32]),
            keccak256(&buf)
        );
    }

    #[test]
    fn test_feed_digest_is_packed() {
        let root = [9u8; 32];
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(&root);
        buf[63] = 2;
        assert_eq!(feed_digest(&root, 2), keccak256(&buf));
    }
}
