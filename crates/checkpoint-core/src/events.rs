//! Event leaf encodings
//!
//! A checkpoint's event root commits to keccak256 of each event's ABI
//! encoding. Two event shapes exist: oracle rate updates and bridged
//! messages, and a bridged message may itself carry a rate update.

extern crate alloc;
use alloc::vec::Vec;

use crate::codec::{abi_encode, address_word, keccak256, Token};
use crate::field::{word_from_u128, word_from_u64};
use crate::types::{Address, Digest};

/// `abi.encode(uint16 symbol, uint256 rate, uint64 timestamp)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateUpdate {
    pub symbol: u16,
    pub rate: u128,
    pub timestamp: u64,
}

impl RateUpdate {
    pub fn encode(&self) -> Vec<u8> {
        abi_encode(&[
            Token::Word(word_from_u64(self.symbol as u64)),
            Token::Word(word_from_u128(self.rate)),
            Token::Word(word_from_u64(self.timestamp)),
        ])
    }

    pub fn leaf_hash(&self) -> Digest {
        keccak256(&self.encode())
    }
}

/// `abi.encode(uint256 id, address sender, address receiver, bytes data)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgedMessage {
    pub id: u64,
    pub sender: Address,
    pub receiver: Address,
    pub data: Vec<u8>,
}

impl BridgedMessage {
    /// A bridged message whose payload is an encoded rate update.
    pub fn with_rate(id: u64, sender: Address, receiver: Address, rate: &RateUpdate) -> Self {
        Self {
            id,
            sender,
            receiver,
            data: rate.encode(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        abi_encode(&[
            Token::Word(word_from_u64(self.id)),
            Token::Word(address_word(&self.sender)),
            Token::Word(address_word(&self.receiver)),
            Token::Bytes(self.data.clone()),
        ])
    }

    pub fn leaf_hash(&self) -> Digest {
        keccak256(&self.encode())
    }
}

/// Any event that can sit under an event root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Rate(RateUpdate),
    Message(BridgedMessage),
}

impl Event {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Event::Rate(rate) => rate.encode(),
            Event::Message(message) => message.encode(),
        }
    }

    pub fn leaf_hash(&self) -> Digest {
        keccak256(&self.encode())
    }
}

impl From<RateUpdate> for Event {
    fn from(rate: RateUpdate) -> Self {
        Event::Rate(rate)
    }
}

impl From<BridgedMessage> for Event {
    fn from(message: BridgedMessage) -> Self {
        Event::Message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_update_encoding() {
        let rate = RateUpdate {
            symbol: 1,
            rate: 64000,
            timestamp: 20398409483,
        };
        let encoded = rate.encode();
        assert_eq!(encoded.len(), 96);
        assert_eq!(encoded[31], 1);
        assert_eq!(encoded[32..64], word_from_u128(64000));
        assert_eq!(encoded[64..96], word_from_u64(20398409483));
        assert_eq!(rate.leaf_hash(), keccak256(&encoded));
    }

    #[test]
    fn test_bridged_message_layout() {
        let rate = RateUpdate {
            symbol: 2,
            rate: 3000,
            timestamp: 7,
        };
        let msg = BridgedMessage::with_rate(0, [0xaa; 20], [0xbb; 20], &rate);
        let encoded = msg.encode();

        // 4 head words, length word, 3 payload words
        assert_eq!(encoded.len(), 32 * 8);
        assert_eq!(encoded[44..64], [0xaa; 20]);
        assert_eq!(encoded[76..96], [0xbb; 20]);
        assert_eq!(encoded[127], 0x80);
        assert_eq!(encoded[159], 96);
        assert_eq!(encoded[160..], rate.encode()[..]);
    }

    #[test]
    fn test_event_leaf_hash_dispatch() {
        let rate = RateUpdate {
            symbol: 1,
            rate: 1,
            timestamp: 1,
        };
        assert_eq!(Event::from(rate).leaf_hash(), rate.leaf_hash());
        let msg = BridgedMessage::with_rate(3, [1; 20], [2; 20], &rate);
        assert_eq!(Event::from(msg.clone()).leaf_hash(), msg.leaf_hash());
        assert_ne!(msg.leaf_hash(), rate.leaf_hash());
    }
}
