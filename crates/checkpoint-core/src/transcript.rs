//! Fiat-Shamir transcript using Keccak256
//!
//! Absorbs ABI words (32-byte big-endian) so a transcript over static values
//! hashes exactly like `keccak256(abi.encode(...))` of the same values.
//! Each challenge resets the hasher and re-absorbs the reduced challenge,
//! chaining successive challenges.

use crate::field::{fq_reduce, fr_reduce};
use crate::types::{Scalar, G1, G2};
use sha3::{Digest, Keccak256};

/// Transcript for Fiat-Shamir challenge generation
pub struct Transcript {
    hasher: Keccak256,
}

impl Transcript {
    /// Create a new empty transcript
    pub fn new() -> Self {
        Self {
            hasher: Keccak256::new(),
        }
    }

    /// Append a u64 value (as 32-byte big-endian)
    pub fn append_u64(&mut self, val: u64) {
        let mut bytes = [0u8; 32];
        bytes[24..32].copy_from_slice(&val.to_be_bytes());
        self.hasher.update(bytes);
    }

    /// Append a 32-byte word
    pub fn append_word(&mut self, word: &[u8; 32]) {
        self.hasher.update(word);
    }

    /// Append a G1 point: x || y, 64 bytes.
    pub fn append_g1(&mut self, point: &G1) {
        self.hasher.update(point);
    }

    /// Append a G2 point in ABI order (x_c0, x_c1, y_c0, y_c1).
    pub fn append_g2(&mut self, point: &G2) {
        self.hasher.update(point);
    }

    /// Append raw bytes to the transcript
    pub fn append_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    fn raw_hash(&mut self) -> [u8; 32] {
        let hash = self.hasher.finalize_reset();
        let mut out = [0u8; 32];
        out.copy_from_slice(&hash);
        crate::trace!("transcript raw_hash = {:02x?}", &out[0..8]);
        out
    }

    /// Challenge reduced mod r, usable directly as a scalar.
    pub fn challenge(&mut self) -> Scalar {
        let challenge = fr_reduce(&self.raw_hash());
        self.hasher.update(challenge);
        challenge
    }

    /// Challenge reduced mod p.
    ///
    /// The anti-rogue-key check derives its challenge this way; the value is
    /// then applied as a scalar, which reduces it mod r a second time.
    pub fn base_field_challenge(&mut self) -> [u8; 32] {
        let challenge = fq_reduce(&self.raw_hash());
        self.hasher.update(challenge);
        challenge
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{is_canonical, word_from_u64, P, R};

    #[test]
    fn test_transcript_deterministic() {
        let mut t1 = Transcript::new();
        let mut t2 = Transcript::new();

        t1.append_bytes(b"hello");
        t2.append_bytes(b"hello");

        assert_eq!(t1.challenge(), t2.challenge());
    }

    #[test]
    fn test_transcript_different_inputs() {
        let mut t1 = Transcript::new();
        let mut t2 = Transcript::new();

        t1.append_bytes(b"hello");
        t2.append_bytes(b"world");

        assert_ne!(t1.challenge(), t2.challenge());
    }

    #[test]
    fn test_append_u64_is_abi_word() {
        let mut t1 = Transcript::new();
        let mut t2 = Transcript::new();

        t1.append_u64(12345);
        t2.append_word(&word_from_u64(12345));

        assert_eq!(t1.challenge(), t2.challenge());
    }

    #[test]
    fn test_challenges_are_reduced() {
        let mut t = Transcript::new();
        t.append_bytes(b"test");
        for _ in 0..8 {
            assert!(is_canonical(&t.challenge(), &R));
            assert!(is_canonical(&t.base_field_challenge(), &P));
        }
    }

    #[test]
    fn test_challenges_chain() {
        let mut t = Transcript::new();
        t.append_bytes(b"chain");
        let first = t.challenge();
        let second = t.challenge();
        assert_ne!(first, second);

        // the second challenge only depends on the first
        let mut fresh = Transcript::new();
        fresh.append_word(&first);
        assert_eq!(fresh.challenge(), second);
    }

    #[test]
    fn test_base_field_challenge_matches_keccak_of_words() {
        let mut t = Transcript::new();
        t.append_u64(1);
        t.append_u64(2);

        let mut buf = [0u8; 64];
        buf[31] = 1;
        buf[63] = 2;
        let mut expected = [0u8; 32];
        expected.copy_from_slice(&Keccak256::digest(buf));

        assert_eq!(t.base_field_challenge(), fq_reduce(&expected));
    }
}
