//! Verifier configuration

use core::fmt;
use core::str::FromStr;

use crate::bitmap::BitmapConvention;
use crate::codec::keccak256;
use crate::errors::VerifyError;
use crate::types::Digest;

/// Application label the default domain is derived from
pub const DEFAULT_DOMAIN_LABEL: &str = "EORACLE_FEED_VERIFIER";

/// Domain separation tag for an application label: keccak256(label).
pub fn domain_from_label(label: &str) -> Digest {
    keccak256(label.as_bytes())
}

/// Required share of total voting power, as a fraction in (0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quorum {
    numerator: u32,
    denominator: u32,
}

impl Quorum {
    pub const TWO_THIRDS: Quorum = Quorum {
        numerator: 2,
        denominator: 3,
    };

    /// `None` unless `0 < numerator <= denominator`.
    pub const fn new(numerator: u32, denominator: u32) -> Option<Self> {
        if numerator == 0 || numerator > denominator {
            return None;
        }
        Some(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// `signed / total >= numerator / denominator`, cross-multiplied.
    ///
    /// Zero total power never reaches quorum; `None` on overflow.
    pub fn is_met(&self, signed: u128, total: u128) -> Option<bool> {
        if total == 0 {
            return Some(false);
        }
        let lhs = signed.checked_mul(self.denominator as u128)?;
        let rhs = total.checked_mul(self.numerator as u128)?;
        Some(lhs >= rhs)
    }
}

impl Default for Quorum {
    fn default() -> Self {
        Quorum::TWO_THIRDS
    }
}

/// The 32-byte message the committee signs for a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignedMessage {
    /// Digest of chain id, header, metadata and validator-set hash
    #[default]
    CheckpointDigest,
    /// `keccak256(event_root || block_number)` of the rate-feed flow
    FeedDigest,
}

impl fmt::Display for SignedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignedMessage::CheckpointDigest => write!(f, "checkpoint"),
            SignedMessage::FeedDigest => write!(f, "feed"),
        }
    }
}

impl FromStr for SignedMessage {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checkpoint" => Ok(SignedMessage::CheckpointDigest),
            "feed" => Ok(SignedMessage::FeedDigest),
            _ => Err(VerifyError::SignatureVerificationFailed),
        }
    }
}

/// Per-deployment verification parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    pub chain_id: u64,
    pub domain: Digest,
    pub convention: BitmapConvention,
    pub quorum: Quorum,
    pub signed_message: SignedMessage,
    /// Reject bitmaps shorter than ceil(n / 8) instead of zero-extending
    pub strict_bitmap_length: bool,
    /// Trusted committee hash; checked before any pairing work
    pub expected_validator_set_hash: Option<Digest>,
}

impl VerifierConfig {
    pub fn new(chain_id: u64, domain: Digest, convention: BitmapConvention) -> Self {
        Self {
            chain_id,
            domain,
            convention,
            quorum: Quorum::default(),
            signed_message: SignedMessage::default(),
            strict_bitmap_length: false,
            expected_validator_set_hash: None,
        }
    }

    pub fn with_quorum(mut self, quorum: Quorum) -> Self {
        self.quorum = quorum;
        self
    }

    pub fn with_signed_message(mut self, signed_message: SignedMessage) -> Self {
        self.signed_message = signed_message;
        self
    }

    pub fn with_strict_bitmap_length(mut self, strict: bool) -> Self {
        self.strict_bitmap_length = strict;
        self
    }

    pub fn with_expected_validator_set_hash(mut self, hash: Digest) -> Self {
        self.expected_validator_set_hash = Some(hash);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_thirds_boundaries() {
        let q = Quorum::TWO_THIRDS;
        assert_eq!(q.is_met(12_000, 12_000), Some(true));
        assert_eq!(q.is_met(11_000, 12_000), Some(true));
        assert_eq!(q.is_met(8_000, 12_000), Some(true));
        assert_eq!(q.is_met(7_999, 12_000), Some(false));
        assert_eq!(q.is_met(1_000, 12_000), Some(false));
    }

    #[test]
    fn test_zero_total_never_met() {
        assert_eq!(Quorum::TWO_THIRDS.is_met(0, 0), Some(false));
    }

    #[test]
    fn test_quorum_overflow() {
        assert_eq!(Quorum::TWO_THIRDS.is_met(u128::MAX, u128::MAX), None);
    }

    #[test]
    fn test_quorum_new_bounds() {
        assert_eq!(Quorum::new(0, 0), None);
        assert_eq!(Quorum::new(0, 3), None);
        assert_eq!(Quorum::new(4, 3), None);
        assert_eq!(Quorum::new(2, 3), Some(Quorum::TWO_THIRDS));

        let all = Quorum::new(1, 1).unwrap();
        assert_eq!(all.is_met(11_999, 12_000), Some(false));
        assert_eq!(all.is_met(12_000, 12_000), Some(true));
    }

    #[test]
    fn test_signed_message_parse() {
        assert_eq!(
            "feed".parse::<SignedMessage>().unwrap(),
            SignedMessage::FeedDigest
        );
        assert_eq!(
            "checkpoint".parse::<SignedMessage>().unwrap(),
            SignedMessage::CheckpointDigest
        );
        assert_eq!(SignedMessage::FeedDigest.to_string(), "feed");
        assert!("digest".parse::<SignedMessage>().is_err());
    }

    #[test]
    fn test_domain_from_label() {
        let domain = domain_from_label(DEFAULT_DOMAIN_LABEL);
        assert_eq!(domain, keccak256(b"EORACLE_FEED_VERIFIER"));
        assert_ne!(domain, domain_from_label("OTHER"));
    }

    #[test]
    fn test_builder() {
        let config = VerifierConfig::new(1, [1; 32], BitmapConvention::Signers)
            .with_strict_bitmap_length(true)
            .with_expected_validator_set_hash([2; 32])
            .with_signed_message(SignedMessage::FeedDigest);
        assert_eq!(config.quorum, Quorum::TWO_THIRDS);
        assert_eq!(config.signed_message, SignedMessage::FeedDigest);
        assert!(config.strict_bitmap_length);
        assert_eq!(config.expected_validator_set_hash, Some([2; 32]));
    }
}
