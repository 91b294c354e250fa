//! Attestation bitmaps and signer accounting
//!
//! Bit `i` of the bitmap (byte `i / 8`, bit `i % 8`, least significant
//! first) addresses validator `i`. Whether a set bit means "signed" or
//! "did not sign" is carried explicitly as a [`BitmapConvention`].

extern crate alloc;
use alloc::format;
use alloc::vec::Vec;

use crate::checkpoint::ValidatorSet;
use crate::curve::CurveContext;
use crate::errors::VerifyError;
use crate::keys::aggregate_public_keys;
use crate::types::G2;

/// Longest accepted bitmap in bytes
pub const MAX_BITMAP_LEN: usize = 512;

/// Largest committee a bitmap can address
pub const MAX_VALIDATORS: usize = MAX_BITMAP_LEN * 8;

/// Meaning of a set bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitmapConvention {
    /// A set bit marks a signer
    Signers,
    /// A set bit marks a validator that did not sign
    NonSigners,
}

impl BitmapConvention {
    /// Whether a validator with bit value `bit` is counted as a signer.
    #[inline]
    pub fn counts(self, bit: bool) -> bool {
        match self {
            BitmapConvention::Signers => bit,
            BitmapConvention::NonSigners => !bit,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BitmapConvention::Signers => "signers",
            BitmapConvention::NonSigners => "non-signers",
        }
    }
}

impl core::str::FromStr for BitmapConvention {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signers" => Ok(BitmapConvention::Signers),
            "non-signers" | "non_signers" | "nonsigners" => Ok(BitmapConvention::NonSigners),
            other => Err(VerifyError::MalformedBitmap(format!(
                "unknown bitmap convention {other:?}"
            ))),
        }
    }
}

impl core::fmt::Display for BitmapConvention {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The counted validators and their aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerSet {
    pub indices: Vec<usize>,
    pub aggregate_public_key: G2,
    pub aggregate_voting_power: u128,
}

impl SignerSet {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Bit `index` of `bitmap`; bytes past the end read as zero.
#[inline]
pub fn bit_at(bitmap: &[u8], index: usize) -> bool {
    match bitmap.get(index / 8) {
        Some(byte) => (byte >> (index % 8)) & 1 == 1,
        None => false,
    }
}

/// Reject bitmaps and committees that cannot be addressed.
///
/// With `strict_length`, a bitmap shorter than `ceil(n / 8)` is also
/// rejected instead of reading the missing bits as zero.
pub fn check_bitmap_shape(
    validator_count: usize,
    bitmap: &[u8],
    strict_length: bool,
) -> Result<(), VerifyError> {
    if validator_count > MAX_VALIDATORS {
        return Err(VerifyError::MalformedBitmap(format!(
            "committee of {validator_count} exceeds {MAX_VALIDATORS} validators"
        )));
    }
    if bitmap.len() > MAX_BITMAP_LEN {
        return Err(VerifyError::MalformedBitmap(format!(
            "bitmap of {} bytes exceeds {MAX_BITMAP_LEN}",
            bitmap.len()
        )));
    }
    let required = validator_count.div_ceil(8);
    if strict_length && bitmap.len() < required {
        return Err(VerifyError::MalformedBitmap(format!(
            "bitmap of {} bytes cannot address {validator_count} validators",
            bitmap.len()
        )));
    }
    Ok(())
}

/// Resolve which validators are counted, their aggregate G2 key and their
/// summed voting power.
///
/// Bits at positions `>= validator_set.len()` are ignored. An empty signer
/// set is returned as such; deciding that it fails is the caller's job.
pub fn resolve_signers(
    ctx: &CurveContext,
    validator_set: &ValidatorSet,
    bitmap: &[u8],
    convention: BitmapConvention,
) -> Result<SignerSet, VerifyError> {
    check_bitmap_shape(validator_set.len(), bitmap, false)?;

    let mut indices = Vec::new();
    let mut keys = Vec::new();
    let mut power = 0u128;

    for (index, validator) in validator_set.iter().enumerate() {
        if !convention.counts(bit_at(bitmap, index)) {
            continue;
        }
        indices.push(index);
        keys.push(validator.g2_public_key);
        power = power
            .checked_add(validator.voting_power)
            .ok_or(VerifyError::VotingPowerOverflow)?;
    }

    let aggregate_public_key = aggregate_public_keys(ctx, &keys)?;
    crate::dbg_g2!("aggregate_public_key", &aggregate_public_key);

    Ok(SignerSet {
        indices,
        aggregate_public_key,
        aggregate_voting_power: power,
    })
}

/// Build the bitmap for `participating` validators under `convention`.
///
/// The result is `ceil(n / 8)` bytes long (at least one byte).
pub fn encode_bitmap(
    validator_count: usize,
    participating: &[usize],
    convention: BitmapConvention,
) -> Vec<u8> {
    let len = validator_count.div_ceil(8).max(1);
    let mut bitmap = match convention {
        BitmapConvention::Signers => alloc::vec![0u8; len],
        BitmapConvention::NonSigners => {
            let mut all = alloc::vec![0u8; len];
            for index in 0..validator_count {
                all[index / 8] |= 1 << (index % 8);
            }
            all
        }
    };

    for &index in participating.iter().filter(|&&i| i < validator_count) {
        match convention {
            BitmapConvention::Signers => bitmap[index / 8] |= 1 << (index % 8),
            BitmapConvention::NonSigners => bitmap[index / 8] &= !(1 << (index % 8)),
        }
    }
    bitmap
}
