//! Field element encodings for BN254
//!
//! Converts between 32-byte big-endian words (the ABI / alt_bn128 layout)
//! and arkworks field elements, and reduces raw 256-bit words modulo the
//! scalar field order r or the base field order p.

use ark_bn254::{Fq, Fr};
use ark_ff::{BigInt, PrimeField};

use crate::types::{Scalar, SCALAR_ZERO};

/// BN254 scalar field modulus r (little-endian limbs)
/// r = 21888242871839275222246405745257275088548364400416034343698204186575808495617
pub const R: [u64; 4] = [
    0x43e1f593f0000001,
    0x2833e84879b97091,
    0xb85045b68181585d,
    0x30644e72e131a029,
];

/// BN254 base field modulus p (little-endian limbs)
/// p = 21888242871839275222246405745257275088696311157297823662689037894645226208583
pub const P: [u64; 4] = [
    0x3c208c16d87cfd47,
    0x97816a916871ca8d,
    0xb85045b68181585d,
    0x30644e72e131a029,
];

/// (p + 1) / 4, the square-root exponent for p ≡ 3 (mod 4)
pub const P_PLUS_ONE_DIV_FOUR: [u64; 4] = [
    0x4f082305b61f3f52,
    0x65e05aa45a1c72a3,
    0x6e14116da0605617,
    0x0c19139cb84c680a,
];

/// Convert 32-byte big-endian word to 4 x u64 limbs (little-endian limbs)
#[inline]
pub fn be_to_limbs(word: &[u8; 32]) -> [u64; 4] {
    let mut limbs = [0u64; 4];
    for (i, limb) in limbs.iter_mut().enumerate() {
        let start = 32 - (i + 1) * 8;
        let mut chunk = [0u8; 8];
        chunk.copy_from_slice(&word[start..start + 8]);
        *limb = u64::from_be_bytes(chunk);
    }
    limbs
}

/// Convert 4 x u64 limbs (little-endian) to a 32-byte big-endian word
#[inline]
pub fn limbs_to_be(limbs: &[u64; 4]) -> [u8; 32] {
    let mut word = [0u8; 32];
    for (i, limb) in limbs.iter().enumerate() {
        let start = 32 - (i + 1) * 8;
        word[start..start + 8].copy_from_slice(&limb.to_be_bytes());
    }
    word
}

/// Reduce a 256-bit big-endian word modulo `modulus`.
///
/// Both moduli are ~254 bits, so a 256-bit input needs at most 6 subtractions.
pub fn reduce_word(word: &[u8; 32], modulus: &[u64; 4]) -> [u8; 32] {
    let mut limbs = be_to_limbs(word);
    loop {
        let (result, borrow) = sbb_limbs(&limbs, modulus);
        if borrow != 0 {
            break;
        }
        limbs = result;
    }
    limbs_to_be(&limbs)
}

/// Reduce a 256-bit word mod r
pub fn fr_reduce(word: &[u8; 32]) -> Scalar {
    reduce_word(word, &R)
}

/// Reduce a 256-bit word mod p
pub fn fq_reduce(word: &[u8; 32]) -> [u8; 32] {
    reduce_word(word, &P)
}

/// Whether a big-endian word is strictly below `modulus`
pub fn is_canonical(word: &[u8; 32], modulus: &[u64; 4]) -> bool {
    let (_, borrow) = sbb_limbs(&be_to_limbs(word), modulus);
    borrow != 0
}

/// Parse a canonical base-field element. Returns None if `word >= p`.
pub fn fq_from_be(word: &[u8; 32]) -> Option<Fq> {
    if !is_canonical(word, &P) {
        return None;
    }
    Fq::from_bigint(BigInt::new(be_to_limbs(word)))
}

/// Serialize a base-field element as a 32-byte big-endian word
pub fn fq_to_be(value: &Fq) -> [u8; 32] {
    limbs_to_be(&value.into_bigint().0)
}

/// Interpret a big-endian word as a scalar, reducing mod r
pub fn fr_from_be(word: &[u8; 32]) -> Fr {
    let reduced = fr_reduce(word);
    Fr::from_bigint(BigInt::new(be_to_limbs(&reduced))).unwrap_or_default()
}

/// Serialize a scalar-field element as a 32-byte big-endian word
pub fn fr_to_be(value: &Fr) -> Scalar {
    limbs_to_be(&value.into_bigint().0)
}

/// Convert u64 to a 32-byte big-endian word
pub fn word_from_u64(val: u64) -> [u8; 32] {
    let mut word = SCALAR_ZERO;
    word[24..32].copy_from_slice(&val.to_be_bytes());
    word
}

/// Convert u128 to a 32-byte big-endian word
pub fn word_from_u128(val: u128) -> [u8; 32] {
    let mut word = SCALAR_ZERO;
    word[16..32].copy_from_slice(&val.to_be_bytes());
    word
}

/// Subtract with borrow, returning (result, borrow)
#[inline]
fn sbb_limbs(a: &[u64; 4], b: &[u64; 4]) -> ([u64; 4], u64) {
    let mut result = [0u64; 4];
    let mut borrow = 0u64;

    for i in 0..4 {
        let (diff1, borrow1) = a[i].overflowing_sub(b[i]);
        let (diff2, borrow2) = diff1.overflowing_sub(borrow);
        result[i] = diff2;
        borrow = (borrow1 as u64) | (borrow2 as u64);
    }

    (result, borrow)
}
