//! BN254 G1 arithmetic and pairing checks through the alt_bn128 interface
//!
//! `solana-bn254` exposes the same byte contract as the EVM precompiles
//! (EIP-196 / EIP-197), so everything computed here matches what an
//! on-chain verifier computes for the same inputs.

use crate::errors::Bn254Error;
use crate::types::{Scalar, G1, G1_IDENTITY, G2};
use solana_bn254::prelude::{
    alt_bn128_g1_addition_be, alt_bn128_g1_multiplication_be, alt_bn128_pairing_be,
};

extern crate alloc;
use alloc::format;
use alloc::vec::Vec;

/// Performs G1 addition using alt_bn128_g1_addition_be.
pub fn g1_add(a: &G1, b: &G1) -> Result<G1, Bn254Error> {
    let mut input = [0u8; 128];
    input[..64].copy_from_slice(a);
    input[64..].copy_from_slice(b);

    let result = alt_bn128_g1_addition_be(&input)
        .map_err(|e| Bn254Error::SyscallError(format!("G1 addition failed: {:?}", e)))?;

    to_g1(&result)
}

/// Performs G1 scalar multiplication using alt_bn128_g1_multiplication_be.
///
/// The scalar may be any 256-bit value; the group order reduces it.
pub fn g1_mul(point: &G1, scalar: &Scalar) -> Result<G1, Bn254Error> {
    let mut input = [0u8; 96];
    input[..64].copy_from_slice(point);
    input[64..].copy_from_slice(scalar);

    let result = alt_bn128_g1_multiplication_be(&input)
        .map_err(|e| Bn254Error::SyscallError(format!("G1 multiplication failed: {:?}", e)))?;

    to_g1(&result)
}

/// Sum of a list of G1 points. The empty sum is the identity.
pub fn g1_sum(points: &[G1]) -> Result<G1, Bn254Error> {
    let mut acc = G1_IDENTITY;
    for point in points {
        acc = g1_add(&acc, point)?;
    }
    Ok(acc)
}

/// Performs a multi-scalar multiplication (MSM) for G1 points.
/// Computes ∑ scalars[i] * points[i]
pub fn g1_msm(points: &[G1], scalars: &[Scalar]) -> Result<G1, Bn254Error> {
    if points.len() != scalars.len() {
        return Err(Bn254Error::InvalidG1);
    }

    let mut acc = G1_IDENTITY;
    for (point, scalar) in points.iter().zip(scalars) {
        let term = g1_mul(point, scalar)?;
        acc = g1_add(&acc, &term)?;
    }

    Ok(acc)
}

/// Reorder an ABI-ordered G2 point (x_c0, x_c1, y_c0, y_c1) into the
/// EIP-197 layout (x_c1, x_c0, y_c1, y_c0) the pairing interface expects.
pub fn g2_to_eip197(point: &G2) -> [u8; 128] {
    let mut out = [0u8; 128];
    out[0..32].copy_from_slice(&point[32..64]);
    out[32..64].copy_from_slice(&point[0..32]);
    out[64..96].copy_from_slice(&point[96..128]);
    out[96..128].copy_from_slice(&point[64..96]);
    out
}

/// Performs a multi-pairing check using alt_bn128_pairing_be.
/// Returns true if ∏ e(a_i, b_i) == 1 (identity in GT)
///
/// G2 inputs are ABI-ordered; they are converted to EIP-197 order here.
pub fn pairing_check(pairs: &[(G1, G2)]) -> Result<bool, Bn254Error> {
    if pairs.is_empty() {
        return Ok(true);
    }

    let mut input = Vec::with_capacity(pairs.len() * 192);
    for (g1, g2) in pairs {
        input.extend_from_slice(g1);
        input.extend_from_slice(&g2_to_eip197(g2));
    }

    let result = alt_bn128_pairing_be(&input)
        .map_err(|e| Bn254Error::SyscallError(format!("Pairing check failed: {:?}", e)))?;

    // 32-byte word, 0x01 in the last byte if the check passes
    if result.len() != 32 {
        return Err(Bn254Error::PairingFailed);
    }

    Ok(result[31] == 1)
}

fn to_g1(bytes: &[u8]) -> Result<G1, Bn254Error> {
    if bytes.len() != 64 {
        return Err(Bn254Error::SyscallError(format!(
            "unexpected G1 output length {}",
            bytes.len()
        )));
    }
    let mut out = [0u8; 64];
    out.copy_from_slice(bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::word_from_u64;
    use crate::types::{G1_GENERATOR, G2_GENERATOR, G2_GENERATOR_NEG};

    #[test]
    fn test_g1_add_matches_mul() {
        let doubled = g1_add(&G1_GENERATOR, &G1_GENERATOR).unwrap();
        let times_two = g1_mul(&G1_GENERATOR, &word_from_u64(2)).unwrap();
        assert_eq!(doubled, times_two);
    }

    #[test]
    fn test_g1_mul_by_zero_is_identity() {
        assert_eq!(g1_mul(&G1_GENERATOR, &[0u8; 32]).unwrap(), G1_IDENTITY);
        assert_eq!(g1_add(&G1_GENERATOR, &G1_IDENTITY).unwrap(), G1_GENERATOR);
    }

    #[test]
    fn test_g1_msm() {
        let points = [G1_GENERATOR, G1_GENERATOR];
        let scalars = [word_from_u64(3), word_from_u64(4)];
        let msm = g1_msm(&points, &scalars).unwrap();
        assert_eq!(msm, g1_mul(&G1_GENERATOR, &word_from_u64(7)).unwrap());
        assert!(g1_msm(&points, &scalars[..1]).is_err());
    }

    #[test]
    fn test_g2_to_eip197_swaps_coefficients() {
        let eip = g2_to_eip197(&G2_GENERATOR);
        assert_eq!(eip[0..32], G2_GENERATOR[32..64]);
        assert_eq!(eip[96..128], G2_GENERATOR[64..96]);
    }

    #[test]
    fn test_pairing_generator_cancels() {
        // e(G1, G2) * e(G1, -G2) == 1
        let ok = pairing_check(&[(G1_GENERATOR, G2_GENERATOR), (G1_GENERATOR, G2_GENERATOR_NEG)])
            .unwrap();
        assert!(ok);

        let bad = pairing_check(&[(G1_GENERATOR, G2_GENERATOR), (G1_GENERATOR, G2_GENERATOR)])
            .unwrap();
        assert!(!bad);
    }
}
