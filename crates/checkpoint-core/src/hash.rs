//! Hash-to-field and hash-to-curve for BLS messages
//!
//! Messages are expanded with `expand_message_xmd` over SHA-256, split into
//! 48-byte chunks reduced mod p, and each field element is mapped to G1.
//! The message point is the sum of two independent maps, so no single
//! deterministic map output is ever used on its own.

extern crate alloc;
use alloc::vec::Vec;

use ark_bn254::{Fq, G1Affine};
use ark_ec::CurveGroup;
use ark_ff::PrimeField;
use sha2::{Digest as _, Sha256};

use crate::curve::CurveContext;
use crate::errors::KeyError;
use crate::types::G1;

/// Required domain separation tag length in bytes
pub const DOMAIN_LEN: usize = 32;

/// Bytes drawn per field element (ceil((254 + 128) / 8))
const FIELD_CHUNK_LEN: usize = 48;

/// SHA-256 block size, the zero padding prepended to the message
const SHA256_BLOCK_LEN: usize = 64;

const SHA256_OUT_LEN: usize = 32;

/// Reject any domain that is not exactly 32 bytes.
pub fn validate_domain(domain: &[u8]) -> Result<(), KeyError> {
    if domain.len() != DOMAIN_LEN {
        return Err(KeyError::InvalidDomainLength {
            actual: domain.len(),
        });
    }
    Ok(())
}

/// Longest tag and block count expand_message_xmd can encode in one byte
const XMD_MAX_BYTE: usize = 255;

/// expand_message_xmd with SHA-256.
///
/// `dst` must be 1 to 255 bytes and `out_len` at most 255 SHA-256 blocks.
pub fn expand_message_xmd(msg: &[u8], dst: &[u8], out_len: usize) -> Result<Vec<u8>, KeyError> {
    if dst.is_empty() || dst.len() > XMD_MAX_BYTE {
        return Err(KeyError::InvalidDomainLength { actual: dst.len() });
    }
    let ell = out_len.div_ceil(SHA256_OUT_LEN);
    if ell > XMD_MAX_BYTE {
        return Err(KeyError::ExpansionTooLong { requested: out_len });
    }

    let dst_len = [dst.len() as u8];
    let len_bytes = (out_len as u16).to_be_bytes();

    let b0 = Sha256::new()
        .chain_update([0u8; SHA256_BLOCK_LEN])
        .chain_update(msg)
        .chain_update(len_bytes)
        .chain_update([0u8])
        .chain_update(dst)
        .chain_update(dst_len)
        .finalize();

    let mut bi = Sha256::new()
        .chain_update(&b0)
        .chain_update([1u8])
        .chain_update(dst)
        .chain_update(dst_len)
        .finalize();

    let mut out = Vec::with_capacity(ell * SHA256_OUT_LEN);
    out.extend_from_slice(&bi);

    for i in 2..=ell as u8 {
        let mut mixed = [0u8; SHA256_OUT_LEN];
        for (m, (a, b)) in mixed.iter_mut().zip(b0.iter().zip(bi.iter())) {
            *m = a ^ b;
        }
        bi = Sha256::new()
            .chain_update(mixed)
            .chain_update([i])
            .chain_update(dst)
            .chain_update(dst_len)
            .finalize();
        out.extend_from_slice(&bi);
    }

    out.truncate(out_len);
    Ok(out)
}

/// Derive `count` base-field elements from `msg` under a 32-byte `domain`.
pub fn hash_to_field(domain: &[u8], msg: &[u8], count: usize) -> Result<Vec<Fq>, KeyError> {
    validate_domain(domain)?;
    let out_len = count
        .checked_mul(FIELD_CHUNK_LEN)
        .ok_or(KeyError::ExpansionTooLong { requested: usize::MAX })?;
    let expanded = expand_message_xmd(msg, domain, out_len)?;
    Ok(expanded
        .chunks_exact(FIELD_CHUNK_LEN)
        .map(Fq::from_be_bytes_mod_order)
        .collect())
}

/// Hash a message to a normalized G1 point.
pub fn hash_to_point(
    ctx: &CurveContext,
    msg: &[u8],
    domain: &[u8],
) -> Result<G1Affine, KeyError> {
    let elements = hash_to_field(domain, msg, 2)?;
    let p0 = ctx.map_to_point(&elements[0])?;
    let p1 = ctx.map_to_point(&elements[1])?;

    Ok((p0 + p1).into_affine())
}

/// Hash a message to G1 and return its encoding.
pub fn hash_to_curve(ctx: &CurveContext, msg: &[u8], domain: &[u8]) -> Result<G1, KeyError> {
    let point = hash_to_point(ctx, msg, domain)?;
    let encoded = ctx.encode_g1(&point);
    crate::dbg_g1!("hash_to_curve", &encoded);
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::AffineRepr;
    use hex_literal::hex;

    const DOMAIN: [u8; 32] = [7u8; 32];

    #[test]
    fn test_expand_message_xmd_rfc9380_vector() {
        // RFC 9380 K.1, expand_message_xmd(SHA-256), msg = "", len_in_bytes = 0x20
        let dst = b"QUUX-V01-CS02-with-expander-SHA256-128";
        let out = expand_message_xmd(b"", dst, 0x20).unwrap();
        assert_eq!(
            out,
            hex!("68a985b87eb6b46952128911f2a4412bbc302a9d759667f87f7a21d803f07235")
        );
    }

    #[test]
    fn test_expand_message_xmd_length() {
        assert_eq!(expand_message_xmd(b"abc", &DOMAIN, 96).unwrap().len(), 96);
        assert_eq!(expand_message_xmd(b"abc", &DOMAIN, 48).unwrap().len(), 48);
        // 255 blocks is the last length the counter byte can address
        assert_eq!(
            expand_message_xmd(b"abc", &DOMAIN, 255 * 32).unwrap().len(),
            255 * 32
        );
    }

    #[test]
    fn test_expand_message_xmd_rejects_oversized_output() {
        assert!(matches!(
            expand_message_xmd(b"abc", &DOMAIN, 255 * 32 + 1),
            Err(KeyError::ExpansionTooLong { requested: 8161 })
        ));
    }

    #[test]
    fn test_expand_message_xmd_rejects_bad_tag() {
        assert!(matches!(
            expand_message_xmd(b"abc", &[], 32),
            Err(KeyError::InvalidDomainLength { actual: 0 })
        ));
        assert!(matches!(
            expand_message_xmd(b"abc", &[1u8; 256], 32),
            Err(KeyError::InvalidDomainLength { actual: 256 })
        ));
    }

    #[test]
    fn test_hash_to_field_limits() {
        // 170 * 48 bytes still fits in 255 blocks, 171 does not
        assert_eq!(hash_to_field(&DOMAIN, b"m", 170).unwrap().len(), 170);
        assert!(matches!(
            hash_to_field(&DOMAIN, b"m", 171),
            Err(KeyError::ExpansionTooLong { .. })
        ));
        assert!(matches!(
            hash_to_field(&[1u8; 256], b"m", 2),
            Err(KeyError::InvalidDomainLength { actual: 256 })
        ));
        assert!(matches!(
            hash_to_field(&[], b"m", 2),
            Err(KeyError::InvalidDomainLength { actual: 0 })
        ));
    }

    #[test]
    fn test_hash_to_field_count() {
        let elements = hash_to_field(&DOMAIN, b"message", 2).unwrap();
        assert_eq!(elements.len(), 2);
        assert_ne!(elements[0], elements[1]);
    }

    #[test]
    fn test_hash_to_curve_rejects_bad_domain() {
        let ctx = CurveContext::init();
        let err = hash_to_curve(ctx, b"msg", &[0u8; 31]).unwrap_err();
        assert!(matches!(err, KeyError::InvalidDomainLength { actual: 31 }));
        assert!(hash_to_curve(ctx, b"msg", &[0u8; 33]).is_err());
    }

    #[test]
    fn test_hash_to_curve_is_valid_point() {
        let ctx = CurveContext::init();
        let point = hash_to_point(ctx, b"checkpoint", &DOMAIN).unwrap();
        assert!(!point.is_zero());
        assert!(point.is_on_curve());
        assert!(point.is_in_correct_subgroup_assuming_on_curve());
    }

    #[test]
    fn test_hash_to_curve_domain_separation() {
        let ctx = CurveContext::init();
        let a = hash_to_curve(ctx, b"checkpoint", &DOMAIN).unwrap();
        let b = hash_to_curve(ctx, b"checkpoint", &[8u8; 32]).unwrap();
        let c = hash_to_curve(ctx, b"checkpoint", &DOMAIN).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, c);
    }
}
