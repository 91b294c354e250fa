//! BLS keys, signing, aggregation and pairing verification
//!
//! Signatures live in G1 and public keys in G2. Every validator also holds
//! the G1 image of the same secret, which `combined_verify` ties to the G2
//! key with a single Fiat-Shamir combined pairing.

extern crate alloc;
use alloc::vec::Vec;

use core::fmt;

use ark_bn254::Fr;
use ark_ec::AffineRepr;
use ark_ff::{PrimeField, Zero};
use rand::{CryptoRng, RngCore};

use crate::curve::CurveContext;
use crate::errors::{Bn254Error, KeyError};
use crate::field::{fr_from_be, fr_to_be};
use crate::hash::{hash_to_curve, validate_domain};
use crate::ops::{g1_add, g1_msm, g1_mul, g1_sum, pairing_check};
use crate::transcript::Transcript;
use crate::types::{Scalar, G1, G1_GENERATOR, G2, G2_GENERATOR_NEG};

/// A validator's secret scalar. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Fr);

impl SecretKey {
    /// Interpret 32 big-endian bytes as a secret, reducing mod r.
    pub fn from_be_bytes(bytes: &Scalar) -> Self {
        SecretKey(fr_from_be(bytes))
    }

    pub fn to_be_bytes(&self) -> Scalar {
        fr_to_be(&self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub(crate) fn scalar(&self) -> &Fr {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// A secret with its public images in both groups.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret: SecretKey,
    pub g1_public_key: G1,
    pub g2_public_key: G2,
}

/// One `(signature, public key, message)` triple for batch verification.
#[derive(Debug, Clone, Copy)]
pub struct BatchItem<'a> {
    pub signature: G1,
    pub public_key: G2,
    pub message: &'a [u8],
}

/// Draw a fresh keypair from `rng`.
///
/// 64 random bytes are reduced mod r, which leaves a bias far below 2^-128.
pub fn new_keypair<R: RngCore + CryptoRng>(ctx: &CurveContext, rng: &mut R) -> KeyPair {
    loop {
        let mut wide = [0u8; 64];
        rng.fill_bytes(&mut wide);
        let secret = Fr::from_be_bytes_mod_order(&wide);
        if !secret.is_zero() {
            return keypair_from_secret(ctx, SecretKey(secret));
        }
    }
}

/// Draw a fresh keypair from the operating system's CSPRNG.
pub fn new_keypair_os(ctx: &CurveContext) -> KeyPair {
    new_keypair(ctx, &mut rand::rngs::OsRng)
}

/// Derive both public keys of a known secret.
pub fn keypair_from_secret(ctx: &CurveContext, secret: SecretKey) -> KeyPair {
    let g1_public_key = ctx.g1_mul_generator(secret.scalar());
    let g2_public_key = ctx.g2_mul_generator(secret.scalar());
    KeyPair {
        secret,
        g1_public_key,
        g2_public_key,
    }
}

/// secret · H(message)
pub fn sign(
    ctx: &CurveContext,
    secret: &SecretKey,
    message: &[u8],
    domain: &[u8],
) -> Result<G1, KeyError> {
    let hash_point = hash_to_curve(ctx, message, domain)?;
    Ok(g1_mul(&hash_point, &secret.to_be_bytes())?)
}

/// Sum of signatures; the empty list aggregates to the identity.
pub fn aggregate_signatures(ctx: &CurveContext, signatures: &[G1]) -> Result<G1, KeyError> {
    for signature in signatures {
        decode_signature(ctx, signature)?;
    }
    Ok(g1_sum(signatures)?)
}

/// Sum of G2 public keys; the empty list aggregates to the identity.
pub fn aggregate_public_keys(ctx: &CurveContext, public_keys: &[G2]) -> Result<G2, KeyError> {
    ctx.g2_sum(public_keys).map_err(|err| match err {
        Bn254Error::InvalidG2 => KeyError::InvalidPublicKeyPoint,
        other => KeyError::Bn254(other),
    })
}

/// Check e(σ, G2) == e(H(m), pk), evaluated as e(σ, -G2) · e(H(m), pk) == 1.
pub fn verify(
    ctx: &CurveContext,
    signature: &G1,
    public_key: &G2,
    message: &[u8],
    domain: &[u8],
) -> Result<bool, KeyError> {
    validate_domain(domain)?;
    decode_signature(ctx, signature)?;
    decode_g2_public_key(ctx, public_key)?;

    let hash_point = hash_to_curve(ctx, message, domain)?;
    Ok(pairing_check(&[
        (*signature, G2_GENERATOR_NEG),
        (hash_point, *public_key),
    ])?)
}

/// Verify a signature and that `pk1` (G1) and `pk2` (G2) share one secret.
///
/// With γ = keccak256(H ‖ pk1 ‖ pk2 ‖ σ) mod p, checks
/// e(σ + γ·pk1, G2) == e(H + γ·G1, pk2).
pub fn combined_verify(
    ctx: &CurveContext,
    pk1: &G1,
    signature: &G1,
    message: &[u8],
    pk2: &G2,
    domain: &[u8],
) -> Result<bool, KeyError> {
    validate_domain(domain)?;
    decode_g1_public_key(ctx, pk1)?;
    decode_signature(ctx, signature)?;
    decode_g2_public_key(ctx, pk2)?;

    let hash_point = hash_to_curve(ctx, message, domain)?;
    let gamma = combined_challenge(&hash_point, pk1, pk2, signature);
    crate::dbg_scalar!("gamma", &gamma);

    let lhs = g1_add(signature, &g1_mul(pk1, &gamma)?)?;
    let rhs = g1_add(&hash_point, &g1_mul(&G1_GENERATOR, &gamma)?)?;

    Ok(pairing_check(&[(lhs, G2_GENERATOR_NEG), (rhs, *pk2)])?)
}

/// The Fiat-Shamir challenge binding message point, both keys and signature.
pub fn combined_challenge(hash_point: &G1, pk1: &G1, pk2: &G2, signature: &G1) -> [u8; 32] {
    let mut transcript = Transcript::new();
    transcript.append_g1(hash_point);
    transcript.append_g1(pk1);
    transcript.append_g2(pk2);
    transcript.append_g1(signature);
    transcript.base_field_challenge()
}

/// Verify many independent signatures with one multi-pairing.
///
/// Each triple is weighted by a coefficient drawn from a transcript over all
/// of them, then checked as
/// e(Σ cᵢσᵢ, -G2) · Πᵢ e(cᵢHᵢ, pkᵢ) == 1.
/// A `false` result says only that at least one triple is invalid.
pub fn batch_verify(
    ctx: &CurveContext,
    items: &[BatchItem<'_>],
    domain: &[u8],
) -> Result<bool, KeyError> {
    validate_domain(domain)?;
    if items.is_empty() {
        return Ok(true);
    }

    let mut transcript = Transcript::new();
    let mut hash_points = Vec::with_capacity(items.len());
    for item in items {
        decode_signature(ctx, &item.signature)?;
        decode_g2_public_key(ctx, &item.public_key)?;

        let hash_point = hash_to_curve(ctx, item.message, domain)?;
        transcript.append_g1(&item.signature);
        transcript.append_g2(&item.public_key);
        transcript.append_g1(&hash_point);
        hash_points.push(hash_point);
    }

    let coefficients: Vec<Scalar> = items.iter().map(|_| transcript.challenge()).collect();
    let signatures: Vec<G1> = items.iter().map(|item| item.signature).collect();
    let combined_signature = g1_msm(&signatures, &coefficients)?;

    let mut pairs = Vec::with_capacity(items.len() + 1);
    pairs.push((combined_signature, G2_GENERATOR_NEG));
    for ((item, hash_point), coefficient) in items.iter().zip(&hash_points).zip(&coefficients) {
        pairs.push((g1_mul(hash_point, coefficient)?, item.public_key));
    }

    Ok(pairing_check(&pairs)?)
}

fn decode_signature(ctx: &CurveContext, signature: &G1) -> Result<(), KeyError> {
    ctx.decode_g1(signature)
        .map(|_| ())
        .map_err(|_| KeyError::InvalidSignaturePoint)
}

fn decode_g1_public_key(ctx: &CurveContext, public_key: &G1) -> Result<(), KeyError> {
    let point = ctx
        .decode_g1(public_key)
        .map_err(|_| KeyError::InvalidPublicKeyPoint)?;
    if point.is_zero() {
        return Err(KeyError::InvalidPublicKeyPoint);
    }
    Ok(())
}

fn decode_g2_public_key(ctx: &CurveContext, public_key: &G2) -> Result<(), KeyError> {
    let point = ctx
        .decode_g2(public_key)
        .map_err(|_| KeyError::InvalidPublicKeyPoint)?;
    if point.is_zero() {
        return Err(KeyError::InvalidPublicKeyPoint);
    }
    Ok(())
}
