//! BN254 curve context
//!
//! `CurveContext` holds the curve parameters every operation needs (generators,
//! the constants of the field-to-curve map). It is built exactly once per
//! process by [`CurveContext::init`] and then shared read-only; callers pass
//! `&CurveContext` explicitly to every curve operation.
//!
//! Points cross this boundary as byte encodings (see `types`). Decoding
//! rejects non-canonical coordinates, points off the curve and points outside
//! the prime-order subgroup before any arithmetic happens.

use std::sync::OnceLock;

use ark_bn254::{Fq, Fq2, Fr, G1Affine, G2Affine, G2Projective};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{Field, One, Zero};
use hex_literal::hex;

use crate::errors::Bn254Error;
use crate::field::{fq_from_be, fq_to_be, P_PLUS_ONE_DIV_FOUR};
use crate::types::{g2_coordinates, g2_from_coordinates, G1, G2, G2_IDENTITY};

/// sqrt(-3) mod p
const Z0: [u8; 32] = hex!("0000000000000000b3c4d79d41a91759a9e4c7e359b6b89eaec68e62effffffd");

/// (sqrt(-3) - 1) / 2 mod p
const Z1: [u8; 32] = hex!("000000000000000059e26bcea0d48bacd4f263f1acdb5c4f5763473177fffffe");

static CONTEXT: OnceLock<CurveContext> = OnceLock::new();

/// Process-wide BN254 parameters, initialized once.
#[derive(Debug)]
pub struct CurveContext {
    g1_generator: G1Affine,
    g2_generator: G2Affine,
    z0: Fq,
    z1: Fq,
    curve_b: Fq,
}

impl CurveContext {
    /// Initialize the context on first call and return the shared handle.
    ///
    /// Concurrent first calls are serialized; every caller observes the same
    /// fully built context.
    pub fn init() -> &'static CurveContext {
        CONTEXT.get_or_init(|| {
            log::debug!("initializing BN254 curve context");
            CurveContext::build()
        })
    }

    fn build() -> Self {
        // Both constants are below p, so parsing cannot fail.
        let z0 = fq_from_be(&Z0).unwrap_or_default();
        let z1 = fq_from_be(&Z1).unwrap_or_default();
        debug_assert_eq!(z0.square(), -Fq::from(3u64));

        CurveContext {
            g1_generator: G1Affine::generator(),
            g2_generator: G2Affine::generator(),
            z0,
            z1,
            curve_b: Fq::from(3u64),
        }
    }

    /// Decode and validate a G1 encoding. (0, 0) decodes to the identity.
    pub fn decode_g1(&self, bytes: &G1) -> Result<G1Affine, Bn254Error> {
        if bytes.iter().all(|&b| b == 0) {
            return Ok(G1Affine::identity());
        }

        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        x.copy_from_slice(&bytes[..32]);
        y.copy_from_slice(&bytes[32..]);

        let x = fq_from_be(&x).ok_or(Bn254Error::InvalidG1)?;
        let y = fq_from_be(&y).ok_or(Bn254Error::InvalidG1)?;
        let point = G1Affine::new_unchecked(x, y);

        if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
            return Err(Bn254Error::InvalidG1);
        }
        Ok(point)
    }

    /// Encode a G1 point as x || y. The identity encodes as all zeros.
    pub fn encode_g1(&self, point: &G1Affine) -> G1 {
        let mut out = [0u8; 64];
        if point.is_zero() {
            return out;
        }
        out[..32].copy_from_slice(&fq_to_be(&point.x));
        out[32..].copy_from_slice(&fq_to_be(&point.y));
        out
    }

    /// Decode and validate an ABI-ordered G2 encoding. All zeros decodes to
    /// the identity.
    pub fn decode_g2(&self, bytes: &G2) -> Result<G2Affine, Bn254Error> {
        if *bytes == G2_IDENTITY {
            return Ok(G2Affine::identity());
        }

        let coords = g2_coordinates(bytes);
        let mut parsed = [Fq::zero(); 4];
        for (slot, word) in parsed.iter_mut().zip(coords.iter()) {
            *slot = fq_from_be(word).ok_or(Bn254Error::InvalidG2)?;
        }

        let x = Fq2::new(parsed[0], parsed[1]);
        let y = Fq2::new(parsed[2], parsed[3]);
        let point = G2Affine::new_unchecked(x, y);

        // G2 has a non-trivial cofactor, so the subgroup check matters here.
        if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
            return Err(Bn254Error::InvalidG2);
        }
        Ok(point)
    }

    /// Encode a G2 point in ABI order (x_c0, x_c1, y_c0, y_c1).
    pub fn encode_g2(&self, point: &G2Affine) -> G2 {
        if point.is_zero() {
            return G2_IDENTITY;
        }
        g2_from_coordinates(&[
            fq_to_be(&point.x.c0),
            fq_to_be(&point.x.c1),
            fq_to_be(&point.y.c0),
            fq_to_be(&point.y.c1),
        ])
    }

    /// Sum of G2 points; the empty sum is the identity.
    pub fn g2_sum(&self, points: &[G2]) -> Result<G2, Bn254Error> {
        let mut acc = G2Projective::zero();
        for bytes in points {
            acc += self.decode_g2(bytes)?;
        }
        Ok(self.encode_g2(&acc.into_affine()))
    }

    /// secret · G1
    pub fn g1_mul_generator(&self, secret: &Fr) -> G1 {
        self.encode_g1(&(self.g1_generator * secret).into_affine())
    }

    /// secret · G2
    pub fn g2_mul_generator(&self, secret: &Fr) -> G2 {
        self.encode_g2(&(self.g2_generator * secret).into_affine())
    }

    /// Square root via a^((p+1)/4). The boolean reports whether the result
    /// actually squares back to `a` (i.e. `a` is a quadratic residue).
    pub fn sqrt(&self, a: &Fq) -> (Fq, bool) {
        let root = a.pow(P_PLUS_ONE_DIV_FOUR);
        (root, root.square() == *a)
    }

    /// Fouque–Tibouchi map from a base-field element to a G1 point.
    ///
    /// Tries the three candidate x-coordinates in order and takes the first
    /// one with a square right-hand side. The sign of y follows the quadratic
    /// character of the input.
    pub fn map_to_point(&self, t: &Fq) -> Result<G1Affine, Bn254Error> {
        let (_, decision) = self.sqrt(t);

        let a0 = t.square() + Fq::from(4u64);
        let mut a1 = *t * self.z0;
        // inverse(0) is taken as 0, matching modular exponentiation
        let a2 = (a1 * a0).inverse().unwrap_or_else(Fq::zero);
        a1 = a1.square() * a2;
        a1 *= t;

        let x1 = self.z1 - a1;
        if let Some(point) = self.point_with_x(x1, decision) {
            return Ok(point);
        }

        let x2 = -(x1 + Fq::one());
        if let Some(point) = self.point_with_x(x2, decision) {
            return Ok(point);
        }

        let x3 = a0.square().square() * a2.square() + Fq::one();
        self.point_with_x(x3, decision).ok_or(Bn254Error::InvalidG1)
    }

    fn point_with_x(&self, x: Fq, decision: bool) -> Option<G1Affine> {
        let rhs = x.square() * x + self.curve_b;
        let (y, found) = self.sqrt(&rhs);
        if !found {
            return None;
        }
        let y = if decision { y } else { -y };
        Some(G1Affine::new_unchecked(x, y))
    }
}
