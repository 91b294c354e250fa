//! Core byte-level types for checkpoint verification
//!
//! Points and scalars are carried as raw big-endian byte arrays, the same
//! layout the contract ABI and the alt_bn128 interface use.

/// A 32-byte scalar (Fr for BN254), big-endian.
pub type Scalar = [u8; 32];

/// A 32-byte keccak256 digest.
pub type Digest = [u8; 32];

/// A 20-byte validator address.
pub type Address = [u8; 20];

/// A 64-byte G1 point (uncompressed, big-endian x || y).
pub type G1 = [u8; 64];

/// A 128-byte G2 point in ABI order: x_c0 || x_c1 || y_c0 || y_c1.
///
/// The alt_bn128 pairing interface expects the imaginary coefficient first;
/// `ops::g2_to_eip197` does that swap.
pub type G2 = [u8; 128];

/// Scalar representing zero
pub const SCALAR_ZERO: Scalar = [0u8; 32];

/// Scalar representing one
pub const SCALAR_ONE: Scalar = {
    let mut s = [0u8; 32];
    s[31] = 1;
    s
};

/// G1 identity point (point at infinity), encoded as (0, 0)
pub const G1_IDENTITY: G1 = [0u8; 64];

/// G2 identity point, encoded as all zeros
pub const G2_IDENTITY: G2 = [0u8; 128];

/// BN254 G1 generator point
/// x = 1, y = 2
pub const G1_GENERATOR: G1 = {
    let mut g = [0u8; 64];
    g[31] = 1; // x = 1
    g[63] = 2; // y = 2
    g
};

/// BN254 G2 generator in ABI order (x_c0, x_c1, y_c0, y_c1)
pub const G2_GENERATOR: G2 = {
    let x_c0 = hex_literal::hex!("1800deef121f1e76426a00665e5c4479674322d4f75edadd46debd5cd992f6ed");
    let x_c1 = hex_literal::hex!("198e9393920d483a7260bfb731fb5d25f1aa493335a9e71297e485b7aef312c2");
    let y_c0 = hex_literal::hex!("12c85ea5db8c6deb4aab71808dcb408fe3d1e7690c43d37b4ce6cc0166fa7daa");
    let y_c1 = hex_literal::hex!("090689d0585ff075ec9e99ad690c3395bc4b313370b38ef355acdadcd122975b");
    concat_g2(&x_c0, &x_c1, &y_c0, &y_c1)
};

/// Negated BN254 G2 generator in ABI order. Only the y coordinate differs.
pub const G2_GENERATOR_NEG: G2 = {
    let x_c0 = hex_literal::hex!("1800deef121f1e76426a00665e5c4479674322d4f75edadd46debd5cd992f6ed");
    let x_c1 = hex_literal::hex!("198e9393920d483a7260bfb731fb5d25f1aa493335a9e71297e485b7aef312c2");
    let y_c0 = hex_literal::hex!("1d9befcd05a5323e6da4d435f3b617cdb3af83285c2df711ef39c01571827f9d");
    let y_c1 = hex_literal::hex!("275dc4a288d1afb3cbb1ac09187524c7db36395df7be3b99e673b13a075a65ec");
    concat_g2(&x_c0, &x_c1, &y_c0, &y_c1)
};

/// BN254 scalar field modulus (r)
/// r = 21888242871839275222246405745257275088548364400416034343698204186575808495617
pub const FR_MODULUS: Scalar = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x28, 0x33, 0xe8, 0x48, 0x79, 0xb9, 0x70, 0x91, 0x43, 0xe1, 0xf5, 0x93, 0xf0, 0x00, 0x00, 0x01,
];

/// BN254 base field modulus (p)
/// p = 21888242871839275222246405745257275088696311157297823662689037894645226208583
pub const FQ_MODULUS: Scalar = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x97, 0x81, 0x6a, 0x91, 0x68, 0x71, 0xca, 0x8d, 0x3c, 0x20, 0x8c, 0x16, 0xd8, 0x7c, 0xfd, 0x47,
];

const fn concat_g2(x_c0: &[u8; 32], x_c1: &[u8; 32], y_c0: &[u8; 32], y_c1: &[u8; 32]) -> G2 {
    let mut g2 = [0u8; 128];
    let mut i = 0;
    while i < 32 {
        g2[i] = x_c0[i];
        g2[32 + i] = x_c1[i];
        g2[64 + i] = y_c0[i];
        g2[96 + i] = y_c1[i];
        i += 1;
    }
    g2
}

/// Split a G1 encoding into its (x, y) coordinates.
pub fn g1_coordinates(point: &G1) -> ([u8; 32], [u8; 32]) {
    let mut x = [0u8; 32];
    let mut y = [0u8; 32];
    x.copy_from_slice(&point[..32]);
    y.copy_from_slice(&point[32..]);
    (x, y)
}

/// Split a G2 encoding into its four ABI-ordered coordinates.
pub fn g2_coordinates(point: &G2) -> [[u8; 32]; 4] {
    let mut out = [[0u8; 32]; 4];
    for (i, chunk) in point.chunks_exact(32).enumerate() {
        out[i].copy_from_slice(chunk);
    }
    out
}

/// Build a G2 encoding from four ABI-ordered coordinates.
pub fn g2_from_coordinates(coords: &[[u8; 32]; 4]) -> G2 {
    concat_g2(&coords[0], &coords[1], &coords[2], &coords[3])
}
