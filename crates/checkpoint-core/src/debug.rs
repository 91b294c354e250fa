//! Debug utilities for tracing intermediate values
//!
//! Enable with `--features debug`

extern crate alloc;

use alloc::format;
use alloc::string::String;

use crate::types::{Scalar, G1, G2};

/// Format bytes as a lowercase hex string (no prefix)
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for byte in bytes.iter() {
        s.push_str(&format!("{:02x}", byte));
    }
    s
}

/// Format a scalar as a 0x-prefixed hex string
pub fn scalar_to_hex(scalar: &Scalar) -> String {
    format!("0x{}", bytes_to_hex(scalar))
}

/// Format a G1 point as hex
pub fn g1_to_hex(g1: &G1) -> String {
    format!("(0x{}, 0x{})", bytes_to_hex(&g1[0..32]), bytes_to_hex(&g1[32..64]))
}

/// Format a G2 point as hex, ABI coordinate order
pub fn g2_to_hex(g2: &G2) -> String {
    format!(
        "((0x{}, 0x{}), (0x{}, 0x{}))",
        bytes_to_hex(&g2[0..32]),
        bytes_to_hex(&g2[32..64]),
        bytes_to_hex(&g2[64..96]),
        bytes_to_hex(&g2[96..128])
    )
}

/// Debug trace macro
#[cfg(feature = "debug")]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        log::trace!($($arg)*);
    };
}

/// Debug trace macro (noop when debug feature disabled)
#[cfg(not(feature = "debug"))]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

/// Debug print for a scalar value
#[cfg(feature = "debug")]
#[macro_export]
macro_rules! dbg_scalar {
    ($name:expr, $s:expr) => {
        log::trace!("{} = {}", $name, $crate::debug::scalar_to_hex($s));
    };
}

/// Debug print for a scalar value (noop when disabled)
#[cfg(not(feature = "debug"))]
#[macro_export]
macro_rules! dbg_scalar {
    ($name:expr, $s:expr) => {};
}

/// Debug print for a G1 value
#[cfg(feature = "debug")]
#[macro_export]
macro_rules! dbg_g1 {
    ($name:expr, $g1:expr) => {
        log::trace!("{} = {}", $name, $crate::debug::g1_to_hex($g1));
    };
}

/// Debug print for G1 (noop when disabled)
#[cfg(not(feature = "debug"))]
#[macro_export]
macro_rules! dbg_g1 {
    ($name:expr, $g1:expr) => {};
}

/// Debug print for a G2 value
#[cfg(feature = "debug")]
#[macro_export]
macro_rules! dbg_g2 {
    ($name:expr, $g2:expr) => {
        log::trace!("{} = {}", $name, $crate::debug::g2_to_hex($g2));
    };
}

/// Debug print for G2 (noop when disabled)
#[cfg(not(feature = "debug"))]
#[macro_export]
macro_rules! dbg_g2 {
    ($name:expr, $g2:expr) => {};
}
