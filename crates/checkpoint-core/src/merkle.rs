//! Keccak256 Merkle trees and inclusion proofs
//!
//! Two hashing modes, always chosen explicitly:
//!
//! - **Positional**: parent = keccak256(left || right) in leaf order. Leaves
//!   are padded to a power of two with zero digests. A proof carries the
//!   leaf index, whose bits give the side of each sibling.
//! - **Sorted**: leaves are sorted, and each parent hashes the smaller child
//!   first. An unpaired last node moves up unchanged. Proofs need no index
//!   (the OpenZeppelin `MerkleProof` construction).

extern crate alloc;
use alloc::format;
use alloc::vec::Vec;

use crate::codec::keccak256;
use crate::errors::MerkleError;
use crate::types::Digest;

/// Deepest proof accepted (a tree over 2^64 leaves)
pub const MAX_PROOF_DEPTH: usize = 64;

/// Filler leaf for positional padding. Never accepted as an included leaf
/// in positional mode, so padding slots cannot be proven.
pub const EMPTY_LEAF: Digest = [0u8; 32];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MerkleMode {
    Positional,
    Sorted,
}

impl core::str::FromStr for MerkleMode {
    type Err = MerkleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positional" => Ok(MerkleMode::Positional),
            "sorted" => Ok(MerkleMode::Sorted),
            other => Err(MerkleError::MerkleProofMismatch(format!(
                "unknown merkle mode {other:?}"
            ))),
        }
    }
}

/// Sibling path from a leaf to the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MerkleProof {
    pub siblings: Vec<Digest>,
    /// Index of the leaf in the order it was given. Only positional
    /// verification reads it.
    pub leaf_index: usize,
}

/// A fully materialized tree.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    mode: MerkleMode,
    /// layers[0] holds the (padded or sorted) leaves, the last layer the root
    layers: Vec<Vec<Digest>>,
    /// position in layers[0] of each input leaf
    positions: Vec<usize>,
}

/// keccak256(a || b)
pub fn hash_pair(a: &Digest, b: &Digest) -> Digest {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(a);
    buf[32..].copy_from_slice(b);
    keccak256(&buf)
}

/// keccak256(min(a, b) || max(a, b))
pub fn hash_sorted_pair(a: &Digest, b: &Digest) -> Digest {
    if a <= b {
        hash_pair(a, b)
    } else {
        hash_pair(b, a)
    }
}

impl MerkleTree {
    pub fn build(leaves: &[Digest], mode: MerkleMode) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyTree);
        }

        let (base, positions) = match mode {
            MerkleMode::Positional => {
                let mut base = leaves.to_vec();
                base.resize(leaves.len().next_power_of_two(), EMPTY_LEAF);
                (base, (0..leaves.len()).collect::<Vec<_>>())
            }
            MerkleMode::Sorted => {
                let mut order: Vec<usize> = (0..leaves.len()).collect();
                order.sort_by(|&a, &b| leaves[a].cmp(&leaves[b]));
                let mut positions = alloc::vec![0usize; leaves.len()];
                for (position, &original) in order.iter().enumerate() {
                    positions[original] = position;
                }
                let base = order.iter().map(|&i| leaves[i]).collect();
                (base, positions)
            }
        };

        let mut layers = alloc::vec![base];
        while let Some(layer) = layers.last().filter(|layer| layer.len() > 1) {
            let next = layer
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] if mode == MerkleMode::Positional => hash_pair(left, right),
                    [left, right] => hash_sorted_pair(left, right),
                    // unpaired trailing node, only reachable in sorted mode
                    _ => pair[0],
                })
                .collect();
            layers.push(next);
        }

        Ok(Self {
            mode,
            layers,
            positions,
        })
    }

    pub fn mode(&self) -> MerkleMode {
        self.mode
    }

    pub fn root(&self) -> Digest {
        // build() never leaves the layer list empty
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or(EMPTY_LEAF)
    }

    /// Number of input leaves (before padding).
    pub fn leaf_count(&self) -> usize {
        self.positions.len()
    }

    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Inclusion proof for the `leaf_index`-th input leaf.
    pub fn prove(&self, leaf_index: usize) -> Result<MerkleProof, MerkleError> {
        let mut index = *self
            .positions
            .get(leaf_index)
            .ok_or(MerkleError::LeafIndexOutOfRange {
                index: leaf_index,
                len: self.positions.len(),
            })?;

        let mut siblings = Vec::with_capacity(self.depth());
        for layer in &self.layers[..self.depth()] {
            if let Some(sibling) = layer.get(index ^ 1) {
                siblings.push(*sibling);
            }
            index >>= 1;
        }

        Ok(MerkleProof {
            siblings,
            leaf_index,
        })
    }
}

/// Root of a tree over `leaves`.
pub fn build_tree(leaves: &[Digest], mode: MerkleMode) -> Result<Digest, MerkleError> {
    Ok(MerkleTree::build(leaves, mode)?.root())
}

/// Proof for `leaves[leaf_index]`.
pub fn prove_inclusion(
    leaves: &[Digest],
    leaf_index: usize,
    mode: MerkleMode,
) -> Result<MerkleProof, MerkleError> {
    MerkleTree::build(leaves, mode)?.prove(leaf_index)
}

/// Recompute the root from `leaf` and `proof` and compare it with `root`.
///
/// A wrong sibling, order or mode yields `Ok(false)`, as does
/// [`EMPTY_LEAF`] in positional mode. Only a structurally impossible proof
/// is an error.
pub fn verify_inclusion(
    leaf: &Digest,
    proof: &MerkleProof,
    root: &Digest,
    mode: MerkleMode,
) -> Result<bool, MerkleError> {
    let depth = proof.siblings.len();
    if depth > MAX_PROOF_DEPTH {
        return Err(MerkleError::MerkleProofMismatch(format!(
            "proof depth {depth} exceeds {MAX_PROOF_DEPTH}"
        )));
    }

    let computed = match mode {
        MerkleMode::Positional => {
            if depth < usize::BITS as usize && proof.leaf_index >> depth != 0 {
                return Err(MerkleError::MerkleProofMismatch(format!(
                    "leaf index {} does not fit a proof of depth {depth}",
                    proof.leaf_index
                )));
            }
            if *leaf == EMPTY_LEAF {
                log::debug!("padding leaf at index {} rejected", proof.leaf_index);
                return Ok(false);
            }
            let mut index = proof.leaf_index;
            let mut node = *leaf;
            for sibling in &proof.siblings {
                node = if index & 1 == 0 {
                    hash_pair(&node, sibling)
                } else {
                    hash_pair(sibling, &node)
                };
                index >>= 1;
            }
            node
        }
        MerkleMode::Sorted => proof
            .siblings
            .iter()
            .fold(*leaf, |node, sibling| hash_sorted_pair(&node, sibling)),
    };

    Ok(computed == *root)
}
