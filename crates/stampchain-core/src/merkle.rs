//! Binary Merkle trees over SHA-256 digests.
//!
//! Leaves are used as given. Interior nodes are `SHA256(left || right)`; a
//! level with an odd count pairs its last node with itself rather than
//! promoting it unchanged.

use serde::{Deserialize, Serialize};

use crate::crypto::sha256_pair;
use crate::error::{CoreError, Result};
use crate::types::Digest;

/// A fully built tree.
///
/// `levels[0]` holds the leaves and the last level holds the root. An empty
/// tree has no levels and no root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    levels: Vec<Vec<Digest>>,
}

/// Sibling hashes from a leaf up to (not including) the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub siblings: Vec<Digest>,
}

impl MerkleProof {
    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }
}

impl MerkleTree {
    /// Build a tree over `leaves`, in order.
    pub fn build(leaves: &[Digest]) -> Self {
        if leaves.is_empty() {
            return Self { levels: Vec::new() };
        }

        let mut levels = vec![leaves.to_vec()];
        while let Some(prev) = levels.last() {
            if prev.len() <= 1 {
                break;
            }
            let next = parent_level(prev);
            levels.push(next);
        }

        Self { levels }
    }

    /// The root, or `None` for an empty tree.
    pub fn root(&self) -> Option<Digest> {
        self.levels.last().and_then(|level| level.first()).copied()
    }

    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    pub fn leaves(&self) -> &[Digest] {
        self.levels.first().map_or(&[], Vec::as_slice)
    }

    /// Number of levels above the leaves.
    pub fn height(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Inclusion proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Result<MerkleProof> {
        let len = self.leaf_count();
        if index >= len {
            return Err(CoreError::IndexOutOfBounds { index, len });
        }

        let mut siblings = Vec::with_capacity(self.height());
        let mut current = index;
        for level in &self.levels[..self.height()] {
            let sibling = if current % 2 == 0 {
                // self-paired at an odd boundary
                level.get(current + 1).unwrap_or(&level[current])
            } else {
                &level[current - 1]
            };
            siblings.push(*sibling);
            current /= 2;
        }

        Ok(MerkleProof { siblings })
    }
}

/// Root of the tree whose leaves are `first` followed by `rest`.
///
/// Same hashing as [`MerkleTree::build`], but the tree is never empty so a
/// root always exists.
pub fn root_of(first: Digest, rest: &[Digest]) -> Digest {
    let mut level = Vec::with_capacity(rest.len() + 1);
    level.push(first);
    level.extend_from_slice(rest);
    while level.len() > 1 {
        level = parent_level(&level);
    }
    // pairing never empties a non-empty level
    level[0]
}

fn parent_level(level: &[Digest]) -> Vec<Digest> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            sha256_pair(left.as_bytes(), right.as_bytes())
        })
        .collect()
}

/// Recompute the root from `leaf` and `proof` and compare to `root`.
///
/// At each step the accumulator goes on the left when `index` is even and on
/// the right when it is odd; `index` is halved after every step.
pub fn verify(leaf: &Digest, proof: &MerkleProof, root: &Digest, index: usize) -> bool {
    let mut acc = *leaf;
    let mut index = index;
    for sibling in &proof.siblings {
        acc = if index % 2 == 0 {
            sha256_pair(acc.as_bytes(), sibling.as_bytes())
        } else {
            sha256_pair(sibling.as_bytes(), acc.as_bytes())
        };
        index /= 2;
    }
    acc == *root
}
