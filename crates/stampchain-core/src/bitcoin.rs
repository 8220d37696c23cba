//! Bitcoin block headers and OP_RETURN commitment checks.
//!
//! A Bitcoin attestation says: `SHA256(leaf)` was written into a transaction
//! OP_RETURN, and that transaction sits under the Merkle root of a specific
//! block header. Checking it needs the leaf, the commitment, the transaction's
//! Merkle siblings, and the 80-byte header.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

use crate::crypto;
use crate::error::{MalformedInput, Result};
use crate::types::Digest;

/// Length of a serialized Bitcoin block header.
pub const BLOCK_HEADER_LEN: usize = 80;

/// Byte range of the transaction Merkle root inside a header.
pub const MERKLE_ROOT_RANGE: Range<usize> = 36..68;

/// A raw 80-byte Bitcoin block header.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHeader(pub [u8; BLOCK_HEADER_LEN]);

impl BlockHeader {
    pub const fn from_bytes(bytes: [u8; BLOCK_HEADER_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, which must be exactly 80 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let arr: [u8; BLOCK_HEADER_LEN] = slice
            .try_into()
            .map_err(|_| MalformedInput::InvalidBlockHeader(slice.len()))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_HEADER_LEN] {
        &self.0
    }

    /// The transaction Merkle root field, as stored (internal byte order).
    pub fn merkle_root(&self) -> Digest {
        let mut root = [0u8; 32];
        root.copy_from_slice(&self.0[MERKLE_ROOT_RANGE]);
        Digest(root)
    }

    /// Double SHA-256 of the header (internal byte order).
    pub fn block_hash(&self) -> Digest {
        crypto::sha256d(&self.0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| MalformedInput::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for BlockHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHeader({})", &self.block_hash().to_hex()[..16])
    }
}

impl Serialize for BlockHeader {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BlockHeader {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Why a well-formed Bitcoin attestation did not check out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// `SHA256(leaf)` is not the committed value.
    CommitmentMismatch { expected: Digest, actual: Digest },
    /// Folding the Merkle proof does not reach the header's root.
    MerkleRootMismatch { computed: Digest, header: Digest },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::CommitmentMismatch { expected, actual } => {
                write!(f, "commitment mismatch: sha256(leaf)={} committed={}", expected, actual)
            }
            FailureReason::MerkleRootMismatch { computed, header } => {
                write!(f, "merkle root mismatch: computed={} header={}", computed, header)
            }
        }
    }
}

/// Outcome of checking a well-formed attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Verified,
    Failed(FailureReason),
}

impl Verdict {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verdict::Verified)
    }
}

/// Fold a transaction Merkle proof: `acc = SHA256(acc || sibling)` per step.
///
/// This mirrors how the commitment is proven on chain; siblings are always
/// appended on the right.
pub fn fold_merkle_proof(start: &Digest, siblings: &[Digest]) -> Digest {
    siblings
        .iter()
        .fold(*start, |acc, sibling| crypto::sha256_pair(acc.as_bytes(), sibling.as_bytes()))
}

/// Check a Bitcoin OP_RETURN attestation, explaining any failure.
///
/// Steps, in order:
/// 1. `SHA256(leaf)` must equal `commitment`.
/// 2. The commitment is folded through `merkle_proof`.
/// 3. `header` must be exactly 80 bytes; anything else is malformed input.
/// 4. The fold result must equal header bytes `[36..68)`.
///
/// A commitment mismatch is reported before the header is looked at.
pub fn check_bitcoin_commitment(
    leaf: &Digest,
    commitment: &Digest,
    header: &[u8],
    merkle_proof: &[Digest],
) -> Result<Verdict> {
    let expected = crypto::sha256(leaf.as_bytes());
    if expected != *commitment {
        return Ok(Verdict::Failed(FailureReason::CommitmentMismatch {
            expected,
            actual: *commitment,
        }));
    }

    let computed = fold_merkle_proof(commitment, merkle_proof);
    let header = BlockHeader::from_slice(header)?;
    let header_root = header.merkle_root();

    if computed != header_root {
        return Ok(Verdict::Failed(FailureReason::MerkleRootMismatch {
            computed,
            header: header_root,
        }));
    }
    Ok(Verdict::Verified)
}

/// Boolean form of [`check_bitcoin_commitment`].
pub fn verify_bitcoin_commitment(
    leaf: &Digest,
    commitment: &Digest,
    header: &[u8],
    merkle_proof: &[Digest],
) -> Result<bool> {
    check_bitcoin_commitment(leaf, commitment, header, merkle_proof).map(|v| v.is_verified())
}
