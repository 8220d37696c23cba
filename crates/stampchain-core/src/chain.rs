//! Proof chains: an append-only list of operations plus an optional start digest.
//!
//! # Wire format
//!
//! ```text
//! magic        3 bytes, "OTS"
//! version      1 byte, 1
//! start digest varbytes (empty, or exactly 32 bytes)
//! op count     varint
//! operations   op count × varbytes(operation bytes)
//! ```
//!
//! Parsing is all-or-nothing: any malformed operation fails the whole chain.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::bitcoin::BlockHeader;
use crate::codec::{Reader, Writer};
use crate::error::{CoreError, MalformedInput, Result};
use crate::merkle;
use crate::op::{Opcode, Operation};
use crate::types::{Digest, DIGEST_LEN};

/// File magic.
pub const MAGIC: &[u8; 3] = b"OTS";

/// Current format version.
pub const VERSION: u8 = 1;

/// An ordered, append-only sequence of operations.
///
/// Operations are folded left to right. Once an operation is pushed it is
/// never removed or reordered; upgrades only append.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofChain {
    start_digest: Option<Digest>,
    operations: Vec<Operation>,
}

/// A Bitcoin attestation found in a chain: an `OpReturnCommit` and, if
/// present, the `BitcoinBlockHeader` that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitcoinAttestation {
    /// Position of the `OpReturnCommit` in the chain.
    pub position: usize,
    pub commitment: Digest,
    pub header: Option<BlockHeader>,
    pub tx_hash: Option<Digest>,
}

/// Human-oriented description of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofSummary {
    pub version: u8,
    pub start_digest: Option<Digest>,
    pub operation_count: usize,
    pub operations: Vec<String>,
    pub calendar_attestations: usize,
    pub bitcoin_attestations: usize,
    /// Folded leaf, when the chain folds to 32 bytes.
    pub leaf_digest: Option<Digest>,
    /// Attestation-tree root over the leaf, when the leaf is computable.
    pub attestation_root: Option<Digest>,
}

impl ProofChain {
    /// Create an empty chain with no start digest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty chain anchored to `digest`.
    pub fn from_digest(digest: Digest) -> Self {
        Self {
            start_digest: Some(digest),
            operations: Vec::new(),
        }
    }

    pub fn start_digest(&self) -> Option<&Digest> {
        self.start_digest.as_ref()
    }

    /// Anchor the chain to `digest`.
    ///
    /// Setting the digest it already has is a no-op; replacing a different
    /// one is refused.
    pub fn set_start_digest(&mut self, digest: Digest) -> Result<()> {
        match self.start_digest {
            Some(existing) if existing != digest => Err(CoreError::StartDigestMismatch {
                existing: existing.to_hex(),
                other: digest.to_hex(),
            }),
            _ => {
                self.start_digest = Some(digest);
                Ok(())
            }
        }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Append one operation.
    pub fn push(&mut self, op: Operation) {
        self.operations.push(op);
    }

    /// Fold every operation over `start`, which must be 32 bytes.
    pub fn fold(&self, start: &[u8]) -> Result<Vec<u8>> {
        if start.len() != DIGEST_LEN {
            return Err(CoreError::digest_length(start.len()));
        }
        Ok(self.fold_bytes(start))
    }

    /// Fold every operation over a digest.
    pub fn fold_digest(&self, start: &Digest) -> Vec<u8> {
        self.fold_bytes(start.as_bytes())
    }

    fn fold_bytes(&self, input: &[u8]) -> Vec<u8> {
        self.operations
            .iter()
            .fold(input.to_vec(), |acc, op| op.apply(&acc))
    }

    /// The digest this chain commits to.
    ///
    /// Folds from the start digest when set, otherwise from the empty string.
    /// The result must be exactly 32 bytes.
    pub fn compute_leaf_digest(&self) -> Result<Digest> {
        let folded = match &self.start_digest {
            Some(start) => self.fold_digest(start),
            None => self.fold_bytes(&[]),
        };
        Digest::from_slice(&folded)
    }

    /// Aggregate the chain's calendar attestations over `leaf`.
    ///
    /// Without any `CalendarCommit` the leaf itself is the root. Otherwise
    /// the tree leaves are `leaf` followed by each commit applied to `leaf`.
    pub fn build_attestation_tree(&self, leaf: &Digest) -> Digest {
        // CalendarCommit applies as the identity, so each commit contributes `leaf`
        let commits = self.calendar_commit_ops().count();
        if commits == 0 {
            return *leaf;
        }
        merkle::root_of(*leaf, &vec![*leaf; commits])
    }

    /// Fold and aggregate.
    ///
    /// Starts from the stored start digest when present, else from `input`.
    pub fn merkle_root(&self, input: Option<&Digest>) -> Result<Digest> {
        let start = self
            .start_digest
            .as_ref()
            .or(input)
            .ok_or(CoreError::digest_length(0))?;
        let folded = Digest::from_slice(&self.fold_digest(start))?;
        Ok(self.build_attestation_tree(&folded))
    }

    fn calendar_commit_ops(&self) -> impl Iterator<Item = &Operation> {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::CalendarCommit(_)))
    }

    /// Raw attestation payloads from calendar servers, in chain order.
    pub fn calendar_attestations(&self) -> Vec<&Bytes> {
        self.operations
            .iter()
            .filter_map(|op| match op {
                Operation::CalendarCommit(payload) => Some(payload),
                _ => None,
            })
            .collect()
    }

    /// Bitcoin attestations in chain order.
    ///
    /// Each `OpReturnCommit` takes the first `BitcoinBlockHeader` after it and
    /// before the next `OpReturnCommit`. A header with no preceding commit is
    /// ignored.
    pub fn bitcoin_attestations(&self) -> Vec<BitcoinAttestation> {
        let mut out: Vec<BitcoinAttestation> = Vec::new();
        let mut open = false;
        for (position, op) in self.operations.iter().enumerate() {
            match op {
                Operation::OpReturnCommit(commitment) => {
                    out.push(BitcoinAttestation {
                        position,
                        commitment: *commitment,
                        header: None,
                        tx_hash: None,
                    });
                    open = true;
                }
                Operation::BitcoinBlockHeader { header, tx_hash } if open => {
                    if let Some(last) = out.last_mut() {
                        last.header = Some(*header);
                        last.tx_hash = *tx_hash;
                    }
                    open = false;
                }
                _ => {}
            }
        }
        out
    }

    /// Append every operation of `other`.
    ///
    /// Both chains must agree on the start digest if both have one; a chain
    /// without one adopts `other`'s.
    pub fn merge(&mut self, other: &ProofChain) -> Result<()> {
        if let Some(digest) = other.start_digest {
            self.set_start_digest(digest)?;
        }
        self.operations.extend(other.operations.iter().cloned());
        Ok(())
    }

    /// Whether this chain is `older` with zero or more operations appended.
    pub fn is_extension_of(&self, older: &ProofChain) -> bool {
        self.start_digest == older.start_digest
            && self.operations.len() >= older.operations.len()
            && self.operations[..older.operations.len()] == older.operations[..]
    }

    /// Summarize the chain for display.
    pub fn summary(&self) -> ProofSummary {
        let leaf_digest = self.compute_leaf_digest().ok();
        let count = |opcode: Opcode| {
            self.operations
                .iter()
                .filter(|op| op.opcode() == opcode)
                .count()
        };
        ProofSummary {
            version: VERSION,
            start_digest: self.start_digest,
            operation_count: self.operations.len(),
            operations: self.operations.iter().map(ToString::to_string).collect(),
            calendar_attestations: count(Opcode::CalendarCommit),
            bitcoin_attestations: count(Opcode::OpReturnCommit),
            leaf_digest,
            attestation_root: leaf_digest.map(|leaf| self.build_attestation_tree(&leaf)),
        }
    }

    /// Encode to the binary file format.
    pub fn serialize(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(64 + self.operations.len() * 8);
        w.write_raw(MAGIC);
        w.write_u8(VERSION);
        match &self.start_digest {
            Some(digest) => w.write_varbytes(digest.as_bytes()),
            None => w.write_varbytes(&[]),
        }
        w.write_varint(self.operations.len() as u64);
        for op in &self.operations {
            w.write_varbytes(&op.to_bytes());
        }
        w.into_bytes()
    }

    /// Decode from the binary file format.
    ///
    /// Magic and version are checked before anything else is read. Trailing
    /// bytes after the last operation are rejected.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);

        let magic: [u8; 3] = r.read_array()?;
        if &magic != MAGIC {
            return Err(MalformedInput::InvalidHeader(format!(
                "bad magic {}",
                hex::encode(magic)
            ))
            .into());
        }
        let version = r.read_u8()?;
        if version != VERSION {
            return Err(MalformedInput::UnsupportedVersion(version).into());
        }

        let start = r.read_varbytes()?;
        let start_digest = if start.is_empty() {
            None
        } else {
            Some(Digest::from_slice(start)?)
        };

        let count = r.read_varint()?;
        // Every operation takes at least two bytes on the wire.
        let capacity = usize::try_from(count)
            .unwrap_or(usize::MAX)
            .min(r.remaining() / 2);
        let mut operations = Vec::with_capacity(capacity);
        for _ in 0..count {
            let blob = r.read_varbytes()?;
            operations.push(Operation::from_bytes(blob)?);
        }
        r.finish("proof")?;

        Ok(Self {
            start_digest,
            operations,
        })
    }
}
