//! # Stampchain Core
//!
//! Pure primitives for Stampchain timestamp proofs: the binary codec,
//! operations, proof chains, Merkle aggregation and Bitcoin attestation checks.
//!
//! This crate contains no I/O, no storage, no networking. It is pure computation
//! over owned byte buffers.
//!
//! ## Key Types
//!
//! - [`Digest`] - 32-byte SHA-256 digest
//! - [`Operation`] - One deterministic step of a proof
//! - [`ProofChain`] - Append-only list of operations with an optional start digest
//! - [`MerkleTree`] - Aggregation of several attestations under one root
//! - [`BlockHeader`] - Raw 80-byte Bitcoin header
//!
//! ## Errors versus verdicts
//!
//! Input that cannot be parsed is a [`CoreError`]. Input that parses but does
//! not check out is a [`Verdict::Failed`] or an [`AttestationStatus::Failed`].

pub mod bitcoin;
pub mod chain;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod merkle;
pub mod op;
pub mod types;
pub mod verification;

pub use bitcoin::{
    check_bitcoin_commitment, verify_bitcoin_commitment, BlockHeader, FailureReason, Verdict,
    BLOCK_HEADER_LEN,
};
pub use chain::{BitcoinAttestation, ProofChain, ProofSummary, MAGIC, VERSION};
pub use codec::{Reader, Writer};
pub use crypto::{sha256, sha256_pair};
pub use error::{CoreError, MalformedInput, Result};
pub use merkle::{MerkleProof, MerkleTree};
pub use op::{Opcode, Operation, OperationRegistry};
pub use types::{Digest, DIGEST_LEN};
pub use verification::{
    check_bitcoin_attestation, verify_chain, AttestationKind, AttestationReport,
    AttestationStatus, VerificationReport,
};
