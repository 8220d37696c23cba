//! Store trait: the abstract interface for proof persistence.
//!
//! This trait allows the stamper to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use stampchain_core::{BlockHeader, Digest, ProofChain};

use crate::error::Result;

/// Result of storing a proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// No proof existed for this leaf.
    Inserted,
    /// The stored proof already contains everything in this one
    /// (idempotent - not an error).
    AlreadyExists,
    /// The stored proof was replaced by an extension of itself.
    Upgraded {
        /// Number of operations appended.
        added: usize,
    },
    /// The new proof does not extend the stored one. Nothing was written.
    Conflict {
        /// Operation count of the stored proof.
        existing_len: usize,
    },
}

/// The key a proof is stored under.
///
/// The start digest when the chain has one, otherwise the folded leaf. The
/// key of a chain never changes when operations are appended to a chain that
/// has a start digest.
pub fn proof_key(chain: &ProofChain) -> Result<Digest> {
    match chain.start_digest() {
        Some(digest) => Ok(*digest),
        None => Ok(chain.compute_leaf_digest()?),
    }
}

/// Decide how `incoming` relates to what is already stored.
///
/// Proofs are append-only: a stored proof is only ever replaced by a chain
/// that has it as a prefix.
pub fn classify_insert(existing: Option<&ProofChain>, incoming: &ProofChain) -> InsertResult {
    match existing {
        None => InsertResult::Inserted,
        Some(existing) if incoming.is_extension_of(existing) => {
            let added = incoming.len() - existing.len();
            if added == 0 {
                InsertResult::AlreadyExists
            } else {
                InsertResult::Upgraded { added }
            }
        }
        Some(existing) if existing.is_extension_of(incoming) => InsertResult::AlreadyExists,
        Some(existing) => InsertResult::Conflict {
            existing_len: existing.len(),
        },
    }
}

/// The Store trait: async interface for proof persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Idempotent inserts**: Storing the same proof twice returns `AlreadyExists`.
/// - **Append-only upgrades**: A proof that extends the stored one replaces it
///   and returns `Upgraded`.
/// - **Conflict detection**: A proof for the same leaf that does not extend
///   the stored one returns `Conflict` and leaves storage untouched.
/// - **Header cache**: Bitcoin block headers are cached by transaction id.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Proof Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Store a proof under [`proof_key`].
    async fn put_proof(&self, chain: &ProofChain) -> Result<InsertResult>;

    /// Get the proof stored for a leaf.
    async fn get_proof(&self, leaf: &Digest) -> Result<Option<ProofChain>>;

    /// Check if a proof exists for a leaf.
    async fn has_proof(&self, leaf: &Digest) -> Result<bool>;

    /// All stored leaves, in ascending byte order.
    async fn list_proofs(&self) -> Result<Vec<Digest>>;

    /// Number of stored proofs.
    async fn count(&self) -> Result<u64>;

    // ─────────────────────────────────────────────────────────────────────────
    // Block Header Cache
    // ─────────────────────────────────────────────────────────────────────────

    /// Cache the block header containing transaction `txid`.
    async fn put_block_header(&self, txid: &Digest, header: &BlockHeader) -> Result<()>;

    /// Get the cached block header for transaction `txid`.
    async fn get_block_header(&self, txid: &Digest) -> Result<Option<BlockHeader>>;
}
