//! # Stampchain Store
//!
//! Storage abstraction for Stampchain. Provides a trait-based interface for
//! proof persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts proof storage behind the [`Store`] trait,
//! allowing the stamper to be storage-agnostic. The primary implementation
//! is [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`InsertResult`] - Result of storing a proof
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stampchain_store::{SqliteStore, Store, InsertResult};
//! use stampchain_core::{Digest, Operation, ProofChain};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("proofs.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let mut chain = ProofChain::from_digest(Digest::from_bytes([0x42; 32]));
//!     chain.push(Operation::calendar_commit(b"attestation".to_vec()));
//!     let result = store.put_proof(&chain).await.unwrap();
//!     assert_eq!(result, InsertResult::Inserted);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent inserts**: Storing the same proof twice returns `AlreadyExists`
//! - **Append-only**: Only an extension of the stored proof may replace it
//! - **Conflict detection**: A diverging proof returns `Conflict` and is not written
//! - **Header cache**: Block headers cached by transaction id for re-verification

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{classify_insert, proof_key, InsertResult, Store};
