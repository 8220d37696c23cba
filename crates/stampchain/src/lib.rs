//! # Stampchain
//!
//! The unified API for Stampchain: create, upgrade and verify
//! OpenTimestamps-style proofs that data existed at a point in time.
//!
//! ## Overview
//!
//! Stampchain provides a portable library for:
//!
//! - **Stamping**: Submit a digest to calendar servers and keep the attestation
//! - **Upgrading**: Collect further attestations for an existing proof
//! - **Verifying**: Check Bitcoin commitments against 80-byte block headers
//! - **Proof files**: Read, write, inspect and merge binary proofs
//!
//! ## Key Concepts
//!
//! - **Proof chain**: Append-only list of operations folded over a leaf digest
//! - **Attestation root**: Merkle root over the leaf and its calendar attestations
//! - **Pending**: A calendar attestation not yet anchored in Bitcoin
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stampchain::{Stamper, StamperConfig};
//! use stampchain::calendar::{CalendarClient, CalendarPool, MemoryCalendar};
//! use stampchain::store::SqliteStore;
//!
//! async fn example() {
//!     // Open storage
//!     let store = SqliteStore::open("proofs.db").unwrap();
//!
//!     // Calendar servers
//!     let clients: Vec<Arc<dyn CalendarClient>> =
//!         vec![Arc::new(MemoryCalendar::new("https://a.example"))];
//!
//!     // Create the stamper
//!     let stamper = Stamper::new(store, CalendarPool::new(clients), StamperConfig::default());
//!
//!     // Stamp some data and write the proof file
//!     let chain = stamper.stamp_bytes(b"hello world").await.unwrap();
//!     let bytes = stamper.save(&chain).await.unwrap();
//!
//!     // Later: check it
//!     let report = stamper.verify(&stamper.load(&bytes).unwrap(), None, None).await.unwrap();
//!     println!("verified: {}", report.is_verified());
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `stampchain::core` - Operations, proof chains, Merkle trees and verification
//! - `stampchain::store` - Storage abstraction and SQLite
//! - `stampchain::calendar` - Calendar servers and block header sources

pub mod error;
pub mod stamper;

// Re-export component crates
pub use stampchain_calendar as calendar;
pub use stampchain_core as core;
pub use stampchain_store as store;

// Re-export main types for convenience
pub use error::{Result, StampError};
pub use stamper::{Stamper, StamperConfig, UpgradeReport};

// Re-export commonly used core types
pub use stampchain_core::{
    AttestationStatus, BlockHeader, Digest, Operation, ProofChain, ProofSummary,
    VerificationReport,
};
