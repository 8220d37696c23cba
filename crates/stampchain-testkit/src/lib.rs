//! # Stampchain Testkit
//!
//! Testing utilities for Stampchain.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Proof files with known bytes, leaf digests and roots
//! - **Generators**: Proptest strategies for operations and chains
//! - **Fixtures**: Memory calendars, block sources and anchored chains
//!
//! ## Golden Vectors
//!
//! ```rust
//! use stampchain_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, hex) in verify_all_vectors() {
//!     assert!(matches, "{}: {}", name, hex);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use stampchain_testkit::generators::{chain_from_params, ChainParams};
//!
//! proptest! {
//!     #[test]
//!     fn serialization_is_deterministic(params: ChainParams) {
//!         let c1 = chain_from_params(&params);
//!         let c2 = chain_from_params(&params);
//!         prop_assert_eq!(c1.serialize(), c2.serialize());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use stampchain_core::{verify_chain, Digest};
//! use stampchain_testkit::fixtures::{anchor_in_bitcoin, calendar_chain};
//!
//! let mut chain = calendar_chain(Digest::from_bytes([1; 32]), &[b"attestation"]);
//! anchor_in_bitcoin(&mut chain, true);
//! assert!(verify_chain(&chain, None).unwrap().is_verified());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    anchor_in_bitcoin, bitcoin_anchor, calendar_chain, header_with_root, CalendarFixture,
};
pub use generators::{chain_from_params, ChainParams};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
