//! # Stampchain Calendar
//!
//! Interfaces to the outside world a timestamp proof depends on: calendar
//! servers that issue attestations and block header sources used to check
//! Bitcoin commitments.
//!
//! ## Overview
//!
//! Network transport is left to implementations of [`CalendarClient`] and
//! [`BlockHeaderSource`]. This crate provides the pool logic on top of them
//! and in-memory implementations for tests.
//!
//! ## Key Properties
//!
//! - **Independent endpoints**: Each calendar runs under its own timeout
//! - **First success wins**: [`CalendarPool::stamp`] returns as soon as one answers
//! - **Best effort upgrades**: [`CalendarPool::collect`] keeps every answer
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stampchain_calendar::{CalendarClient, CalendarPool, MemoryCalendar};
//! use stampchain_core::Digest;
//!
//! async fn example() {
//!     let clients: Vec<Arc<dyn CalendarClient>> = vec![
//!         Arc::new(MemoryCalendar::new("https://a.example")),
//!         Arc::new(MemoryCalendar::new("https://b.example")),
//!     ];
//!     let pool = CalendarPool::new(clients);
//!     let attestation = pool.stamp(&Digest::from_bytes([0x42; 32])).await.unwrap();
//!     println!("stamped via {}", attestation.endpoint);
//! }
//! ```

pub mod client;
pub mod error;
pub mod pool;
pub mod pools;

pub use client::{
    memory::MemoryBlockSource, memory::MemoryCalendar, BlockHeaderSource, CalendarClient,
};
pub use error::{CalendarError, Result};
pub use pool::{Attestation, CalendarPool, CollectReport, DEFAULT_TIMEOUT};
pub use pools::{normalize_endpoint, PoolConfig, DEFAULT_CALENDAR};
