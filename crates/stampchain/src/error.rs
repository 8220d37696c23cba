//! Error types for the Stamper.

use stampchain_calendar::CalendarError;
use stampchain_core::{CoreError, Digest};
use stampchain_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Stamper operations.
#[derive(Debug, Error)]
pub enum StampError {
    /// Malformed proof or digest.
    #[error("proof error: {0}")]
    Proof(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// No attestation could be obtained.
    #[error("calendar error: {0}")]
    Calendar(#[from] CalendarError),

    /// A different proof is already stored for this leaf.
    #[error("conflicting proof already stored for {leaf}: {existing_len} operations")]
    Conflict { leaf: Digest, existing_len: usize },

    /// Invalid operation.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl StampError {
    /// Whether the input itself was unreadable, as opposed to a service failing.
    pub fn is_malformed(&self) -> bool {
        match self {
            StampError::Proof(e) => e.is_malformed(),
            StampError::Store(StoreError::Proof(e)) => e.is_malformed(),
            _ => false,
        }
    }
}

/// Result type for Stamper operations.
pub type Result<T> = std::result::Result<T, StampError>;
