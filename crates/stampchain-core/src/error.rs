//! Error types for the Stampchain core.
//!
//! A proof that cannot be read is always an error. A proof that can be read
//! but does not check out is not: that outcome is a [`Verdict`](crate::Verdict).

use thiserror::Error;

/// Reasons a byte buffer could not be parsed as a proof or operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedInput {
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEndOfInput { needed: usize, remaining: usize },

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("unsupported proof version: {0}")]
    UnsupportedVersion(u8),

    #[error("unknown operation: opcode {0:#04x}")]
    UnknownOperation(u8),

    #[error("invalid block header: expected 80 bytes, got {0}")]
    InvalidBlockHeader(usize),

    #[error("invalid {operation} payload: expected {expected} bytes, got {actual}")]
    InvalidPayloadLength {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("non-canonical varint encoding of {0}")]
    NonCanonicalVarInt(u64),

    #[error("{0} trailing bytes after {1}")]
    TrailingBytes(usize, &'static str),

    #[error("declared length {0} does not fit in memory")]
    LengthOverflow(u64),
}

/// Core errors that can occur while decoding, folding or aggregating proofs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("malformed input: {0}")]
    Malformed(#[from] MalformedInput),

    #[error("invalid digest length: expected {expected}, got {actual}")]
    InvalidDigestLength { expected: usize, actual: usize },

    #[error("leaf index {index} out of bounds for tree with {len} leaves")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("start digest mismatch: chain anchored to {existing}, got {other}")]
    StartDigestMismatch { existing: String, other: String },
}

impl CoreError {
    /// Whether this error means the input could not be read at all.
    pub fn is_malformed(&self) -> bool {
        matches!(self, CoreError::Malformed(_))
    }

    pub(crate) fn digest_length(actual: usize) -> Self {
        CoreError::InvalidDigestLength {
            expected: crate::types::DIGEST_LEN,
            actual,
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
