//! Error types for the calendar module.

use thiserror::Error;

/// Errors from calendar servers, block header sources and pool configuration.
///
/// Everything here means "attestation unavailable". None of it says anything
/// about whether a proof is valid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    /// The endpoint could not be reached or refused the request.
    #[error("calendar {endpoint} unavailable: {reason}")]
    Unavailable { endpoint: String, reason: String },

    /// The endpoint did not answer in time.
    #[error("calendar {endpoint} timed out after {after_ms} ms")]
    Timeout { endpoint: String, after_ms: u64 },

    /// The endpoint answered with something that is not an attestation.
    #[error("invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    /// The transaction is not in a block yet.
    #[error("transaction {0} not yet confirmed")]
    NotConfirmed(String),

    /// The pool has no endpoints to try.
    #[error("no calendar endpoints configured")]
    NoEndpoints,

    /// Every endpoint failed.
    #[error("stamping failed on all {attempts} endpoints: {last}")]
    AllEndpointsFailed { attempts: usize, last: String },

    /// The pool list could not be parsed.
    #[error("invalid pool configuration: {0}")]
    Config(String),
}

impl CalendarError {
    /// Whether retrying later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CalendarError::Unavailable { .. }
                | CalendarError::Timeout { .. }
                | CalendarError::NotConfirmed(_)
                | CalendarError::AllEndpointsFailed { .. }
        )
    }
}

/// Result type for calendar operations.
pub type Result<T> = std::result::Result<T, CalendarError>;
