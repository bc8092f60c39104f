//! Error taxonomy for DOI reconciliation.
//!
//! The distinction that matters everywhere is transient vs permanent:
//! transient failures are retried on the next tick with no state change,
//! permanent failures block a record until its metadata changes.

use thiserror::Error;

/// Result type alias for beamtime DOI operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the beamtime DOI service.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-level or 5xx failure; safe to retry on a later tick.
    #[error("transient registration failure: {reason}")]
    Transient { reason: String },

    /// Validation or other 4xx failure; retrying the same payload cannot
    /// succeed.
    #[error("permanent registration failure: {reason}")]
    Permanent { reason: String },

    /// The remote draft does not exist.
    #[error("DOI '{doi_id}' not found")]
    NotFound { doi_id: String },

    /// The beamtime snapshot could not be fetched; aborts the current tick.
    #[error("failed to fetch beamtime records: {reason}")]
    Fetch { reason: String },

    /// Two writers raced on the same draft state entry.
    #[error("concurrent write conflict on record '{id}'")]
    Conflict { id: String },

    /// Draft state store failure.
    #[error("draft state store error: {reason}")]
    Store { reason: String },

    /// Missing or malformed configuration.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a transient error.
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient {
            reason: reason.into(),
        }
    }

    /// Create a permanent error.
    pub fn permanent(reason: impl Into<String>) -> Self {
        Self::Permanent {
            reason: reason.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(doi_id: impl Into<String>) -> Self {
        Self::NotFound {
            doi_id: doi_id.into(),
        }
    }

    /// Create a fetch error.
    pub fn fetch(reason: impl Into<String>) -> Self {
        Self::Fetch {
            reason: reason.into(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(id: impl Into<String>) -> Self {
        Self::Conflict { id: id.into() }
    }

    /// Create a store error.
    pub fn store(reason: impl Into<String>) -> Self {
        Self::Store {
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Whether the failed operation may be retried on a later tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Io(_))
    }
}
