//! # Backend Errors
//!
//! Failures raised by a data source. The query core never translates these;
//! they reach the caller unmodified.

use thiserror::Error;

use crate::record::RecordId;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Data source errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// Collection not found
    #[error("Collection not found: {0}")]
    UnknownCollection(String),

    /// Query text the backend cannot evaluate
    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),

    /// Write targeted a record that does not exist
    #[error("Record {id} not found in collection '{collection}'")]
    MissingRecord { collection: String, id: RecordId },

    /// Storage constraint rejected the write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Backend-specific failure
    #[error("Backend failure: {0}")]
    Failure(String),
}

impl BackendError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            BackendError::UnknownCollection(_) => "AERO_BACKEND_UNKNOWN_COLLECTION",
            BackendError::UnsupportedQuery(_) => "AERO_BACKEND_UNSUPPORTED_QUERY",
            BackendError::MissingRecord { .. } => "AERO_BACKEND_MISSING_RECORD",
            BackendError::ConstraintViolation(_) => "AERO_BACKEND_CONSTRAINT_VIOLATION",
            BackendError::Failure(_) => "AERO_BACKEND_FAILURE",
        }
    }
}
