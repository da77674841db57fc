//! # Executor Errors
//!
//! Error codes:
//! - AERO_EXECUTOR_NOT_FOUND
//! - AERO_EXECUTOR_AMBIGUOUS_RESULT
//! - backend and record codes pass through unchanged

use thiserror::Error;

use crate::backend::BackendError;
use crate::record::RecordError;

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Query and mutation execution errors
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Single-result query matched nothing
    #[error("No record in '{collection}' matched the query")]
    NotFound { collection: String },

    /// Single-result query matched more than one record
    #[error("Expected one record in '{collection}', found {count}")]
    AmbiguousResult { collection: String, count: usize },

    /// Backend failure, unmodified
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A mutation rejected a record
    #[error(transparent)]
    Record(#[from] RecordError),
}

impl ExecutorError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorError::NotFound { .. } => "AERO_EXECUTOR_NOT_FOUND",
            ExecutorError::AmbiguousResult { .. } => "AERO_EXECUTOR_AMBIGUOUS_RESULT",
            ExecutorError::Backend(err) => err.code(),
            ExecutorError::Record(err) => err.code().code(),
        }
    }
}
