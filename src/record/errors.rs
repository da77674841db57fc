//! Record error types
//!
//! Error codes:
//! - AERO_RECORD_IMMUTABLE_ID (REJECT)
//! - AERO_RECORD_UNKNOWN_FIELD (REJECT)
//! - AERO_RECORD_TYPE_MISMATCH (REJECT)
//! - AERO_RECORD_OVERFLOW (REJECT)

use std::fmt;

/// Record-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordErrorCode {
    /// Attempt to change a record identifier
    AeroRecordImmutableId,
    /// Field not declared by the record schema
    AeroRecordUnknownField,
    /// Field value does not match declared type
    AeroRecordTypeMismatch,
    /// Integer update outside the i64 range
    AeroRecordOverflow,
}

impl RecordErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            RecordErrorCode::AeroRecordImmutableId => "AERO_RECORD_IMMUTABLE_ID",
            RecordErrorCode::AeroRecordUnknownField => "AERO_RECORD_UNKNOWN_FIELD",
            RecordErrorCode::AeroRecordTypeMismatch => "AERO_RECORD_TYPE_MISMATCH",
            RecordErrorCode::AeroRecordOverflow => "AERO_RECORD_OVERFLOW",
        }
    }
}

impl fmt::Display for RecordErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Record error with field context
#[derive(Debug, Clone, PartialEq)]
pub struct RecordError {
    code: RecordErrorCode,
    message: String,
    field: String,
}

impl RecordError {
    /// Identifier fields cannot be written
    pub fn immutable_id(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            code: RecordErrorCode::AeroRecordImmutableId,
            message: format!("Field '{}' is the record identifier and cannot change", field),
            field,
        }
    }

    /// Create an unknown field error
    pub fn unknown_field(collection: &str, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            code: RecordErrorCode::AeroRecordUnknownField,
            message: format!("Collection '{}' has no field '{}'", collection, field),
            field,
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(field: impl Into<String>, expected: &str, actual: &str) -> Self {
        let field = field.into();
        Self {
            code: RecordErrorCode::AeroRecordTypeMismatch,
            message: format!(
                "Field '{}' expected {}, got {}",
                field, expected, actual
            ),
            field,
        }
    }

    /// Integer arithmetic left the i64 range
    pub fn overflow(field: impl Into<String>, current: i64, delta: i64) -> Self {
        let field = field.into();
        Self {
            code: RecordErrorCode::AeroRecordOverflow,
            message: format!(
                "Field '{}' overflows: {} + {} is outside the integer range",
                field, current, delta
            ),
            field,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> RecordErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending field
    pub fn field(&self) -> &str {
        &self.field
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REJECT] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for RecordError {}

/// Result type for record operations
pub type RecordResult<T> = Result<T, RecordError>;
