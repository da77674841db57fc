//! Query error types
//!
//! Error codes:
//! - AERO_QUERY_UNKNOWN_FIELD (REJECT)
//! - AERO_QUERY_INVALID_PAGE_REQUEST (REJECT)
//! - AERO_QUERY_INVALID (REJECT)
//!
//! All query errors are raised while compiling a descriptor, before any
//! record is read.

use std::fmt;

/// Severity levels for query errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Query-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorCode {
    /// Descriptor, sort key or projection names an undeclared field
    AeroQueryUnknownField,
    /// Page size not positive, negative page index, or size over maximum
    AeroQueryInvalidPageRequest,
    /// Malformed descriptor
    AeroQueryInvalid,
}

impl QueryErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorCode::AeroQueryUnknownField => "AERO_QUERY_UNKNOWN_FIELD",
            QueryErrorCode::AeroQueryInvalidPageRequest => "AERO_QUERY_INVALID_PAGE_REQUEST",
            QueryErrorCode::AeroQueryInvalid => "AERO_QUERY_INVALID",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Query error type with full context
#[derive(Debug, Clone, PartialEq)]
pub struct QueryError {
    /// Error code
    code: QueryErrorCode,
    /// Human-readable message
    message: String,
    /// Field name if applicable
    field: Option<String>,
}

impl QueryError {
    /// Create an unknown field error
    pub fn unknown_field(collection: &str, field: impl Into<String>) -> Self {
        let f = field.into();
        Self {
            code: QueryErrorCode::AeroQueryUnknownField,
            message: format!("Collection '{}' has no field '{}'", collection, f),
            field: Some(f),
        }
    }

    /// Create an invalid page request error
    pub fn invalid_page_request(reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::AeroQueryInvalidPageRequest,
            message: reason.into(),
            field: None,
        }
    }

    /// Create a query invalid error
    pub fn query_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::AeroQueryInvalid,
            message: reason.into(),
            field: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> QueryErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the field name if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for QueryError {}

/// Result type for query compilation
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            QueryErrorCode::AeroQueryUnknownField.code(),
            "AERO_QUERY_UNKNOWN_FIELD"
        );
        assert_eq!(
            QueryErrorCode::AeroQueryInvalidPageRequest.code(),
            "AERO_QUERY_INVALID_PAGE_REQUEST"
        );
        assert_eq!(QueryErrorCode::AeroQueryInvalid.code(), "AERO_QUERY_INVALID");
    }

    #[test]
    fn test_error_display() {
        let err = QueryError::unknown_field("member", "email");
        let display = format!("{}", err);
        assert!(display.contains("REJECT"));
        assert!(display.contains("AERO_QUERY_UNKNOWN_FIELD"));
        assert!(display.contains("email"));
        assert_eq!(err.field(), Some("email"));
    }
}
