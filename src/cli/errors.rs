//! CLI-specific error types

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::repository::RepoError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (files, stdout)
    IoError,
    /// Dataset file malformed or rejected by its schemas
    DatasetError,
    /// Query file malformed
    QueryFileError,
    /// Query rejected or failed; carries the engine's own code
    QueryFailed(&'static str),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "AERO_CLI_CONFIG_ERROR",
            Self::IoError => "AERO_CLI_IO_ERROR",
            Self::DatasetError => "AERO_CLI_DATASET_ERROR",
            Self::QueryFileError => "AERO_CLI_QUERY_FILE_ERROR",
            Self::QueryFailed(code) => *code,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn dataset_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::DatasetError, msg)
    }

    pub fn query_file_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::QueryFileError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<RepoError> for CliError {
    fn from(e: RepoError) -> Self {
        Self::new(CliErrorCode::QueryFailed(e.code()), e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
