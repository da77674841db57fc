//! Engine configuration
//!
//! Loaded from a JSON file; every field is optional and falls back to its
//! default. Validation runs on load.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::StagingConfig;
use crate::observability::{LogTarget, Logger, Severity};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read(_) => "AERO_CONFIG_READ",
            ConfigError::Parse(_) => "AERO_CONFIG_PARSE",
            ConfigError::Invalid(_) => "AERO_CONFIG_INVALID",
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Page size used when a caller does not ask for one
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Largest page size a request may ask for
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Whether the in-memory backend stages records
    #[serde(default = "default_staging_enabled")]
    pub staging_enabled: bool,

    /// Staging cache capacity
    #[serde(default = "default_staging_max_entries")]
    pub staging_max_entries: usize,

    /// Minimum log severity: trace, info, warn, error or fatal
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_page_size() -> usize {
    20
}
fn default_max_page_size() -> usize {
    2000
}
fn default_staging_enabled() -> bool {
    true
}
fn default_staging_max_entries() -> usize {
    10_000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            staging_enabled: default_staging_enabled(),
            staging_max_entries: default_staging_max_entries(),
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates sizes and the log level
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_size == 0 {
            return Err(ConfigError::Invalid("default_page_size must be > 0".into()));
        }
        if self.max_page_size == 0 {
            return Err(ConfigError::Invalid("max_page_size must be > 0".into()));
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::Invalid(format!(
                "default_page_size ({}) exceeds max_page_size ({})",
                self.default_page_size, self.max_page_size
            )));
        }
        if self.staging_enabled && self.staging_max_entries == 0 {
            return Err(ConfigError::Invalid(
                "staging_max_entries must be > 0 when staging is enabled".into(),
            ));
        }
        self.severity()?;
        Ok(())
    }

    /// Parsed minimum log severity
    pub fn severity(&self) -> Result<Severity, ConfigError> {
        Severity::parse(&self.log_level)
            .ok_or_else(|| ConfigError::Invalid(format!("Unknown log_level: '{}'", self.log_level)))
    }

    /// Staging settings for the in-memory backend
    pub fn staging(&self) -> StagingConfig {
        if self.staging_enabled {
            StagingConfig {
                enabled: true,
                max_entries: self.staging_max_entries,
            }
        } else {
            StagingConfig::disabled()
        }
    }

    /// Logger writing to stderr at the configured level
    pub fn logger(&self) -> Logger {
        Logger::new(self.severity().unwrap_or(Severity::Info), LogTarget::Stderr)
    }
}
