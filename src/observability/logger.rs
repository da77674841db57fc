//! Structured JSON logger for aerorepo
//!
//! - Structured logs (JSON)
//! - Deterministic key ordering
//! - Explicit severity levels
//! - One log line = one event
//! - Synchronous, no buffering

use std::fmt;
use std::io::{self, Write};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable, process exits
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// Parses a configured level name (case-insensitive)
    pub fn parse(level: &str) -> Option<Self> {
        match level.to_ascii_lowercase().as_str() {
            "trace" => Some(Severity::Trace),
            "info" => Some(Severity::Info),
            "warn" => Some(Severity::Warn),
            "error" => Some(Severity::Error),
            "fatal" => Some(Severity::Fatal),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    /// Keeps stdout free for command output
    Stderr,
    Discard,
}

/// A structured logger that outputs JSON logs
///
/// Events below `min_severity` are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Logger {
    min_severity: Severity,
    target: LogTarget,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Severity::Info, LogTarget::Stderr)
    }
}

impl Logger {
    pub fn new(min_severity: Severity, target: LogTarget) -> Self {
        Self {
            min_severity,
            target,
        }
    }

    /// Logger that writes nothing
    pub fn silent() -> Self {
        Self::new(Severity::Fatal, LogTarget::Discard)
    }

    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }

    /// Returns true if events of `severity` are written
    pub fn enabled(&self, severity: Severity) -> bool {
        self.target != LogTarget::Discard && severity >= self.min_severity
    }

    /// Log an event with the given severity and fields
    ///
    /// Fields are output in deterministic order (alphabetical by key)
    pub fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if !self.enabled(severity) {
            return;
        }
        match self.target {
            LogTarget::Stdout => Self::log_to_writer(severity, event, fields, &mut io::stdout()),
            LogTarget::Stderr => Self::log_to_writer(severity, event, fields, &mut io::stderr()),
            LogTarget::Discard => {}
        }
    }

    /// Writes one log line to `writer`
    pub fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        let mut output = String::with_capacity(256);

        output.push('{');

        // Always output event first
        output.push_str("\"event\":\"");
        Self::escape_json_string(&mut output, event);
        output.push('"');

        output.push_str(",\"severity\":\"");
        output.push_str(severity.as_str());
        output.push('"');

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push_str(",\"");
            Self::escape_json_string(&mut output, key);
            output.push_str("\":\"");
            Self::escape_json_string(&mut output, value);
            output.push('"');
        }

        output.push('}');
        output.push('\n');

        // Write atomically (one syscall)
        let _ = writer.write_all(output.as_bytes());
        let _ = writer.flush();
    }

    /// Escape special characters for JSON strings
    fn escape_json_string(output: &mut String, s: &str) {
        for c in s.chars() {
            match c {
                '"' => output.push_str("\\\""),
                '\\' => output.push_str("\\\\"),
                '\n' => output.push_str("\\n"),
                '\r' => output.push_str("\\r"),
                '\t' => output.push_str("\\t"),
                c if c.is_control() => {
                    output.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => output.push(c),
            }
        }
    }

    pub fn trace(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Trace, event, fields);
    }

    pub fn info(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Info, event, fields);
    }

    pub fn warn(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Warn, event, fields);
    }

    pub fn error(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Error, event, fields);
    }
}

/// Capture logs to a buffer for testing
#[cfg(test)]
pub fn capture_log(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut buffer = Vec::new();
    Logger::log_to_writer(severity, event, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}
