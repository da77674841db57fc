//! Observability subsystem for aerorepo
//!
//! - Structured logging (JSON)
//! - Deterministic counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No async or background threads
//! 4. Deterministic output

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{LogTarget, Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

impl Logger {
    /// Logs a typed event at its own severity
    pub fn event(&self, event: Event, fields: &[(&str, &str)]) {
        self.log(event.severity(), event.as_str(), fields);
    }
}
