//! Observability events for aerorepo
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Query ran to completion
    QueryExecuted,
    /// Query failed compilation, validation or execution
    QueryRejected,
    /// Bulk mutation written
    BulkMutationApplied,
    /// Staged copies evicted
    StagingInvalidated,
    /// Record inserted or updated
    RecordSaved,
    /// Record deleted
    RecordDeleted,
    /// Engine configuration loaded
    ConfigLoaded,
}

impl Event {
    /// Returns the event name as used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::BulkMutationApplied => "BULK_MUTATION_APPLIED",
            Event::StagingInvalidated => "STAGING_INVALIDATED",
            Event::RecordSaved => "RECORD_SAVED",
            Event::RecordDeleted => "RECORD_DELETED",
            Event::ConfigLoaded => "CONFIG_LOADED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryExecuted | Event::RecordSaved | Event::StagingInvalidated => {
                Severity::Trace
            }
            Event::QueryRejected => Severity::Warn,
            Event::BulkMutationApplied | Event::RecordDeleted | Event::ConfigLoaded => {
                Severity::Info
            }
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
