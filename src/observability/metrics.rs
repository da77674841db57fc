//! Metrics registry for aerorepo
//!
//! - Counters only (no gauges, no histograms)
//! - Monotonic increase
//! - Thread-safe but lock-minimal

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Registry of operational counters
///
/// Uses Relaxed ordering: counters are independent and only read as a
/// snapshot.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    queries_executed: AtomicU64,
    queries_rejected: AtomicU64,
    records_mutated: AtomicU64,
    staging_invalidations: AtomicU64,
    records_saved: AtomicU64,
    records_deleted: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Query metrics

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    // Mutation metrics

    /// Adds the affected count of one bulk mutation
    pub fn add_records_mutated(&self, count: u64) {
        self.records_mutated.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_staging_invalidations(&self, count: u64) {
        self.staging_invalidations.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_records_saved(&self) {
        self.records_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_records_deleted(&self) {
        self.records_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            records_mutated: self.records_mutated.load(Ordering::Relaxed),
            staging_invalidations: self.staging_invalidations.load(Ordering::Relaxed),
            records_saved: self.records_saved.load(Ordering::Relaxed),
            records_deleted: self.records_deleted.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub queries_rejected: u64,
    pub records_mutated: u64,
    pub staging_invalidations: u64,
    pub records_saved: u64,
    pub records_deleted: u64,
}
