//! Staging cache
//!
//! Identity map of records a backend has handed out:
//! - At most one staged copy per (collection, id)
//! - Reads through the staging layer return the staged copy, even if the
//!   backing store changed underneath it
//! - Direct writes never touch it; callers invalidate explicitly
//!
//! Capacity is bounded: once full, new entries are skipped, never evicted.

use std::collections::HashMap;

use crate::record::{Record, RecordId};

/// Configuration for the staging cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingConfig {
    /// Whether records are staged at all
    pub enabled: bool,
    /// Maximum staged records
    pub max_entries: usize,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 10_000,
        }
    }
}

impl StagingConfig {
    /// Staging disabled: every read observes the backing store
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            max_entries: 0,
        }
    }
}

/// Key of a staged record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StagingKey {
    pub collection: String,
    pub id: RecordId,
}

impl StagingKey {
    pub fn new(collection: impl Into<String>, id: RecordId) -> Self {
        Self {
            collection: collection.into(),
            id,
        }
    }
}

/// Cache statistics (passive only)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StagingStats {
    /// Reads served from a staged copy
    pub hits: u64,
    /// Reads that fell through to the store
    pub misses: u64,
    /// Insertions skipped because the cache was full
    pub skipped: u64,
    /// Entries removed by invalidation or clear
    pub invalidations: u64,
}

/// Staged record copies
#[derive(Debug)]
pub struct StagingCache {
    config: StagingConfig,
    entries: HashMap<StagingKey, Record>,
    stats: StagingStats,
}

impl StagingCache {
    pub fn new(config: StagingConfig) -> Self {
        Self {
            entries: HashMap::with_capacity(config.max_entries.min(100)),
            config,
            stats: StagingStats::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Looks up a staged copy
    pub fn get(&mut self, key: &StagingKey) -> Option<&Record> {
        if let Some(record) = self.entries.get(key) {
            self.stats.hits += 1;
            Some(record)
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Stages a record unless one is already staged for the same key
    pub fn stage(&mut self, key: StagingKey, record: Record) {
        if !self.config.enabled || self.entries.contains_key(&key) {
            return;
        }
        if self.entries.len() >= self.config.max_entries {
            self.stats.skipped += 1;
            return;
        }
        self.entries.insert(key, record);
    }

    /// Replaces a staged copy after a write-through update
    pub fn replace(&mut self, key: StagingKey, record: Record) {
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = record;
        } else {
            self.stage(key, record);
        }
    }

    /// Removes one entry; returns true if it was staged
    pub fn remove(&mut self, key: &StagingKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.stats.invalidations += 1;
        }
        removed
    }

    /// Removes the entries of `ids` in `collection`
    pub fn invalidate(&mut self, collection: &str, ids: &[RecordId]) -> usize {
        ids.iter()
            .filter(|id| self.remove(&StagingKey::new(collection, **id)))
            .count()
    }

    /// Clears every entry
    pub fn clear(&mut self) {
        self.stats.invalidations += self.entries.len() as u64;
        self.entries.clear();
    }

    pub fn contains(&self, key: &StagingKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &StagingStats {
        &self.stats
    }
}
