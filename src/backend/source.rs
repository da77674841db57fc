//! Data source contract
//!
//! The query core reads and writes exclusively through `DataSource`. A
//! backend owns persistence, its staging layer (identity map) and any row
//! locking; the core only forwards `ReadOptions` as configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::query::RawQuery;
use crate::record::{Record, RecordId, ID_FIELD};

use super::errors::{BackendError, BackendResult};

/// Row lock requested for a read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
    /// No lock
    #[default]
    None,
    /// Shared lock held for the read
    PessimisticRead,
    /// Exclusive lock held for the read
    PessimisticWrite,
}

impl LockMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockMode::None => "none",
            LockMode::PessimisticRead => "pessimistic_read",
            LockMode::PessimisticWrite => "pessimistic_write",
        }
    }
}

/// Hints passed to the backend with every read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Lock mode forwarded to the backend
    pub lock: LockMode,
    /// Results are not tracked by the staging layer
    pub read_only: bool,
    /// Read the backing store directly, ignoring staged copies
    pub bypass_staging: bool,
}

impl ReadOptions {
    /// Read-only hint: results are never staged
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    /// Read with a lock
    pub fn locked(lock: LockMode) -> Self {
        Self {
            lock,
            ..Self::default()
        }
    }

    /// Store-level read used by bulk mutations
    pub fn direct() -> Self {
        Self {
            read_only: true,
            bypass_staging: true,
            ..Self::default()
        }
    }
}

/// Fields a read must materialize
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldSelection {
    /// Every stored field
    #[default]
    All,
    /// Only the listed fields (the identifier is always included)
    Only(Vec<String>),
}

impl FieldSelection {
    /// Selection of the given fields
    pub fn only<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        let mut selected: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into();
            if !selected.contains(&field) {
                selected.push(field);
            }
        }
        FieldSelection::Only(selected)
    }

    /// Returns true if the selection includes `field`
    pub fn includes(&self, field: &str) -> bool {
        match self {
            FieldSelection::All => true,
            FieldSelection::Only(fields) => field == ID_FIELD || fields.iter().any(|f| f == field),
        }
    }

    /// Union of two selections
    pub fn union(&self, other: &FieldSelection) -> FieldSelection {
        match (self, other) {
            (FieldSelection::Only(a), FieldSelection::Only(b)) => {
                FieldSelection::only(a.iter().chain(b.iter()).cloned())
            }
            _ => FieldSelection::All,
        }
    }

    /// Narrows a record to this selection
    pub fn apply(&self, record: Record) -> Record {
        match self {
            FieldSelection::All => record,
            FieldSelection::Only(fields) => record.select(fields.iter().map(String::as_str)),
        }
    }
}

/// Backend data source
///
/// Reads take `&self`; writes take `&mut self`. Implementations are expected
/// to serialize writes themselves.
pub trait DataSource {
    /// Inserts a new record, assigning its identifier
    fn insert(&mut self, collection: &str, fields: Map<String, Value>) -> BackendResult<Record>;

    /// Writes a modified record through the staging layer
    fn update(&mut self, collection: &str, record: Record) -> BackendResult<()>;

    /// Deletes a record; returns false if it did not exist
    fn delete(&mut self, collection: &str, id: RecordId) -> BackendResult<bool>;

    /// Number of stored records
    fn count(&self, collection: &str) -> BackendResult<usize>;

    /// Full scan in insertion order
    fn scan(
        &self,
        collection: &str,
        selection: &FieldSelection,
        options: &ReadOptions,
    ) -> BackendResult<Vec<Record>>;

    /// Identifier point lookup
    fn get(
        &self,
        collection: &str,
        id: RecordId,
        options: &ReadOptions,
    ) -> BackendResult<Option<Record>>;

    /// Read-only batch point lookup; missing identifiers are skipped and
    /// nothing is staged
    fn get_many(
        &self,
        collection: &str,
        ids: &[RecordId],
        selection: &FieldSelection,
    ) -> BackendResult<Vec<Record>>;

    /// Replaces stored records directly, bypassing the staging layer.
    ///
    /// Either every record is written or none is.
    fn write_direct(&mut self, collection: &str, records: Vec<Record>) -> BackendResult<usize>;

    /// Evicts staged copies of the given records; returns how many were staged
    fn invalidate(&mut self, collection: &str, ids: &[RecordId]) -> usize;

    /// Drops every staged copy
    fn clear_staging(&mut self);

    /// Evaluates explicit query text
    fn evaluate_raw(
        &self,
        collection: &str,
        query: &RawQuery,
        options: &ReadOptions,
    ) -> BackendResult<Vec<Record>> {
        let _ = (collection, options);
        Err(BackendError::UnsupportedQuery(query.text.clone()))
    }
}
