//! Bulk mutation executor
//!
//! Applies one mutation to every record matching a predicate, in one pass
//! over the backing store:
//! 1. Read matching records directly from the store (staging bypassed)
//! 2. Apply the mutation to copies; any failure aborts with nothing written
//! 3. Write all copies back through the direct write path
//! 4. Optionally evict staged copies of the affected records
//!
//! Without step 4, staged copies fetched before the mutation stay stale and
//! keep being served by reads that go through the staging layer.

use crate::backend::{DataSource, FieldSelection, ReadOptions};
use crate::executor::ExecutorResult;
use crate::query::CompiledPredicate;
use crate::record::{Record, RecordId, RecordResult};

/// Outcome of one bulk mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkOutcome {
    /// Records mutated
    pub affected: usize,
    /// Staged copies evicted
    pub invalidated: usize,
}

/// Bulk mutation executor
pub struct BulkMutationExecutor<'a, B: DataSource + ?Sized> {
    backend: &'a mut B,
}

impl<'a, B: DataSource + ?Sized> BulkMutationExecutor<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        Self { backend }
    }

    /// Mutates every record of `collection` matching `predicate`.
    ///
    /// All-or-nothing: if `mutation` fails for any record, no record is
    /// written and the error is returned.
    pub fn execute<F>(
        &mut self,
        collection: &str,
        predicate: &CompiledPredicate,
        mutation: F,
        invalidate: bool,
    ) -> ExecutorResult<BulkOutcome>
    where
        F: Fn(&mut Record) -> RecordResult<()>,
    {
        let mut matching: Vec<Record> = self
            .backend
            .scan(collection, &FieldSelection::All, &ReadOptions::direct())?
            .into_iter()
            .filter(|record| predicate.matches(record))
            .collect();

        for record in matching.iter_mut() {
            mutation(record)?;
        }

        let ids: Vec<RecordId> = matching.iter().map(Record::id).collect();
        let affected = if matching.is_empty() {
            0
        } else {
            self.backend.write_direct(collection, matching)?
        };

        let invalidated = if invalidate && !ids.is_empty() {
            self.backend.invalidate(collection, &ids)
        } else {
            0
        };

        Ok(BulkOutcome {
            affected,
            invalidated,
        })
    }
}
