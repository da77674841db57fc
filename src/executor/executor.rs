//! Query executor for aerorepo
//!
//! Executes compiled queries against a data source, producing deterministic
//! results.
//!
//! Execution flow (strict order):
//! 1. Obtain candidates: collection scan (derived) or raw evaluation
//! 2. Filter records strictly according to the compiled predicate
//! 3. Count the filtered set (pages only)
//! 4. Apply sort
//! 5. Cut the page window
//! 6. Project, if a shape was requested
//!
//! The executor never writes.

use serde_json::Value;

use crate::backend::{DataSource, FieldSelection, LockMode, ReadOptions};
use crate::projection::{BoundProjection, ProjectionMapper, ProjectionView};
use crate::query::{CompiledQuery, PageRequest, QuerySource};
use crate::record::Record;

use super::errors::{ExecutorError, ExecutorResult};
use super::plan::PagePlanner;
use super::result::{Page, Slice};

/// Query executor
pub struct QueryExecutor<'a, B: DataSource + ?Sized> {
    backend: &'a B,
}

impl<'a, B: DataSource + ?Sized> QueryExecutor<'a, B> {
    /// Creates a new executor
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// One page of records plus the total count of the filtered set
    pub fn find_page(
        &self,
        query: &CompiledQuery,
        request: &PageRequest,
    ) -> ExecutorResult<Page<Record>> {
        let records = self.fetch(query, &FieldSelection::All, &ReadOptions::default())?;
        let total = records.len();
        let content = PagePlanner::for_page(query.sort(), request).apply(records);
        Ok(Page::new(content, request, total))
    }

    /// One page of records without a total count
    pub fn find_slice(
        &self,
        query: &CompiledQuery,
        request: &PageRequest,
    ) -> ExecutorResult<Slice<Record>> {
        let records = self.fetch(query, &FieldSelection::All, &ReadOptions::default())?;
        let content = PagePlanner::for_slice(query.sort(), request).apply(records);
        Ok(Slice::from_lookahead(content, request))
    }

    /// Every matching record, sorted.
    ///
    /// A query declared single-result fails with `AmbiguousResult` when more
    /// than one record matches.
    pub fn find_all(
        &self,
        query: &CompiledQuery,
        options: &ReadOptions,
    ) -> ExecutorResult<Vec<Record>> {
        let records = self.fetch(query, &FieldSelection::All, options)?;
        if query.is_single_result() && records.len() > 1 {
            return Err(ExecutorError::AmbiguousResult {
                collection: query.collection().to_string(),
                count: records.len(),
            });
        }
        Ok(PagePlanner::unpaged(query.sort()).apply(records))
    }

    /// Exactly one matching record
    pub fn find_one(&self, query: &CompiledQuery, lock: LockMode) -> ExecutorResult<Record> {
        let mut records = self.fetch(query, &FieldSelection::All, &ReadOptions::locked(lock))?;
        match records.len() {
            0 => Err(ExecutorError::NotFound {
                collection: query.collection().to_string(),
            }),
            1 => Ok(records.remove(0)),
            count => Err(ExecutorError::AmbiguousResult {
                collection: query.collection().to_string(),
                count,
            }),
        }
    }

    /// Values of one field across every matching record, sorted
    pub fn find_values(&self, query: &CompiledQuery, field: &str) -> ExecutorResult<Vec<Value>> {
        let selection = Self::selection_for(query, &[field.to_string()]);
        let records = self.fetch(query, &selection, &ReadOptions::read_only())?;
        Ok(PagePlanner::unpaged(query.sort())
            .apply(records)
            .iter()
            .map(|r| r.get(field).cloned().unwrap_or(Value::Null))
            .collect())
    }

    /// Every matching record, projected
    pub fn find_all_projected(
        &self,
        query: &CompiledQuery,
        projection: &BoundProjection,
    ) -> ExecutorResult<Vec<ProjectionView>> {
        let records = self.fetch_projected(query, projection)?;
        let content = PagePlanner::unpaged(query.sort()).apply(records);
        self.project(&content, projection)
    }

    /// One page, projected; the total still counts the full filtered set
    pub fn find_page_projected(
        &self,
        query: &CompiledQuery,
        request: &PageRequest,
        projection: &BoundProjection,
    ) -> ExecutorResult<Page<ProjectionView>> {
        let records = self.fetch_projected(query, projection)?;
        let total = records.len();
        let content = PagePlanner::for_page(query.sort(), request).apply(records);
        let views = self.project(&content, projection)?;
        Ok(Page::new(views, request, total))
    }

    fn fetch_projected(
        &self,
        query: &CompiledQuery,
        projection: &BoundProjection,
    ) -> ExecutorResult<Vec<Record>> {
        let selection = Self::selection_for(query, projection.required_fields());
        self.fetch(query, &selection, &ReadOptions::read_only())
    }

    fn project(
        &self,
        records: &[Record],
        projection: &BoundProjection,
    ) -> ExecutorResult<Vec<ProjectionView>> {
        Ok(ProjectionMapper::new(self.backend).map(records, projection)?)
    }

    /// Minimal selection: query fields plus `extra`
    fn selection_for(query: &CompiledQuery, extra: &[String]) -> FieldSelection {
        match query.source() {
            QuerySource::Derived(_) => FieldSelection::only(
                query
                    .required_fields()
                    .iter()
                    .chain(extra.iter())
                    .cloned(),
            ),
            QuerySource::Raw(_) => FieldSelection::All,
        }
    }

    /// Candidate records after filtering, in storage order
    fn fetch(
        &self,
        query: &CompiledQuery,
        selection: &FieldSelection,
        options: &ReadOptions,
    ) -> ExecutorResult<Vec<Record>> {
        match query.source() {
            QuerySource::Derived(predicate) => {
                let candidates = self.backend.scan(query.collection(), selection, options)?;
                Ok(candidates
                    .into_iter()
                    .filter(|record| predicate.matches(record))
                    .collect())
            }
            QuerySource::Raw(raw) => {
                let records = self.backend.evaluate_raw(query.collection(), raw, options)?;
                Ok(records.into_iter().map(|r| selection.apply(r)).collect())
            }
        }
    }
}
