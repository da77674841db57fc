//! Repository: the caller-facing API
//!
//! A repository binds one collection and its schema to a backend. Every read
//! compiles its descriptor first, so malformed queries are rejected before
//! the backend is touched. Related schemas are registered for nested
//! projections.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::backend::{BackendError, DataSource, LockMode, ReadOptions};
use crate::config::EngineConfig;
use crate::executor::{ExecutorError, Page, QueryExecutor, Slice};
use crate::mutation::BulkMutationExecutor;
use crate::observability::{Event, Logger, MetricsRegistry, MetricsSnapshot};
use crate::projection::{BoundProjection, ProjectionShape, ProjectionView};
use crate::query::{
    CompiledQuery, PageRequest, PredicateCompiler, QueryDescriptor, QueryError, QuerySource,
};
use crate::record::{Record, RecordError, RecordId, RecordResult, RecordSchema};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Repository errors
#[derive(Debug, Error)]
pub enum RepoError {
    /// Descriptor, page request or projection rejected before execution
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Execution failed, including backend failures
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// Write rejected by the schema
    #[error(transparent)]
    Record(#[from] RecordError),
}

impl From<BackendError> for RepoError {
    fn from(err: BackendError) -> Self {
        RepoError::Executor(ExecutorError::Backend(err))
    }
}

impl RepoError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            RepoError::Query(err) => err.code().code(),
            RepoError::Executor(err) => err.code(),
            RepoError::Record(err) => err.code().code(),
        }
    }

    /// Returns true for a single-result query that matched nothing
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepoError::Executor(ExecutorError::NotFound { .. }))
    }
}

/// Repository over one collection
#[derive(Debug)]
pub struct Repository<B: DataSource> {
    backend: B,
    schema: RecordSchema,
    related: BTreeMap<String, RecordSchema>,
    config: EngineConfig,
    logger: Logger,
    metrics: MetricsRegistry,
}

impl<B: DataSource> Repository<B> {
    /// Creates a repository with the default configuration
    pub fn new(backend: B, schema: RecordSchema) -> Self {
        let config = EngineConfig::default();
        Self {
            backend,
            schema,
            related: BTreeMap::new(),
            logger: config.logger(),
            config,
            metrics: MetricsRegistry::new(),
        }
    }

    /// Applies an engine configuration, including its log level
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.logger = config.logger();
        self.config = config;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Registers the schema of a collection reachable through `ref` fields
    pub fn with_related(mut self, schema: RecordSchema) -> Self {
        self.related.insert(schema.collection.clone(), schema);
        self
    }

    pub fn collection(&self) -> &str {
        &self.schema.collection
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Counter snapshot
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    // ==================
    // CRUD
    // ==================

    /// Validates and inserts a record; the backend assigns its identifier
    pub fn save(&mut self, fields: Map<String, Value>) -> RepoResult<Record> {
        self.schema.validate(&fields)?;
        let record = self.backend.insert(&self.schema.collection, fields)?;

        self.metrics.increment_records_saved();
        let id = record.id().to_string();
        self.logger.event(
            Event::RecordSaved,
            &[("collection", &self.schema.collection), ("id", &id)],
        );
        Ok(record)
    }

    /// Writes a modified record back through the staging layer
    pub fn update(&mut self, record: Record) -> RepoResult<()> {
        self.schema.validate(record.fields())?;
        let id = record.id().to_string();
        self.backend.update(&self.schema.collection, record)?;

        self.metrics.increment_records_saved();
        self.logger.event(
            Event::RecordSaved,
            &[("collection", &self.schema.collection), ("id", &id)],
        );
        Ok(())
    }

    /// Identifier lookup through the staging layer
    pub fn find_by_id(&self, id: RecordId) -> RepoResult<Option<Record>> {
        Ok(self
            .backend
            .get(&self.schema.collection, id, &ReadOptions::default())?)
    }

    /// Identifier lookup that fails with `NotFound` on a miss
    pub fn get_by_id(&self, id: RecordId) -> RepoResult<Record> {
        self.find_by_id(id)?.ok_or_else(|| {
            ExecutorError::NotFound {
                collection: self.schema.collection.clone(),
            }
            .into()
        })
    }

    /// Deletes a record; returns false if it did not exist
    pub fn delete(&mut self, id: RecordId) -> RepoResult<bool> {
        let deleted = self.backend.delete(&self.schema.collection, id)?;
        if deleted {
            self.metrics.increment_records_deleted();
            let id = id.to_string();
            self.logger.event(
                Event::RecordDeleted,
                &[("collection", &self.schema.collection), ("id", &id)],
            );
        }
        Ok(deleted)
    }

    pub fn count(&self) -> RepoResult<usize> {
        Ok(self.backend.count(&self.schema.collection)?)
    }

    // ==================
    // Queries
    // ==================

    /// Compiles a descriptor against this repository's schema
    pub fn compile(&self, descriptor: &QueryDescriptor) -> RepoResult<CompiledQuery> {
        Ok(PredicateCompiler::new(&self.schema).compile(descriptor)?)
    }

    /// First page with the configured default size
    pub fn default_page_request(&self) -> PageRequest {
        PageRequest::first(self.config.default_page_size)
    }

    /// One page plus the total count of matching records.
    ///
    /// A non-empty sort on the request replaces the descriptor's sort.
    pub fn find_page(
        &self,
        descriptor: &QueryDescriptor,
        request: &PageRequest,
    ) -> RepoResult<Page<Record>> {
        let result = self.prepare(descriptor, Some(request)).and_then(|query| {
            Ok(QueryExecutor::new(&self.backend).find_page(&query, request)?)
        });
        self.observe("page", result, |page| page.content().len())
    }

    /// One page without a total count
    pub fn find_slice(
        &self,
        descriptor: &QueryDescriptor,
        request: &PageRequest,
    ) -> RepoResult<Slice<Record>> {
        let result = self.prepare(descriptor, Some(request)).and_then(|query| {
            Ok(QueryExecutor::new(&self.backend).find_slice(&query, request)?)
        });
        self.observe("slice", result, |slice| slice.content().len())
    }

    /// Every matching record
    pub fn find_all(&self, descriptor: &QueryDescriptor) -> RepoResult<Vec<Record>> {
        self.find_all_with(descriptor, &ReadOptions::default())
    }

    /// Every matching record, with explicit read options
    pub fn find_all_with(
        &self,
        descriptor: &QueryDescriptor,
        options: &ReadOptions,
    ) -> RepoResult<Vec<Record>> {
        let result = self.prepare(descriptor, None).and_then(|query| {
            Ok(QueryExecutor::new(&self.backend).find_all(&query, options)?)
        });
        self.observe("all", result, Vec::len)
    }

    /// Exactly one matching record
    pub fn find_one(&self, descriptor: &QueryDescriptor, lock: LockMode) -> RepoResult<Record> {
        let result = self.prepare(descriptor, None).and_then(|query| {
            Ok(QueryExecutor::new(&self.backend).find_one(&query, lock)?)
        });
        self.observe("one", result, |_| 1)
    }

    /// Values of one field across matching records
    pub fn find_values(&self, descriptor: &QueryDescriptor, field: &str) -> RepoResult<Vec<Value>> {
        let result = self.prepare(descriptor, None).and_then(|query| {
            PredicateCompiler::new(&self.schema).check_field(field)?;
            Ok(QueryExecutor::new(&self.backend).find_values(&query, field)?)
        });
        self.observe("values", result, Vec::len)
    }

    /// Every matching record as a projection view
    pub fn find_all_projected(
        &self,
        descriptor: &QueryDescriptor,
        shape: &ProjectionShape,
    ) -> RepoResult<Vec<ProjectionView>> {
        let result = self.prepare(descriptor, None).and_then(|query| {
            let projection = self.bind(shape)?;
            Ok(QueryExecutor::new(&self.backend).find_all_projected(&query, &projection)?)
        });
        self.observe("all_projected", result, Vec::len)
    }

    /// One page of projection views
    pub fn find_page_projected(
        &self,
        descriptor: &QueryDescriptor,
        request: &PageRequest,
        shape: &ProjectionShape,
    ) -> RepoResult<Page<ProjectionView>> {
        let result = self.prepare(descriptor, Some(request)).and_then(|query| {
            let projection = self.bind(shape)?;
            Ok(QueryExecutor::new(&self.backend).find_page_projected(
                &query,
                request,
                &projection,
            )?)
        });
        self.observe("page_projected", result, |page| page.content().len())
    }

    // ==================
    // Mutations
    // ==================

    /// Applies `mutation` to every record matching `descriptor`.
    ///
    /// Mutated records are re-validated against the schema; any failure
    /// aborts with nothing written. With `invalidate`, staged copies of the
    /// affected records are evicted before returning.
    pub fn bulk_mutate<F>(
        &mut self,
        descriptor: &QueryDescriptor,
        mutation: F,
        invalidate: bool,
    ) -> RepoResult<usize>
    where
        F: Fn(&mut Record) -> RecordResult<()>,
    {
        let query = self.compile(descriptor)?;
        let predicate = match query.source() {
            QuerySource::Derived(predicate) => predicate.clone(),
            QuerySource::Raw(raw) => {
                return Err(QueryError::query_invalid(format!(
                    "Bulk mutations need a derived query, got query text '{}'",
                    raw.text
                ))
                .into())
            }
        };

        let schema = &self.schema;
        let outcome = BulkMutationExecutor::new(&mut self.backend).execute(
            &schema.collection,
            &predicate,
            |record| {
                mutation(record)?;
                schema.validate(record.fields())
            },
            invalidate,
        )?;

        self.metrics.add_records_mutated(outcome.affected as u64);
        self.metrics
            .add_staging_invalidations(outcome.invalidated as u64);

        let affected = outcome.affected.to_string();
        let invalidated = outcome.invalidated.to_string();
        self.logger.event(
            Event::BulkMutationApplied,
            &[
                ("affected", &affected),
                ("collection", &schema.collection),
                ("invalidate", if invalidate { "true" } else { "false" }),
            ],
        );
        if outcome.invalidated > 0 {
            self.logger.event(
                Event::StagingInvalidated,
                &[("collection", &schema.collection), ("entries", &invalidated)],
            );
        }
        Ok(outcome.affected)
    }

    /// Drops every staged copy held by the backend
    pub fn clear_staging(&mut self) {
        self.backend.clear_staging();
        self.logger.event(
            Event::StagingInvalidated,
            &[("collection", "*"), ("entries", "all")],
        );
    }

    // ==================
    // Internals
    // ==================

    /// Compiles the descriptor and applies the page request's sort and size
    /// limits
    fn prepare(
        &self,
        descriptor: &QueryDescriptor,
        request: Option<&PageRequest>,
    ) -> RepoResult<CompiledQuery> {
        let compiler = PredicateCompiler::new(&self.schema);
        let query = compiler.compile(descriptor)?;

        let Some(request) = request else {
            return Ok(query);
        };
        if request.size() > self.config.max_page_size {
            return Err(QueryError::invalid_page_request(format!(
                "Page size {} exceeds the maximum of {}",
                request.size(),
                self.config.max_page_size
            ))
            .into());
        }
        if request.sort().is_unsorted() {
            return Ok(query);
        }
        let sort = compiler.compile_sort(request.sort())?;
        Ok(query.with_sort(sort))
    }

    fn bind(&self, shape: &ProjectionShape) -> RepoResult<BoundProjection> {
        Ok(shape.bind(&self.schema, &self.related)?)
    }

    /// Counts and logs the outcome of a query
    fn observe<T>(
        &self,
        mode: &str,
        result: RepoResult<T>,
        rows: impl FnOnce(&T) -> usize,
    ) -> RepoResult<T> {
        match &result {
            Ok(value) => {
                self.metrics.increment_queries_executed();
                let rows = rows(value).to_string();
                self.logger.event(
                    Event::QueryExecuted,
                    &[
                        ("collection", &self.schema.collection),
                        ("mode", mode),
                        ("rows", &rows),
                    ],
                );
            }
            Err(err) => {
                self.metrics.increment_queries_rejected();
                let message = err.to_string();
                self.logger.event(
                    Event::QueryRejected,
                    &[
                        ("code", err.code()),
                        ("collection", &self.schema.collection),
                        ("message", &message),
                        ("mode", mode),
                    ],
                );
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::query::{QueryErrorCode, SortSpec};
    use crate::record::{FieldDef, FieldType};
    use serde_json::json;

    fn fields(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn repo() -> Repository<MemoryBackend> {
        let schema = RecordSchema::new("member")
            .with_field("username", FieldDef::required(FieldType::String))
            .with_field("age", FieldDef::optional(FieldType::Int));
        Repository::new(MemoryBackend::default().with_collection("member"), schema)
            .with_logger(Logger::silent())
    }

    #[test]
    fn test_save_validates() {
        let mut repo = repo();
        let err = repo.save(fields(json!({"username": 5}))).unwrap_err();
        assert_eq!(err.code(), "AERO_RECORD_TYPE_MISMATCH");
        assert_eq!(repo.count().unwrap(), 0);

        let saved = repo.save(fields(json!({"username": "m1", "age": 10}))).unwrap();
        assert_eq!(repo.find_by_id(saved.id()).unwrap(), Some(saved));
        assert_eq!(repo.metrics().records_saved, 1);
    }

    #[test]
    fn test_unknown_field_never_reaches_backend() {
        let repo = repo();
        let err = repo
            .find_all(&QueryDescriptor::all().where_eq("email", "x"))
            .unwrap_err();
        assert!(matches!(&err, RepoError::Query(q) if q.code() == QueryErrorCode::AeroQueryUnknownField));
        assert_eq!(repo.backend().stats().scans, 0);
        assert_eq!(repo.metrics().queries_rejected, 1);
    }

    #[test]
    fn test_page_size_above_max_rejected() {
        let repo = repo().with_config(EngineConfig {
            max_page_size: 10,
            default_page_size: 5,
            ..EngineConfig::default()
        });
        let repo = repo.with_logger(Logger::silent());

        let err = repo
            .find_page(&QueryDescriptor::all(), &PageRequest::of(0, 11).unwrap())
            .unwrap_err();
        assert_eq!(err.code(), "AERO_QUERY_INVALID_PAGE_REQUEST");
        assert_eq!(repo.default_page_request().size(), 5);
    }

    #[test]
    fn test_request_sort_overrides_descriptor_sort() {
        let mut repo = repo();
        for (name, age) in [("a", 3), ("b", 1), ("c", 2)] {
            repo.save(fields(json!({"username": name, "age": age}))).unwrap();
        }
        let descriptor = QueryDescriptor::all().with_sort(SortSpec::asc("username"));

        let unsorted = PageRequest::of(0, 3).unwrap();
        let page = repo.find_page(&descriptor, &unsorted).unwrap();
        assert_eq!(page.content()[0].get_str("username"), Some("a"));

        let by_age = PageRequest::sorted(0, 3, SortSpec::desc("age")).unwrap();
        let page = repo.find_page(&descriptor, &by_age).unwrap();
        assert_eq!(page.content()[0].get_i64("age"), Some(3));
        assert_eq!(page.content()[1].get_i64("age"), Some(2));

        let bad = PageRequest::sorted(0, 3, SortSpec::desc("email")).unwrap();
        assert!(repo.find_page(&descriptor, &bad).is_err());
    }

    #[test]
    fn test_bulk_mutate_revalidates() {
        let mut repo = repo();
        repo.save(fields(json!({"username": "m1", "age": 20}))).unwrap();

        let err = repo
            .bulk_mutate(
                &QueryDescriptor::all(),
                |r| r.set("age", json!("old")).map(|_| ()),
                true,
            )
            .unwrap_err();
        assert_eq!(err.code(), "AERO_RECORD_TYPE_MISMATCH");

        let ages = repo
            .find_values(&QueryDescriptor::all(), "age")
            .unwrap();
        assert_eq!(ages, vec![json!(20)]);
    }

    #[test]
    fn test_bulk_mutate_rejects_query_text() {
        let mut repo = repo();
        let err = repo
            .bulk_mutate(&QueryDescriptor::text("Member.bulk"), |_| Ok(()), true)
            .unwrap_err();
        assert_eq!(err.code(), "AERO_QUERY_INVALID");
    }

    #[test]
    fn test_get_by_id_not_found() {
        let repo = repo();
        let err = repo.get_by_id(RecordId(42)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_find_values_unknown_field() {
        let mut repo = repo();
        repo.save(fields(json!({"username": "m1"}))).unwrap();
        let err = repo.find_values(&QueryDescriptor::all(), "email").unwrap_err();
        assert_eq!(err.code(), "AERO_QUERY_UNKNOWN_FIELD");
    }
}
