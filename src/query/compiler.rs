//! Predicate compiler
//!
//! Turns a `QueryDescriptor` into a `CompiledQuery` bound to one collection.
//!
//! Compilation is the only place field names are checked against the schema:
//! a compiled query never fails on an unknown field at execution time.
//!
//! Explicit query text bypasses clause compilation entirely and is handed to
//! the backend's raw query evaluator.

use crate::executor::PredicateFilter;
use crate::record::{Record, RecordSchema};

use super::ast::{Clause, QueryDescriptor, RawQuery, SortSpec};
use super::errors::{QueryError, QueryResult};

/// Executable AND-filter over records
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledPredicate {
    clauses: Vec<Clause>,
}

impl CompiledPredicate {
    /// Predicate matching every record
    pub fn always() -> Self {
        Self::default()
    }

    /// Returns true if the record satisfies every clause
    pub fn matches(&self, record: &Record) -> bool {
        PredicateFilter::matches(record, &self.clauses)
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }
}

/// Where the candidate records of a query come from
#[derive(Debug, Clone, PartialEq)]
pub enum QuerySource {
    /// Clause-derived filter over a collection scan
    Derived(CompiledPredicate),
    /// Explicit query text evaluated by the backend
    Raw(RawQuery),
}

/// Validated query, ready for execution
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    collection: String,
    source: QuerySource,
    sort: SortSpec,
    single_result: bool,
    fields: Vec<String>,
}

impl CompiledQuery {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn source(&self) -> &QuerySource {
        &self.source
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn is_single_result(&self) -> bool {
        self.single_result
    }

    /// Fields the executor needs from the backend to filter and sort
    pub fn required_fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the predicate of a derived query
    pub fn predicate(&self) -> Option<&CompiledPredicate> {
        match &self.source {
            QuerySource::Derived(predicate) => Some(predicate),
            QuerySource::Raw(_) => None,
        }
    }

    /// Replaces the sort with an already validated one
    pub(crate) fn with_sort(mut self, sort: SortSpec) -> Self {
        for key in sort.keys() {
            if !self.fields.contains(&key.field) {
                self.fields.push(key.field.clone());
            }
        }
        self.sort = sort;
        self
    }
}

/// Compiles descriptors against a record schema
pub struct PredicateCompiler<'a> {
    schema: &'a RecordSchema,
}

impl<'a> PredicateCompiler<'a> {
    /// Creates a new compiler
    pub fn new(schema: &'a RecordSchema) -> Self {
        Self { schema }
    }

    /// Compiles a descriptor.
    ///
    /// This method is deterministic: same descriptor → same compiled query.
    pub fn compile(&self, descriptor: &QueryDescriptor) -> QueryResult<CompiledQuery> {
        let sort = self.compile_sort(&descriptor.sort)?;

        let source = match &descriptor.query_text {
            Some(text) => {
                if text.trim().is_empty() {
                    return Err(QueryError::query_invalid("Query text must not be empty"));
                }
                QuerySource::Raw(RawQuery {
                    text: text.clone(),
                    params: descriptor.query_params.clone(),
                })
            }
            None => QuerySource::Derived(self.compile_predicate(&descriptor.clauses)?),
        };

        let fields = match source {
            QuerySource::Derived(_) => descriptor
                .referenced_fields()
                .into_iter()
                .map(String::from)
                .collect(),
            QuerySource::Raw(_) => Vec::new(),
        };

        Ok(CompiledQuery {
            collection: self.schema.collection.clone(),
            source,
            sort: SortSpec::unsorted(),
            single_result: descriptor.single_result,
            fields,
        }
        .with_sort(sort))
    }

    /// Compiles clauses into a predicate
    pub fn compile_predicate(&self, clauses: &[Clause]) -> QueryResult<CompiledPredicate> {
        for clause in clauses {
            self.check_field(&clause.field)?;
        }
        Ok(CompiledPredicate {
            clauses: clauses.to_vec(),
        })
    }

    /// Validates sort keys
    pub fn compile_sort(&self, sort: &SortSpec) -> QueryResult<SortSpec> {
        for key in sort.keys() {
            self.check_field(&key.field)?;
        }
        Ok(sort.clone())
    }

    /// Fails with `AERO_QUERY_UNKNOWN_FIELD` if the schema lacks `field`
    pub fn check_field(&self, field: &str) -> QueryResult<()> {
        if self.schema.has_field(field) {
            Ok(())
        } else {
            Err(QueryError::unknown_field(&self.schema.collection, field))
        }
    }
}
