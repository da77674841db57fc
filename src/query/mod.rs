//! Query descriptors and the predicate compiler
//!
//! # Design Principles
//!
//! - Explicit: derived queries are structured values, not parsed names
//! - Early: unknown fields are rejected at compile time (never mid-scan)
//! - Conjunctive: all clauses combine with AND; no OR/NOT
//! - Deterministic: same descriptor → same compiled query
//!
//! Explicit query text bypasses the compiler and goes to the backend's raw
//! query evaluator.

mod ast;
mod compiler;
mod errors;
mod page;

pub use ast::{Clause, Operator, QueryDescriptor, RawQuery, SortDirection, SortKey, SortSpec};
pub use compiler::{CompiledPredicate, CompiledQuery, PredicateCompiler, QuerySource};
pub use errors::{QueryError, QueryErrorCode, QueryResult, Severity};
pub use page::PageRequest;
