//! Query Executor subsystem for aerorepo
//!
//! The executor consumes compiled queries and produces deterministic results.
//!
//! # Execution Flow (strict order)
//!
//! 1. Obtain candidate records from the data source
//! 2. Filter records strictly according to the predicate
//! 3. Count (pages only)
//! 4. Apply sort, stable on insertion order
//! 5. Apply the page window
//! 6. Return ordered results, optionally projected
//!
//! # Guarantees
//!
//! - Same data + same query → same result
//! - Read-only: no side effects on stored data
//! - Backend failures propagate unmodified

mod errors;
mod executor;
mod filters;
mod plan;
mod result;
mod sorter;

pub use errors::{ExecutorError, ExecutorResult};
pub use executor::QueryExecutor;
pub use filters::PredicateFilter;
pub use plan::{PagePlan, PagePlanner};
pub use result::{Page, Slice};
pub use sorter::ResultSorter;
