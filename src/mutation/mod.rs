//! Bulk mutations for aerorepo
//!
//! # Design Principles
//!
//! - One pass: read, mutate, write back
//! - All-or-nothing: mutations run on copies before anything is written
//! - Explicit cache policy: invalidation of staged copies is a caller flag

mod bulk;

pub use bulk::{BulkMutationExecutor, BulkOutcome};
