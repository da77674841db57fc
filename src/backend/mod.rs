//! Backend subsystem for aerorepo
//!
//! # Design Principles
//!
//! - The query core never persists anything itself: every read and write goes
//!   through the `DataSource` contract
//! - Staging (identity map) belongs to the backend; the core only asks for
//!   invalidation
//! - Lock modes and read-only hints are forwarded, never interpreted
//!
//! `MemoryBackend` is the bundled implementation.

mod errors;
mod memory;
mod source;
mod staging;

pub use errors::{BackendError, BackendResult};
pub use memory::{BackendStats, MemoryBackend, NamedQueryFn};
pub use source::{DataSource, FieldSelection, LockMode, ReadOptions};
pub use staging::{StagingCache, StagingConfig, StagingKey, StagingStats};
