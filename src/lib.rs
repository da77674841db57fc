//! aerorepo - a deterministic repository-style query engine
//!
//! Derived queries are structured descriptors compiled against a record
//! schema, executed over a pluggable `DataSource` with sorting, paging and
//! slicing, optionally projected to reduced-shape views. Bulk mutations
//! write through a direct path and invalidate staged records on request.

pub mod backend;
pub mod cli;
pub mod config;
pub mod executor;
pub mod mutation;
pub mod observability;
pub mod projection;
pub mod query;
pub mod record;
pub mod repository;

pub use backend::{DataSource, LockMode, MemoryBackend, ReadOptions};
pub use config::EngineConfig;
pub use executor::{Page, Slice};
pub use query::{PageRequest, QueryDescriptor, SortSpec};
pub use record::{Record, RecordId, RecordSchema};
pub use repository::{RepoError, RepoResult, Repository};
