//! CLI module for aerorepo
//!
//! One-shot query execution against a JSON dataset:
//! - find-all, find-page, find-slice, find-one: run a query file
//! - count: number of records in a collection
//!
//! Responses use the `{"status": "ok", "data": ...}` envelope; failures use
//! `{"status": "error", "code": ..., "message": ...}`.

mod args;
mod commands;
mod dataset;
mod errors;
mod io;

pub use args::{Cli, Command, LockArg, Paging, Source};
pub use commands::{count, find_all, find_one, find_page, find_slice, run, run_command};
pub use dataset::{Dataset, QueryFile};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{error_envelope, ok_envelope, write_error, write_response};
