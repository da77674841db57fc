//! aerorepo CLI entry point
//!
//! This is a minimal entrypoint that:
//! 1. Parses CLI arguments (via cli::run)
//! 2. Dispatches to CLI commands (via cli::run)
//! 3. Exits with non-zero on failure
//!
//! All logic is delegated to the CLI module. Failures are reported once, as
//! the error envelope on stdout.

use std::process::ExitCode;

use aerorepo::cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
