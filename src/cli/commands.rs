//! CLI command implementations
//!
//! Each command loads the dataset into a fresh in-memory backend, runs one
//! query and returns the JSON payload for the response envelope.

use serde_json::Value;

use crate::backend::{LockMode, MemoryBackend};
use crate::config::EngineConfig;
use crate::observability::Event;
use crate::query::PageRequest;
use crate::repository::{RepoError, Repository};

use super::args::{Command, Paging, Source};
use super::dataset::{Dataset, QueryFile};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Parse arguments, run the command and print the response
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    match run_command(cli.command) {
        Ok(data) => write_response(data),
        Err(err) => {
            write_error(err.code_str(), err.message())?;
            Err(err)
        }
    }
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<Value> {
    match cmd {
        Command::FindAll { source, query } => find_all(&source, &QueryFile::load(&query)?),
        Command::FindPage {
            source,
            query,
            paging,
        } => find_page(&source, &QueryFile::load(&query)?, paging),
        Command::FindSlice {
            source,
            query,
            paging,
        } => find_slice(&source, &QueryFile::load(&query)?, paging),
        Command::FindOne {
            source,
            query,
            lock,
        } => find_one(&source, &QueryFile::load(&query)?, lock.into()),
        Command::Count { source } => count(&source),
    }
}

/// Every matching record, or projection view
pub fn find_all(source: &Source, query: &QueryFile) -> CliResult<Value> {
    let (repo, _) = open(source)?;
    let data = match &query.projection {
        Some(shape) => to_json(repo.find_all_projected(&query.descriptor, shape)?)?,
        None => to_json(repo.find_all(&query.descriptor)?)?,
    };
    Ok(data)
}

/// One page with total count
pub fn find_page(source: &Source, query: &QueryFile, paging: Paging) -> CliResult<Value> {
    let (repo, config) = open(source)?;
    let request = page_request(&paging, &config)?;
    let data = match &query.projection {
        Some(shape) => to_json(repo.find_page_projected(&query.descriptor, &request, shape)?)?,
        None => to_json(repo.find_page(&query.descriptor, &request)?)?,
    };
    Ok(data)
}

/// One page with has-next only
pub fn find_slice(source: &Source, query: &QueryFile, paging: Paging) -> CliResult<Value> {
    if query.projection.is_some() {
        return Err(CliError::query_file_error(
            "Projections are supported by find-all and find-page only",
        ));
    }
    let (repo, config) = open(source)?;
    let request = page_request(&paging, &config)?;
    to_json(repo.find_slice(&query.descriptor, &request)?)
}

/// Exactly one matching record
pub fn find_one(source: &Source, query: &QueryFile, lock: LockMode) -> CliResult<Value> {
    let (repo, _) = open(source)?;
    to_json(repo.find_one(&query.descriptor, lock)?)
}

/// Number of records in the collection
pub fn count(source: &Source) -> CliResult<Value> {
    let (repo, _) = open(source)?;
    Ok(Value::from(repo.count()?))
}

fn open(source: &Source) -> CliResult<(Repository<MemoryBackend>, EngineConfig)> {
    let config = match &source.config {
        Some(path) => {
            let config = EngineConfig::load(path)?;
            config.logger().event(
                Event::ConfigLoaded,
                &[
                    ("log_level", &config.log_level),
                    ("path", &path.display().to_string()),
                ],
            );
            config
        }
        None => EngineConfig::default(),
    };
    let repo = Dataset::load(&source.dataset)?.into_repository(&source.collection, &config)?;
    Ok((repo, config))
}

fn page_request(paging: &Paging, config: &EngineConfig) -> CliResult<PageRequest> {
    let size = match paging.size {
        Some(size) => size,
        None => i64::try_from(config.default_page_size)
            .map_err(|_| CliError::config_error("default_page_size out of range"))?,
    };
    PageRequest::of(paging.page, size).map_err(|e| RepoError::from(e).into())
}

fn to_json<T: serde::Serialize>(value: T) -> CliResult<Value> {
    Ok(serde_json::to_value(value)?)
}
