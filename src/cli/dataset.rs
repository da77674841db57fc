//! Dataset and query files
//!
//! Dataset layout:
//!
//! ```json
//! {
//!   "schemas": [{"collection": "team", "fields": {"name": {"type": "string", "required": true}}}],
//!   "records": {"team": [{"name": "teamA"}]}
//! }
//! ```
//!
//! Records are inserted in file order, so identifiers are 1, 2, 3, ... per
//! collection and `ref` fields can point at them by position.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::backend::{DataSource, MemoryBackend};
use crate::config::EngineConfig;
use crate::projection::ProjectionShape;
use crate::query::QueryDescriptor;
use crate::record::RecordSchema;
use crate::repository::Repository;

use super::errors::{CliError, CliResult};
use super::io::read_json_file;

/// Parsed dataset file
#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    pub schemas: Vec<RecordSchema>,
    #[serde(default)]
    pub records: BTreeMap<String, Vec<Map<String, Value>>>,
}

impl Dataset {
    pub fn load(path: &Path) -> CliResult<Self> {
        read_json_file(path, |m| CliError::dataset_error(m))
    }

    /// Loads every collection into a fresh backend and binds a repository
    /// to `collection`
    pub fn into_repository(
        self,
        collection: &str,
        config: &EngineConfig,
    ) -> CliResult<Repository<MemoryBackend>> {
        let mut backend = MemoryBackend::new(config.staging());
        let mut schemas: BTreeMap<String, RecordSchema> = BTreeMap::new();
        for schema in self.schemas {
            backend.create_collection(schema.collection.clone());
            schemas.insert(schema.collection.clone(), schema);
        }

        for (name, rows) in self.records {
            let schema = schemas
                .get(&name)
                .ok_or_else(|| CliError::dataset_error(format!("No schema for collection '{}'", name)))?;
            for (pos, fields) in rows.into_iter().enumerate() {
                schema.validate(&fields).map_err(|e| {
                    CliError::dataset_error(format!("{}[{}]: {}", name, pos, e))
                })?;
                backend
                    .insert(&name, fields)
                    .map_err(|e| CliError::dataset_error(e.to_string()))?;
            }
        }
        backend.clear_staging();

        let primary = schemas.remove(collection).ok_or_else(|| {
            CliError::dataset_error(format!("No schema for collection '{}'", collection))
        })?;
        let repo = schemas
            .into_values()
            .fold(Repository::new(backend, primary), |repo, schema| {
                repo.with_related(schema)
            });
        Ok(repo.with_config(config.clone()))
    }
}

/// Parsed query file: a descriptor plus an optional projection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryFile {
    #[serde(flatten)]
    pub descriptor: QueryDescriptor,
    #[serde(default)]
    pub projection: Option<ProjectionShape>,
}

impl QueryFile {
    pub fn load(path: &Path) -> CliResult<Self> {
        read_json_file(path, |m| CliError::query_file_error(m))
    }
}
