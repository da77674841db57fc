//! Projection views

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::record::{Record, RecordId};

/// Reduced-shape view of a record
///
/// Serializes flat: `{"id": 1, "username": "m1", "team": {"id": 1, "name": "A"}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionView {
    id: RecordId,
    #[serde(flatten)]
    values: BTreeMap<String, Value>,
    #[serde(flatten)]
    nested: BTreeMap<String, Option<ProjectionView>>,
}

impl ProjectionView {
    /// Builds a flat view; absent fields are exposed as null
    pub fn from_record(record: &Record, fields: &[String]) -> Self {
        let values = fields
            .iter()
            .map(|f| (f.clone(), record.get(f).cloned().unwrap_or(Value::Null)))
            .collect();
        Self {
            id: record.id(),
            values,
            nested: BTreeMap::new(),
        }
    }

    pub(crate) fn attach(&mut self, name: &str, view: Option<ProjectionView>) {
        self.nested.insert(name.to_string(), view);
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Returns a projected field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Returns a nested view; `None` if the reference was null or dangling
    pub fn nested(&self, name: &str) -> Option<&ProjectionView> {
        self.nested.get(name).and_then(Option::as_ref)
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }
}
