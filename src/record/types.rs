//! Record representation
//!
//! A record is a flat map of field name to JSON value plus an identifier
//! assigned by the backend. The identifier is mirrored into the `id` field so
//! predicates and sort keys can address it like any other field.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{RecordError, RecordResult};

/// Name of the identifier field
pub const ID_FIELD: &str = "id";

/// Stable record identifier, assigned in insertion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Returns the raw identifier
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Reads an identifier out of a reference value
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_u64().map(RecordId)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        RecordId(id)
    }
}

/// A stored record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    #[serde(skip)]
    id: RecordId,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Record {
    /// Creates a record, overwriting any `id` entry in `fields`
    pub fn new(id: RecordId, mut fields: Map<String, Value>) -> Self {
        fields.insert(ID_FIELD.to_string(), Value::from(id.0));
        Self { id, fields }
    }

    /// Returns the record identifier
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Returns a field value, including `id`
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a string field
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Returns an integer field
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    /// Sets a field value, returning the previous one.
    ///
    /// The identifier field is rejected.
    pub fn set(&mut self, field: &str, value: Value) -> RecordResult<Option<Value>> {
        if field == ID_FIELD {
            return Err(RecordError::immutable_id(field));
        }
        Ok(self.fields.insert(field.to_string(), value))
    }

    /// Adds `delta` to an integer field; missing or non-integer fields error,
    /// as does a result outside the i64 range.
    pub fn increment(&mut self, field: &str, delta: i64) -> RecordResult<i64> {
        let current = self
            .get_i64(field)
            .ok_or_else(|| RecordError::type_mismatch(field, "int", self.type_of(field)))?;
        let next = current
            .checked_add(delta)
            .ok_or_else(|| RecordError::overflow(field, current, delta))?;
        self.set(field, Value::from(next))?;
        Ok(next)
    }

    /// Returns all fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns a copy of this record restricted to `names` (plus `id`).
    pub fn select<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Record {
        let mut fields = Map::new();
        for name in names {
            if let Some(value) = self.fields.get(name) {
                fields.insert(name.to_string(), value.clone());
            }
        }
        Record::new(self.id, fields)
    }

    fn type_of(&self, field: &str) -> &'static str {
        match self.get(field) {
            None => "missing",
            Some(v) => json_type_name(v),
        }
    }
}

/// Returns the JSON type name for error messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
