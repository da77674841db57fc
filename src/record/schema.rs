//! Record schema definitions
//!
//! Supported types:
//! - string: UTF-8 string
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - bool: Boolean
//! - ref: identifier of a record in another collection
//!
//! The `id` field is implicit on every schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{RecordError, RecordResult};
use super::types::{json_type_name, ID_FIELD};

/// Supported field types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Boolean
    Bool,
    /// Reference to a record in another collection
    Ref {
        /// Target collection name
        collection: String,
    },
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Ref { .. } => "ref",
        }
    }

    /// Checks a non-null value against this type. No coercion.
    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Int => value.is_i64(),
            FieldType::Float => value.is_number(),
            FieldType::Bool => value.is_boolean(),
            FieldType::Ref { .. } => value.is_u64(),
        }
    }
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field data type
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Whether field must be present and non-null
    #[serde(default)]
    pub required: bool,
}

impl FieldDef {
    pub fn required(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: true,
        }
    }

    pub fn optional(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
        }
    }

    /// Optional reference to another collection
    pub fn reference(collection: impl Into<String>) -> Self {
        Self::optional(FieldType::Ref {
            collection: collection.into(),
        })
    }
}

/// Schema of one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    /// Collection name
    pub collection: String,
    /// Declared fields (excluding `id`)
    pub fields: BTreeMap<String, FieldDef>,
}

impl RecordSchema {
    /// Creates an empty schema for a collection
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field definition
    pub fn with_field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.insert(name.into(), def);
        self
    }

    /// Returns true if the field is declared or is `id`
    pub fn has_field(&self, name: &str) -> bool {
        name == ID_FIELD || self.fields.contains_key(name)
    }

    /// Returns the target collection of a reference field
    pub fn ref_target(&self, name: &str) -> Option<&str> {
        match self.fields.get(name).map(|def| &def.field_type) {
            Some(FieldType::Ref { collection }) => Some(collection.as_str()),
            _ => None,
        }
    }

    /// Validates a field map for insertion.
    ///
    /// Rejects undeclared fields, type mismatches and missing required
    /// fields. An `id` entry is ignored; the backend assigns identifiers.
    pub fn validate(&self, fields: &Map<String, Value>) -> RecordResult<()> {
        for (name, value) in fields {
            if name == ID_FIELD {
                continue;
            }
            let def = self
                .fields
                .get(name)
                .ok_or_else(|| RecordError::unknown_field(&self.collection, name))?;
            self.validate_value(name, def, value)?;
        }

        for (name, def) in &self.fields {
            if def.required && !fields.contains_key(name) {
                return Err(RecordError::type_mismatch(
                    name,
                    def.field_type.type_name(),
                    "missing",
                ));
            }
        }

        Ok(())
    }

    fn validate_value(&self, name: &str, def: &FieldDef, value: &Value) -> RecordResult<()> {
        if value.is_null() {
            if def.required {
                return Err(RecordError::type_mismatch(
                    name,
                    def.field_type.type_name(),
                    "null",
                ));
            }
            return Ok(());
        }
        if !def.field_type.accepts(value) {
            return Err(RecordError::type_mismatch(
                name,
                def.field_type.type_name(),
                json_type_name(value),
            ));
        }
        Ok(())
    }
}
