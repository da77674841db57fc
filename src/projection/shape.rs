//! Projection shapes
//!
//! A shape names the fields a view exposes and, optionally, nested views of
//! related records reached through `ref` fields. Binding a shape to a schema
//! validates every name and resolves the related collections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::backend::FieldSelection;
use crate::query::{QueryError, QueryResult};
use crate::record::{RecordSchema, ID_FIELD};

/// Nested view of a related record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedShape {
    /// Name of the nested view in the output
    pub name: String,
    /// Reference field holding the related identifier
    pub via: String,
    /// Fields of the related record
    pub fields: Vec<String>,
}

/// Requested shape of a projection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionShape {
    /// Fields of the record itself
    #[serde(default)]
    pub fields: Vec<String>,
    /// Related views
    #[serde(default)]
    pub nested: Vec<NestedShape>,
}

impl ProjectionShape {
    /// Flat shape over the given fields
    pub fn of<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            nested: Vec::new(),
        }
    }

    /// Adds a nested view reached through `via`
    pub fn with_nested<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        via: impl Into<String>,
        fields: impl IntoIterator<Item = S>,
    ) -> Self {
        self.nested.push(NestedShape {
            name: name.into(),
            via: via.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Fields this shape needs from the projected record itself
    pub fn required_fields(&self) -> Vec<String> {
        let mut required: Vec<String> = Vec::new();
        let names = self
            .fields
            .iter()
            .chain(self.nested.iter().map(|n| &n.via));
        for name in names {
            if !required.contains(name) {
                required.push(name.clone());
            }
        }
        required
    }

    /// Validates the shape against `schema`; related schemas come from
    /// `schemas` keyed by collection.
    pub fn bind(
        &self,
        schema: &RecordSchema,
        schemas: &BTreeMap<String, RecordSchema>,
    ) -> QueryResult<BoundProjection> {
        for field in &self.fields {
            check_view_field(schema, field)?;
        }

        let mut nested = Vec::with_capacity(self.nested.len());
        for (pos, shape) in self.nested.iter().enumerate() {
            let clashes = shape.name == ID_FIELD
                || self.fields.contains(&shape.name)
                || self.nested[..pos].iter().any(|n| n.name == shape.name);
            if clashes {
                return Err(QueryError::query_invalid(format!(
                    "Nested view name '{}' collides with another projected name",
                    shape.name
                )));
            }
            check_field(schema, &shape.via)?;
            let collection = schema.ref_target(&shape.via).ok_or_else(|| {
                QueryError::query_invalid(format!(
                    "Field '{}' of '{}' is not a reference",
                    shape.via, schema.collection
                ))
            })?;
            let related = schemas.get(collection).ok_or_else(|| {
                QueryError::query_invalid(format!(
                    "No schema registered for related collection '{}'",
                    collection
                ))
            })?;
            for field in &shape.fields {
                check_view_field(related, field)?;
            }
            nested.push(BoundNested {
                name: shape.name.clone(),
                via: shape.via.clone(),
                collection: collection.to_string(),
                fields: shape.fields.clone(),
            });
        }

        Ok(BoundProjection {
            fields: self.fields.clone(),
            required: self.required_fields(),
            nested,
        })
    }
}

/// Views always carry `id`; listing it again is rejected
fn check_view_field(schema: &RecordSchema, field: &str) -> QueryResult<()> {
    if field == ID_FIELD {
        return Err(QueryError::query_invalid(format!(
            "Field '{}' is always projected and cannot be listed",
            ID_FIELD
        )));
    }
    check_field(schema, field)
}

fn check_field(schema: &RecordSchema, field: &str) -> QueryResult<()> {
    if schema.has_field(field) {
        Ok(())
    } else {
        Err(QueryError::unknown_field(&schema.collection, field))
    }
}

/// Nested view with its related collection resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundNested {
    pub(crate) name: String,
    pub(crate) via: String,
    pub(crate) collection: String,
    pub(crate) fields: Vec<String>,
}

impl BoundNested {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Minimal selection for the related records
    pub fn selection(&self) -> FieldSelection {
        FieldSelection::only(self.fields.iter().cloned())
    }
}

/// Projection validated against a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundProjection {
    pub(crate) fields: Vec<String>,
    required: Vec<String>,
    pub(crate) nested: Vec<BoundNested>,
}

impl BoundProjection {
    /// Fields needed from the projected collection
    pub fn required_fields(&self) -> &[String] {
        &self.required
    }

    pub fn nested(&self) -> &[BoundNested] {
        &self.nested
    }

    /// Minimal selection for the projected records
    pub fn selection(&self) -> FieldSelection {
        FieldSelection::only(self.required.iter().cloned())
    }
}
