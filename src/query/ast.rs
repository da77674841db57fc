//! Query descriptor structures
//!
//! A descriptor is the explicit, structured form of a derived query such as
//! "find by username and age greater than". Clauses always combine with AND.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Filter operation types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Operator {
    /// Equality: field = value
    Eq(Value),
    /// Greater than: field > value
    Gt(Value),
    /// Greater than or equal: field >= value
    Gte(Value),
    /// Less than: field < value
    Lt(Value),
    /// Less than or equal: field <= value
    Lte(Value),
    /// Substring of a string field, or member of an array field
    Contains(Value),
    /// Field value is one of the listed values
    In(Vec<Value>),
}

impl Operator {
    /// Returns the operation name for log output
    pub fn op_name(&self) -> &'static str {
        match self {
            Operator::Eq(_) => "eq",
            Operator::Gt(_) => "gt",
            Operator::Gte(_) => "gte",
            Operator::Lt(_) => "lt",
            Operator::Lte(_) => "lte",
            Operator::Contains(_) => "contains",
            Operator::In(_) => "in",
        }
    }
}

/// A single clause (field + operation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// Field name
    pub field: String,
    /// Filter operation
    #[serde(flatten)]
    pub op: Operator,
}

impl Clause {
    pub fn new(field: impl Into<String>, op: Operator) -> Self {
        Self {
            field: field.into(),
            op,
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Eq(value.into()))
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Gt(value.into()))
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Gte(value.into()))
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Lt(value.into()))
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Lte(value.into()))
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Contains(value.into()))
    }

    pub fn in_set<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::new(field, Operator::In(values.into_iter().map(Into::into).collect()))
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    /// Field to sort by
    pub field: String,
    /// Sort direction
    pub direction: SortDirection,
}

/// Ordered sort keys; empty means storage insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// No ordering: results keep insertion order
    pub fn unsorted() -> Self {
        Self::default()
    }

    /// Single-key sort
    pub fn by(direction: SortDirection, field: impl Into<String>) -> Self {
        Self::unsorted().then(direction, field)
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::by(SortDirection::Asc, field)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::by(SortDirection::Desc, field)
    }

    /// Appends a tie-break key
    pub fn then(mut self, direction: SortDirection, field: impl Into<String>) -> Self {
        self.keys.push(SortKey {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_unsorted(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Explicit query text with its bound parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuery {
    /// Query text or name understood by the backend
    pub text: String,
    /// Named parameters
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

impl RawQuery {
    /// Returns a bound parameter
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }
}

/// Structured derived query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Filter clauses (all combined with AND)
    #[serde(default)]
    pub clauses: Vec<Clause>,
    /// Sort applied when no page request overrides it
    #[serde(default)]
    pub sort: SortSpec,
    /// Explicit query text; bypasses clause compilation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_text: Option<String>,
    /// Named parameters bound into explicit query text
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query_params: BTreeMap<String, Value>,
    /// Declared single-result query
    #[serde(default)]
    pub single_result: bool,
}

impl QueryDescriptor {
    /// Matches every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Descriptor with explicit query text
    pub fn text(query_text: impl Into<String>) -> Self {
        Self {
            query_text: Some(query_text.into()),
            ..Self::default()
        }
    }

    /// Binds a named parameter for explicit query text
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    /// Adds a clause
    pub fn with_clause(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_clause(Clause::eq(field, value))
    }

    pub fn where_gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_clause(Clause::gt(field, value))
    }

    pub fn where_gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_clause(Clause::gte(field, value))
    }

    pub fn where_lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_clause(Clause::lt(field, value))
    }

    pub fn where_contains(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_clause(Clause::contains(field, value))
    }

    pub fn where_in<V: Into<Value>>(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.with_clause(Clause::in_set(field, values))
    }

    /// Sets the sort specification
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    /// Marks the descriptor as single-result
    pub fn single(mut self) -> Self {
        self.single_result = true;
        self
    }

    /// Returns the distinct field names referenced by clauses and sort keys
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        let names = self
            .clauses
            .iter()
            .map(|c| c.field.as_str())
            .chain(self.sort.keys().iter().map(|k| k.field.as_str()));
        for name in names {
            if !fields.contains(&name) {
                fields.push(name);
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_builder() {
        let query = QueryDescriptor::all()
            .where_eq("username", "AAA")
            .where_gt("age", 15)
            .with_sort(SortSpec::desc("username"));

        assert_eq!(query.clauses.len(), 2);
        assert_eq!(query.clauses[1].op, Operator::Gt(json!(15)));
        assert_eq!(query.sort.keys()[0].direction, SortDirection::Desc);
        assert!(query.query_text.is_none());
    }

    #[test]
    fn test_referenced_fields_distinct() {
        let query = QueryDescriptor::all()
            .where_gte("age", 10)
            .where_lt("age", 30)
            .with_sort(SortSpec::asc("username").then(SortDirection::Desc, "age"));

        assert_eq!(query.referenced_fields(), vec!["age", "username"]);
    }

    #[test]
    fn test_in_set_clause() {
        let clause = Clause::in_set("username", ["AAA", "BBB"]);
        assert_eq!(clause.op, Operator::In(vec![json!("AAA"), json!("BBB")]));
        assert_eq!(clause.op.op_name(), "in");
    }

    #[test]
    fn test_descriptor_from_json() {
        let query: QueryDescriptor = serde_json::from_value(json!({
            "clauses": [
                {"field": "username", "op": "eq", "value": "AAA"},
                {"field": "age", "op": "gt", "value": 15},
                {"field": "username", "op": "in", "value": ["AAA", "BBB"]}
            ],
            "sort": [{"field": "age", "direction": "desc"}]
        }))
        .unwrap();

        assert_eq!(query.clauses[0], Clause::eq("username", "AAA"));
        assert_eq!(query.clauses[2], Clause::in_set("username", ["AAA", "BBB"]));
        assert_eq!(query.sort, SortSpec::desc("age"));
        assert!(!query.single_result);
    }
}
