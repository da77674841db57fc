//! Predicate filtering for query execution
//!
//! Filters records strictly according to clauses.
//! No type coercion: a string never equals a number.

use std::cmp::Ordering;

use serde_json::Value;

use crate::query::{Clause, Operator};
use crate::record::Record;

/// Evaluates clauses against records
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if a record matches all clauses
    pub fn matches(record: &Record, clauses: &[Clause]) -> bool {
        // AND semantics
        clauses
            .iter()
            .all(|clause| Self::matches_clause(record, clause))
    }

    /// Checks if a record matches a single clause
    fn matches_clause(record: &Record, clause: &Clause) -> bool {
        let field_value = match record.get(&clause.field) {
            Some(v) => v,
            None => return false, // Missing field = no match
        };

        // Null values never match
        if field_value.is_null() {
            return false;
        }

        match &clause.op {
            Operator::Eq(expected) => Self::eq_match(field_value, expected),
            Operator::Gt(bound) => Self::range_cmp(field_value, bound) == Some(Ordering::Greater),
            Operator::Gte(bound) => matches!(
                Self::range_cmp(field_value, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Lt(bound) => Self::range_cmp(field_value, bound) == Some(Ordering::Less),
            Operator::Lte(bound) => matches!(
                Self::range_cmp(field_value, bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::Contains(needle) => Self::contains_match(field_value, needle),
            Operator::In(candidates) => candidates.iter().any(|c| Self::eq_match(field_value, c)),
        }
    }

    /// Exact equality match.
    ///
    /// Numbers compare by value so `20` matches `20.0`.
    fn eq_match(actual: &Value, expected: &Value) -> bool {
        match (actual, expected) {
            (Value::Number(_), Value::Number(_)) => {
                Self::range_cmp(actual, expected) == Some(Ordering::Equal)
            }
            _ => actual == expected,
        }
    }

    /// Range comparison (numbers numerically, strings lexically)
    fn range_cmp(actual: &Value, bound: &Value) -> Option<Ordering> {
        match (actual, bound) {
            (Value::Number(a), Value::Number(b)) => {
                if let (Some(ai), Some(bi)) = (a.as_i64(), b.as_i64()) {
                    return Some(ai.cmp(&bi));
                }
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Substring for strings, membership for arrays
    fn contains_match(actual: &Value, needle: &Value) -> bool {
        match (actual, needle) {
            (Value::String(haystack), Value::String(part)) => haystack.contains(part.as_str()),
            (Value::Array(items), _) => items.iter().any(|item| Self::eq_match(item, needle)),
            _ => false,
        }
    }
}
