//! Result sorting for query execution
//!
//! Multi-key, stable: ties on every key keep the input (insertion) order.

use std::cmp::Ordering;

use serde_json::Value;

use crate::query::{SortDirection, SortSpec};
use crate::record::Record;

/// Sorts result records
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts records according to the sort specification.
    ///
    /// An unsorted spec leaves the slice untouched.
    pub fn sort(records: &mut [Record], sort: &SortSpec) {
        if sort.is_unsorted() {
            return;
        }
        records.sort_by(|a, b| Self::compare_records(a, b, sort));
    }

    /// Compares two records key by key
    pub fn compare_records(a: &Record, b: &Record, sort: &SortSpec) -> Ordering {
        for key in sort.keys() {
            let ordering = Self::compare_values(a.get(&key.field), b.get(&key.field));
            let ordering = match key.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Compares two JSON values for sorting.
    ///
    /// Ordering rules:
    /// - missing < null < bool < number < string
    /// - For same types, natural ordering
    pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a_val), Some(b_val)) => {
                let a_type = Self::type_rank(a_val);
                let b_type = Self::type_rank(b_val);
                if a_type != b_type {
                    return a_type.cmp(&b_type);
                }

                match (a_val, b_val) {
                    (Value::Bool(a_b), Value::Bool(b_b)) => a_b.cmp(b_b),
                    (Value::Number(a_n), Value::Number(b_n)) => {
                        if let (Some(a_i), Some(b_i)) = (a_n.as_i64(), b_n.as_i64()) {
                            return a_i.cmp(&b_i);
                        }
                        let a_f = a_n.as_f64().unwrap_or(0.0);
                        let b_f = b_n.as_f64().unwrap_or(0.0);
                        a_f.partial_cmp(&b_f).unwrap_or(Ordering::Equal)
                    }
                    (Value::String(a_s), Value::String(b_s)) => a_s.cmp(b_s),
                    _ => Ordering::Equal, // Arrays and objects not compared
                }
            }
        }
    }

    fn type_rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordId;
    use serde_json::json;

    fn record(id: u64, v: Value) -> Record {
        Record::new(RecordId(id), v.as_object().cloned().unwrap())
    }

    fn ids(records: &[Record]) -> Vec<u64> {
        records.iter().map(|r| r.id().as_u64()).collect()
    }

    #[test]
    fn test_sort_desc() {
        let mut records: Vec<Record> = (1..=5)
            .map(|i| record(i, json!({"username": format!("member{}", i)})))
            .collect();

        ResultSorter::sort(&mut records, &SortSpec::desc("username"));
        assert_eq!(ids(&records), vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_multi_key_with_stable_tie_break() {
        let mut records = vec![
            record(1, json!({"age": 20, "username": "b"})),
            record(2, json!({"age": 10, "username": "z"})),
            record(3, json!({"age": 20, "username": "a"})),
            record(4, json!({"age": 20, "username": "a"})),
        ];

        let sort = SortSpec::desc("age").then(SortDirection::Asc, "username");
        ResultSorter::sort(&mut records, &sort);
        assert_eq!(ids(&records), vec![3, 4, 1, 2]);
    }

    #[test]
    fn test_unsorted_keeps_insertion_order() {
        let mut records = vec![
            record(3, json!({"age": 1})),
            record(1, json!({"age": 2})),
            record(2, json!({"age": 0})),
        ];
        ResultSorter::sort(&mut records, &SortSpec::unsorted());
        assert_eq!(ids(&records), vec![3, 1, 2]);
    }

    #[test]
    fn test_type_ordering() {
        let mut records = vec![
            record(1, json!({"v": "text"})),
            record(2, json!({"v": 5})),
            record(3, json!({"v": true})),
            record(4, json!({"v": null})),
            record(5, json!({})),
            record(6, json!({"v": 1.5})),
        ];
        ResultSorter::sort(&mut records, &SortSpec::asc("v"));
        assert_eq!(ids(&records), vec![5, 4, 3, 6, 2, 1]);
    }
}
