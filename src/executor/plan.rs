//! Sort/page planning
//!
//! A `PagePlan` is the deterministic ordering plus the `(offset, limit)`
//! window applied to a filtered result set.

use crate::query::{PageRequest, SortSpec};
use crate::record::Record;

use super::sorter::ResultSorter;

/// Ordering and window for one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    sort: SortSpec,
    offset: usize,
    limit: Option<usize>,
}

impl PagePlan {
    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Maximum records returned; `None` means unbounded
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Sorts `records`, then cuts the window.
    ///
    /// An offset past the end yields an empty result, not an error.
    pub fn apply(&self, mut records: Vec<Record>) -> Vec<Record> {
        ResultSorter::sort(&mut records, &self.sort);

        if self.offset >= records.len() {
            return Vec::new();
        }
        let mut window = records.split_off(self.offset);
        if let Some(limit) = self.limit {
            window.truncate(limit);
        }
        window
    }
}

/// Builds page plans
pub struct PagePlanner;

impl PagePlanner {
    /// Every record, in sort order
    pub fn unpaged(sort: &SortSpec) -> PagePlan {
        PagePlan {
            sort: sort.clone(),
            offset: 0,
            limit: None,
        }
    }

    /// Exactly one page
    pub fn for_page(sort: &SortSpec, request: &PageRequest) -> PagePlan {
        PagePlan {
            sort: sort.clone(),
            offset: request.offset(),
            limit: Some(request.size()),
        }
    }

    /// One page plus a look-ahead record for has-next detection
    pub fn for_slice(sort: &SortSpec, request: &PageRequest) -> PagePlan {
        PagePlan {
            sort: sort.clone(),
            offset: request.offset(),
            limit: Some(request.size().saturating_add(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordId;
    use serde_json::{json, Value};

    fn members(n: u64) -> Vec<Record> {
        (1..=n)
            .map(|i| {
                let body: Value = json!({"username": format!("member{}", i), "age": 10});
                Record::new(RecordId(i), body.as_object().cloned().unwrap())
            })
            .collect()
    }

    fn names(records: &[Record]) -> Vec<&str> {
        records.iter().filter_map(|r| r.get_str("username")).collect()
    }

    #[test]
    fn test_page_window() {
        let request = PageRequest::of(0, 3).unwrap();
        let plan = PagePlanner::for_page(&SortSpec::desc("username"), &request);

        let page = plan.apply(members(5));
        assert_eq!(names(&page), vec!["member5", "member4", "member3"]);
    }

    #[test]
    fn test_last_partial_page() {
        let request = PageRequest::of(1, 3).unwrap();
        let plan = PagePlanner::for_page(&SortSpec::desc("username"), &request);

        let page = plan.apply(members(5));
        assert_eq!(names(&page), vec!["member2", "member1"]);
    }

    #[test]
    fn test_offset_beyond_end_is_empty() {
        let request = PageRequest::of(10, 3).unwrap();
        let plan = PagePlanner::for_page(&SortSpec::unsorted(), &request);
        assert!(plan.apply(members(5)).is_empty());
    }

    #[test]
    fn test_slice_plan_fetches_one_extra() {
        let request = PageRequest::of(0, 3).unwrap();
        let plan = PagePlanner::for_slice(&SortSpec::unsorted(), &request);

        assert_eq!(plan.limit(), Some(4));
        assert_eq!(plan.apply(members(5)).len(), 4);
    }

    #[test]
    fn test_unpaged_keeps_everything() {
        let plan = PagePlanner::unpaged(&SortSpec::unsorted());
        assert_eq!(plan.offset(), 0);
        assert_eq!(plan.limit(), None);
        assert_eq!(plan.apply(members(5)).len(), 5);
    }
}
