//! Page requests
//!
//! Construction validates the page index and size, so every `PageRequest`
//! value in the system is well-formed.

use serde::{Deserialize, Serialize};

use super::ast::SortSpec;
use super::errors::{QueryError, QueryResult};

/// Zero-based page request with its sort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPageRequest")]
pub struct PageRequest {
    page: usize,
    size: usize,
    sort: SortSpec,
}

/// Unvalidated wire form
#[derive(Deserialize)]
struct RawPageRequest {
    page: i64,
    size: i64,
    #[serde(default)]
    sort: SortSpec,
}

impl TryFrom<RawPageRequest> for PageRequest {
    type Error = QueryError;

    fn try_from(raw: RawPageRequest) -> QueryResult<Self> {
        PageRequest::of(raw.page, raw.size).map(|p| p.with_sort(raw.sort))
    }
}

impl PageRequest {
    /// Creates an unsorted page request.
    ///
    /// Fails with `AERO_QUERY_INVALID_PAGE_REQUEST` if `page < 0` or `size <= 0`.
    pub fn of(page: i64, size: i64) -> QueryResult<Self> {
        if page < 0 {
            return Err(QueryError::invalid_page_request(format!(
                "Page index must not be negative, got {}",
                page
            )));
        }
        if size <= 0 {
            return Err(QueryError::invalid_page_request(format!(
                "Page size must be positive, got {}",
                size
            )));
        }
        let page = usize::try_from(page)
            .map_err(|_| QueryError::invalid_page_request("Page index out of range"))?;
        let size = usize::try_from(size)
            .map_err(|_| QueryError::invalid_page_request("Page size out of range"))?;
        Ok(Self {
            page,
            size,
            sort: SortSpec::unsorted(),
        })
    }

    /// First page of the given size; a zero size is raised to 1
    pub fn first(size: usize) -> Self {
        Self {
            page: 0,
            size: size.max(1),
            sort: SortSpec::unsorted(),
        }
    }

    /// Creates a sorted page request
    pub fn sorted(page: i64, size: i64, sort: SortSpec) -> QueryResult<Self> {
        Self::of(page, size).map(|p| p.with_sort(sort))
    }

    /// Replaces the sort
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    /// Zero-based page index
    pub fn page(&self) -> usize {
        self.page
    }

    /// Page size, always positive
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    /// Offset of the first element of this page
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }

    /// Request for the following page
    pub fn next(&self) -> Self {
        Self {
            page: self.page + 1,
            ..self.clone()
        }
    }

    /// Request for the preceding page, or the first page
    pub fn previous_or_first(&self) -> Self {
        Self {
            page: self.page.saturating_sub(1),
            ..self.clone()
        }
    }
}
