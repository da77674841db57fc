//! Result types for query execution

use serde::Serialize;

use crate::query::PageRequest;

/// One page of results with the total count of the filtered set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    content: Vec<T>,
    number: usize,
    size: usize,
    total_elements: usize,
    total_pages: usize,
    first: bool,
    last: bool,
    has_next: bool,
    has_previous: bool,
}

impl<T> Page<T> {
    /// Builds a page for `request` out of at most `request.size()` items
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: usize) -> Self {
        let number = request.page();
        let size = request.size();
        let total_pages = total_elements.div_ceil(size);
        let has_next = number + 1 < total_pages;
        Self {
            content,
            number,
            size,
            total_elements,
            total_pages,
            first: number == 0,
            last: !has_next,
            has_next,
            has_previous: number > 0,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    /// Zero-based page index
    pub fn number(&self) -> usize {
        self.number
    }

    /// Requested page size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of items on this page
    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn total_elements(&self) -> usize {
        self.total_elements
    }

    /// `ceil(total_elements / size)`
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn is_first(&self) -> bool {
        self.first
    }

    pub fn is_last(&self) -> bool {
        self.last
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn has_previous(&self) -> bool {
        self.has_previous
    }

    /// Converts the content, keeping the paging metadata
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            first: self.first,
            last: self.last,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

/// One page of results without a total count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice<T> {
    content: Vec<T>,
    number: usize,
    size: usize,
    has_next: bool,
}

impl<T> Slice<T> {
    /// Builds a slice from up to `size + 1` fetched items.
    ///
    /// The look-ahead item, if present, sets `has_next` and is dropped.
    pub fn from_lookahead(mut content: Vec<T>, request: &PageRequest) -> Self {
        let has_next = content.len() > request.size();
        content.truncate(request.size());
        Self {
            content,
            number: request.page(),
            size: request.size(),
            has_next,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next
    }

    /// Converts the content, keeping the slice metadata
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Slice<U> {
        Slice {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            has_next: self.has_next,
        }
    }
}
