//! Immutable query-state snapshots and their transitions
//!
//! Every transition returns a new snapshot; nothing here performs I/O.
//! The one cross-field invariant: any change to search, column filters or
//! page size sends the query back to page 1, while sort changes leave the
//! page alone.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gridline_core::{PageQuery, SortOrder};

/// Default rows per page
pub const DEFAULT_PER_PAGE: u64 = 25;

/// One immutable snapshot of the live query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryState {
    /// Free-text search term
    pub search: String,
    /// Per-column filter values
    pub column_filters: BTreeMap<String, String>,
    /// Sort column, if any
    pub sort: Option<String>,
    /// Sort direction
    pub order: SortOrder,
    /// 1-indexed current page
    pub page: u64,
    /// Rows per page
    pub per_page: u64,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search: String::new(),
            column_filters: BTreeMap::new(),
            sort: None,
            order: SortOrder::Asc,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl QueryState {
    /// Set the search term; resets to page 1.
    pub fn with_search(&self, term: impl Into<String>) -> Self {
        Self {
            search: term.into(),
            page: 1,
            ..self.clone()
        }
    }

    /// Set or clear a per-column filter; resets to page 1.
    ///
    /// An empty value removes the filter entirely.
    pub fn with_column_filter(&self, column: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        let column = column.into();
        let value = value.into();
        if value.is_empty() {
            next.column_filters.remove(&column);
        } else {
            next.column_filters.insert(column, value);
        }
        next.page = 1;
        next
    }

    /// Set the sort column and direction; the page is preserved.
    pub fn with_sort(&self, column: impl Into<String>, order: SortOrder) -> Self {
        Self {
            sort: Some(column.into()),
            order,
            ..self.clone()
        }
    }

    /// Clear sorting; the page is preserved.
    pub fn without_sort(&self) -> Self {
        Self {
            sort: None,
            order: SortOrder::default(),
            ..self.clone()
        }
    }

    /// Navigate to a page. Pages below 1 are rejected (the snapshot is
    /// returned unchanged); the upper bound is advisory and enforced by the
    /// endpoint's `last_page`, not locally.
    pub fn with_page(&self, page: u64) -> Self {
        if page < 1 {
            return self.clone();
        }
        Self {
            page,
            ..self.clone()
        }
    }

    /// Change the page size; resets to page 1. A zero size is rejected.
    pub fn with_per_page(&self, per_page: u64) -> Self {
        if per_page == 0 {
            return self.clone();
        }
        Self {
            per_page,
            page: 1,
            ..self.clone()
        }
    }

    /// Restore default sort/order, page 1, and empty search and filters.
    /// The page size survives a reset.
    pub fn reset(&self) -> Self {
        Self {
            per_page: self.per_page,
            ..Default::default()
        }
    }

    /// Project this snapshot to wire parameters for one page fetch.
    pub fn to_page_query(&self, export: bool) -> PageQuery {
        PageQuery {
            search: self.search.clone(),
            sort_by: self.sort.clone(),
            order: self.order,
            page: self.page,
            per_page: self.per_page,
            column_filters: self.column_filters.clone(),
            export,
        }
    }
}
