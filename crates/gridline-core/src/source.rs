//! Remote collection endpoint abstraction
//!
//! A `DataSource` is the only thing Gridline knows about the backend: give
//! it a `PageQuery`, get back one page of rows plus pagination metadata.
//! Transport, authentication and URL construction are the implementor's
//! business.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{GridlineError, Result};
use crate::types::{Row, SortOrder, Value, ID_FIELD};

/// Default response key holding the row array
pub const DEFAULT_DATA_KEY: &str = "data";

/// Wire-level query parameters for one page fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageQuery {
    /// Free-text search term (empty means no search)
    pub search: String,
    /// Sort column, if any
    pub sort_by: Option<String>,
    /// Sort direction
    pub order: SortOrder,
    /// 1-indexed page number
    pub page: u64,
    /// Rows per page
    pub per_page: u64,
    /// Per-column filter values, JSON-encoded as one parameter on the wire
    pub column_filters: BTreeMap<String, String>,
    /// Marker distinguishing export-mode requests from live-view requests
    pub export: bool,
}

impl PageQuery {
    /// Project the query to `(key, value)` request parameters.
    ///
    /// Empty search and absent sort are omitted; `column_filters` travels as
    /// a single JSON-encoded map; the export marker is only present when set.
    pub fn to_wire_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if !self.search.is_empty() {
            params.push(("search".to_string(), self.search.clone()));
        }
        if let Some(sort_by) = &self.sort_by {
            params.push(("sortBy".to_string(), sort_by.clone()));
            params.push(("order".to_string(), self.order.as_str().to_string()));
        }
        params.push(("page".to_string(), self.page.to_string()));
        params.push(("perPage".to_string(), self.per_page.to_string()));
        if !self.column_filters.is_empty() {
            // BTreeMap keeps the encoding deterministic
            let encoded = serde_json::to_string(&self.column_filters)
                .unwrap_or_else(|_| "{}".to_string());
            params.push(("columnFilters".to_string(), encoded));
        }
        if self.export {
            params.push(("export".to_string(), "true".to_string()));
        }
        params
    }
}

/// One decoded page of the remote collection
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    /// Rows in endpoint order
    pub rows: Vec<Row>,
    /// 1-indexed page this result is for (authoritative; the endpoint may
    /// clamp an out-of-range request)
    pub current_page: u64,
    /// 1-indexed last available page
    pub last_page: u64,
    /// Total matching rows across all pages
    pub total: u64,
}

impl PageResult {
    /// Create an empty result (no rows, single empty page)
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            current_page: 1,
            last_page: 1,
            total: 0,
        }
    }

    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Decode a JSON payload of the shape
    /// `{<data_key>: [...], "current_page": n, "last_page": n, "total": n}`.
    ///
    /// Missing or mistyped keys are classified as `MalformedResponse`, as is
    /// any row object lacking the mandatory `id` field.
    pub fn from_json(payload: &serde_json::Value, data_key: &str) -> Result<Self> {
        let raw_rows = payload
            .get(data_key)
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                GridlineError::MalformedResponse(format!("missing row array '{}'", data_key))
            })?;

        let mut rows = Vec::with_capacity(raw_rows.len());
        for raw in raw_rows {
            let object = raw.as_object().ok_or_else(|| {
                GridlineError::MalformedResponse("row is not an object".to_string())
            })?;
            let row = Row::from_fields(
                object
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v.clone()))),
            );
            if row.id().is_none() {
                return Err(GridlineError::MalformedResponse(format!(
                    "row missing '{}' field",
                    ID_FIELD
                )));
            }
            rows.push(row);
        }

        Ok(Self {
            rows,
            current_page: require_u64(payload, "current_page")?,
            last_page: require_u64(payload, "last_page")?,
            total: require_u64(payload, "total")?,
        })
    }
}

fn require_u64(payload: &serde_json::Value, key: &str) -> Result<u64> {
    payload
        .get(key)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| GridlineError::MalformedResponse(format!("missing numeric '{}'", key)))
}

/// A remote paginated collection endpoint
///
/// Implementations are opaque asynchronous operations; Gridline bounds them
/// with its own timeout and never inspects transport details.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch one page for the given query
    async fn fetch_page(&self, query: &PageQuery) -> Result<PageResult>;
}
