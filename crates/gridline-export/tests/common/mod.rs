//! Common test utilities and mocks

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use gridline_core::{DataSource, GridlineError, PageQuery, PageResult, Result, Row, Value};
use gridline_export::{RowSink, SinkError, SinkKind};

/// Mock collection endpoint generating `total_rows` sequentially-numbered
/// rows, paged according to whatever the pipeline asks for. Individual
/// pages (or the whole source) can be made to fail.
pub struct MockSource {
    total_rows: u64,
    fail_pages: parking_lot::Mutex<HashSet<u64>>,
    fail_all: AtomicBool,
    query_log: parking_lot::Mutex<Vec<PageQuery>>,
}

impl MockSource {
    pub fn with_rows(total_rows: u64) -> Self {
        Self {
            total_rows,
            fail_pages: parking_lot::Mutex::new(HashSet::new()),
            fail_all: AtomicBool::new(false),
            query_log: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn with_failing_page(self, page: u64) -> Self {
        self.fail_pages.lock().insert(page);
        self
    }

    pub fn with_failure(self) -> Self {
        self.fail_all.store(true, Ordering::SeqCst);
        self
    }

    pub fn query_log(&self) -> Vec<PageQuery> {
        self.query_log.lock().clone()
    }

    pub fn pages_fetched(&self) -> usize {
        self.query_log.lock().len()
    }
}

#[async_trait]
impl DataSource for MockSource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<PageResult> {
        self.query_log.lock().push(query.clone());

        if self.fail_all.load(Ordering::SeqCst) {
            return Err(GridlineError::Network("mock transport failure".into()));
        }
        if self.fail_pages.lock().contains(&query.page) {
            return Err(GridlineError::Server { status: 502 });
        }

        let start = (query.page - 1) * query.per_page;
        let end = (start + query.per_page).min(self.total_rows);
        let rows = (start..end).map(|n| sample_row(n as i64 + 1)).collect();
        let last_page = self.total_rows.div_ceil(query.per_page).max(1);

        Ok(PageResult {
            rows,
            current_page: query.page,
            last_page,
            total: self.total_rows,
        })
    }
}

pub fn sample_row(id: i64) -> Row {
    Row::from_fields(vec![
        ("id".to_string(), Value::Int(id)),
        ("name".to_string(), Value::String(format!("row {id}"))),
    ])
}

/// Sink that records the pipeline's calls and can fail on demand
#[derive(Default)]
pub struct CountingSink {
    pub begins: usize,
    pub rows: Vec<Vec<String>>,
    pub finishes: usize,
    pub aborts: usize,
    pub fail_on_row: Option<usize>,
    rows_since_begin: usize,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on_row(row: usize) -> Self {
        Self {
            fail_on_row: Some(row),
            ..Self::default()
        }
    }
}

impl RowSink for CountingSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Delimited
    }

    fn begin(&mut self, _headers: &[String]) -> std::result::Result<(), SinkError> {
        self.begins += 1;
        self.rows_since_begin = 0;
        self.rows.clear();
        Ok(())
    }

    fn write_row(&mut self, cells: &[String]) -> std::result::Result<(), SinkError> {
        if self.fail_on_row == Some(self.rows_since_begin) {
            return Err(SinkError::Writer("simulated sink failure".to_string()));
        }
        self.rows.push(cells.to_vec());
        self.rows_since_begin += 1;
        Ok(())
    }

    fn finish(&mut self) -> std::result::Result<(), SinkError> {
        self.finishes += 1;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborts += 1;
        self.rows.clear();
    }
}
