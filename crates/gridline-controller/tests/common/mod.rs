//! Common test utilities and mocks

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use gridline_core::{
    DataSource, GridlineError, PageQuery, PageResult, Result, Row, TableEvent, Value,
};

/// Mock collection endpoint for controller tests.
///
/// Responses are scripted per page number; a gate can hold a page's fetch
/// open until the test releases it, which is how out-of-order resolution
/// is simulated.
pub struct MockSource {
    fail: AtomicBool,
    responses: parking_lot::Mutex<HashMap<u64, PageResult>>,
    gates: parking_lot::Mutex<HashMap<u64, Arc<Notify>>>,
    query_log: parking_lot::Mutex<Vec<PageQuery>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            responses: parking_lot::Mutex::new(HashMap::new()),
            gates: parking_lot::Mutex::new(HashMap::new()),
            query_log: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Script the response for one page
    pub fn with_page(self, page: u64, result: PageResult) -> Self {
        self.responses.lock().insert(page, result);
        self
    }

    /// Hold fetches for `page` until the returned gate is notified
    pub fn gate(&self, page: u64) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().insert(page, gate.clone());
        gate
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn query_log(&self) -> Vec<PageQuery> {
        self.query_log.lock().clone()
    }

    pub fn fetches_for_page(&self, page: u64) -> usize {
        self.query_log.lock().iter().filter(|q| q.page == page).count()
    }
}

#[async_trait]
impl DataSource for MockSource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<PageResult> {
        self.query_log.lock().push(query.clone());

        let gate = self.gates.lock().get(&query.page).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(GridlineError::Network("mock transport failure".into()));
        }

        let response = self.responses.lock().get(&query.page).cloned();
        Ok(response.unwrap_or_else(PageResult::empty))
    }
}

/// Build a page of rows with ids `start..end`
pub fn page_of(ids: std::ops::Range<i64>, current: u64, last: u64, total: u64) -> PageResult {
    let rows = ids
        .map(|id| {
            Row::from_fields(vec![
                ("id".to_string(), Value::Int(id)),
                ("name".to_string(), Value::String(format!("row {id}"))),
            ])
        })
        .collect();
    PageResult {
        rows,
        current_page: current,
        last_page: last,
        total,
    }
}

/// Collects every emitted event for later assertions
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<parking_lot::Mutex<Vec<TableEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorder(&self) -> impl Fn(&TableEvent) + Send + Sync + 'static {
        let events = self.events.clone();
        move |event| events.lock().push(event.clone())
    }

    pub fn events(&self) -> Vec<TableEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&TableEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }
}
