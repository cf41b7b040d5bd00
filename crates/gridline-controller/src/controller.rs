//! The live table-view controller
//!
//! Owns the query state, the rendered rows, selection and the navigation
//! cursor, and coordinates fetches against the `DataSource`. Concurrency
//! model: state lives behind a `parking_lot` mutex that is never held
//! across an await; every scheduled fetch carries a generation tag from a
//! monotonic counter, and a result is applied only while its generation is
//! still the latest. Superseded requests are not cancelled, just made
//! inert — bandwidth traded for simplicity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use gridline_core::{DataSource, GridlineError, PageResult, Row, RowId, SortOrder, TableEvent};

use crate::keyboard::{FocusProbe, KeyboardNavigator, NavCommand, NavEffect, PageRequest};
use crate::pagination::PaginationPlan;
use crate::persistence::{restore_query, save_query, StateStore};
use crate::query::{QueryState, DEFAULT_PER_PAGE};
use crate::selection::{SelectionChange, SelectionMode, SelectionModel};

/// Controller configuration
#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Identifier under which query state is persisted
    pub table_id: String,
    /// Initial rows per page
    pub per_page: u64,
    /// Page sizes offered to the render surface
    pub page_sizes: Vec<u64>,
    /// Debounce window for free-text search input
    pub search_debounce: Duration,
    /// Debounce window for per-column filter input
    pub filter_debounce: Duration,
    /// Hard deadline for one endpoint call
    pub fetch_timeout: Duration,
    /// Saved query state older than this is discarded on restore
    pub persist_max_age: Duration,
    /// Detailed (numbered buttons) vs. simple (prev/next) pagination
    pub detailed_pagination: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            table_id: "table".to_string(),
            per_page: DEFAULT_PER_PAGE,
            page_sizes: vec![10, 25, 50, 100],
            search_debounce: Duration::from_millis(300),
            filter_debounce: Duration::from_millis(300),
            fetch_timeout: Duration::from_secs(30),
            persist_max_age: Duration::from_secs(60 * 60),
            detailed_pagination: true,
        }
    }
}

/// Snapshot of everything a render surface needs to draw the table
#[derive(Debug, Clone)]
pub struct TableView {
    /// Rows of the current page, in endpoint order
    pub rows: Vec<Row>,
    /// Whether a fetch is in flight
    pub loading: bool,
    /// Explicit empty state: not loading and genuinely zero rows
    pub empty: bool,
    /// Pagination view-model from the last accepted fetch
    pub plan: PaginationPlan,
    /// Total matching rows across all pages
    pub total: u64,
    /// Selected ids, in selection order
    pub selected: Vec<RowId>,
    /// Navigation cursor into `rows`, when resolved
    pub cursor: Option<usize>,
}

type Listener = Box<dyn Fn(&TableEvent) + Send + Sync>;

struct Inner {
    query: QueryState,
    rows: Vec<Row>,
    selection: SelectionModel,
    navigator: KeyboardNavigator,
    plan: PaginationPlan,
    loading: bool,
    total: u64,
}

/// Headless controller for one remote paginated table view
pub struct TableController {
    source: Arc<dyn DataSource>,
    options: TableOptions,
    inner: Mutex<Inner>,
    generation: AtomicU64,
    listeners: RwLock<Vec<Listener>>,
    store: Option<Arc<dyn StateStore>>,
    focus: Option<Arc<dyn FocusProbe>>,
}

impl TableController {
    pub fn new(source: Arc<dyn DataSource>, options: TableOptions) -> Self {
        let query = QueryState {
            per_page: options.per_page,
            ..Default::default()
        };
        Self {
            source,
            options,
            inner: Mutex::new(Inner {
                query,
                rows: Vec::new(),
                selection: SelectionModel::new(SelectionMode::Multiple),
                navigator: KeyboardNavigator::new(),
                plan: PaginationPlan::default(),
                loading: false,
                total: 0,
            }),
            generation: AtomicU64::new(0),
            listeners: RwLock::new(Vec::new()),
            store: None,
            focus: None,
        }
    }

    /// Use the given selection mode instead of the default `Multiple`
    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.inner.get_mut().selection = SelectionModel::new(mode);
        self
    }

    /// Persist and restore query state through this store
    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Consult this probe before dispatching keyboard commands
    pub fn with_focus_probe(mut self, probe: Arc<dyn FocusProbe>) -> Self {
        self.focus = Some(probe);
        self
    }

    /// Subscribe to controller notifications
    pub fn subscribe(&self, listener: impl Fn(&TableEvent) + Send + Sync + 'static) {
        self.listeners.write().push(Box::new(listener));
    }

    fn emit(&self, event: TableEvent) {
        for listener in self.listeners.read().iter() {
            listener(&event);
        }
    }

    /// Restore persisted state (when a store is attached), announce
    /// readiness and run the initial fetch.
    pub async fn init(&self) {
        if let Some(store) = &self.store {
            if let Some(state) = restore_query(
                store.as_ref(),
                &self.options.table_id,
                self.options.persist_max_age,
            ) {
                self.inner.lock().query = state;
                self.emit(TableEvent::StateRestored);
            }
        }
        self.emit(TableEvent::Initialized);
        self.schedule(None).await;
    }

    /// Current query snapshot
    pub fn query(&self) -> QueryState {
        self.inner.lock().query.clone()
    }

    /// Controller configuration (page sizes, debounce windows, …)
    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    /// Snapshot for the render surface
    pub fn view(&self) -> TableView {
        let inner = self.inner.lock();
        TableView {
            rows: inner.rows.clone(),
            loading: inner.loading,
            empty: inner.rows.is_empty() && !inner.loading,
            plan: inner.plan.clone(),
            total: inner.total,
            selected: inner.selection.selected_ids(),
            cursor: inner.navigator.cursor(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().loading
    }

    // --- query transitions ---------------------------------------------

    /// Change the free-text search term; debounced.
    pub async fn set_search(&self, term: impl Into<String>) {
        let term = term.into();
        {
            let mut inner = self.inner.lock();
            if inner.query.search == term {
                return;
            }
            inner.query = inner.query.with_search(term.clone());
        }
        self.emit(TableEvent::SearchChanged(term));
        self.persist();
        self.schedule(Some(self.options.search_debounce)).await;
    }

    /// Change or clear a per-column filter; debounced.
    pub async fn set_column_filter(&self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        {
            let mut inner = self.inner.lock();
            let next = inner.query.with_column_filter(column.clone(), value.clone());
            if next == inner.query {
                return;
            }
            inner.query = next;
        }
        self.emit(TableEvent::FilterChanged { column, value });
        self.persist();
        self.schedule(Some(self.options.filter_debounce)).await;
    }

    /// Sort by a column; immediate.
    pub async fn set_sort(&self, column: impl Into<String>, order: SortOrder) {
        let column = column.into();
        {
            let mut inner = self.inner.lock();
            if inner.query.sort.as_deref() == Some(column.as_str()) && inner.query.order == order {
                return;
            }
            inner.query = inner.query.with_sort(column.clone(), order);
        }
        self.emit(TableEvent::SortChanged {
            column: Some(column),
            order,
        });
        self.persist();
        self.schedule(None).await;
    }

    /// Clear sorting; immediate.
    pub async fn clear_sort(&self) {
        {
            let mut inner = self.inner.lock();
            if inner.query.sort.is_none() {
                return;
            }
            inner.query = inner.query.without_sort();
        }
        self.emit(TableEvent::SortChanged {
            column: None,
            order: SortOrder::default(),
        });
        self.persist();
        self.schedule(None).await;
    }

    /// Navigate to a page; immediate. Pages below 1 and no-op navigations
    /// are rejected locally; the upper bound is the endpoint's to enforce.
    pub async fn set_page(&self, page: u64) {
        {
            let mut inner = self.inner.lock();
            let next = inner.query.with_page(page);
            if next.page == inner.query.page {
                return;
            }
            inner.query = next;
        }
        self.emit(TableEvent::PageChanged(page));
        self.persist();
        self.schedule(None).await;
    }

    /// Change the page size; immediate.
    pub async fn set_per_page(&self, per_page: u64) {
        {
            let mut inner = self.inner.lock();
            if per_page == 0 || per_page == inner.query.per_page {
                return;
            }
            inner.query = inner.query.with_per_page(per_page);
        }
        self.emit(TableEvent::PerPageChanged(per_page));
        self.persist();
        self.schedule(None).await;
    }

    /// Reset the query to defaults; immediate. Selection is untouched
    /// (clearing selection never refetches, and resetting the query is a
    /// query concern).
    pub async fn reset(&self) {
        {
            let mut inner = self.inner.lock();
            inner.query = inner.query.reset();
        }
        self.emit(TableEvent::Reset);
        self.persist();
        self.schedule(None).await;
    }

    /// Re-run the current query without changing it.
    pub async fn reload(&self) {
        self.emit(TableEvent::Reloaded);
        self.schedule(None).await;
    }

    // --- selection ------------------------------------------------------

    pub fn select(&self, id: impl Into<RowId>) {
        let changes = self.inner.lock().selection.select(id.into());
        self.emit_selection(changes);
    }

    pub fn toggle(&self, id: impl Into<RowId>, force: Option<bool>) {
        let changes = self.inner.lock().selection.toggle(id.into(), force);
        self.emit_selection(changes);
    }

    /// Select every currently rendered row (multiple mode only).
    pub fn select_all(&self) {
        let (added, selected) = {
            let mut inner = self.inner.lock();
            let visible: Vec<RowId> = inner.rows.iter().filter_map(Row::id).collect();
            let added = inner.selection.select_all(visible);
            (added, inner.selection.len())
        };
        if added > 0 {
            self.emit(TableEvent::AllSelected);
            self.emit(TableEvent::SelectionChanged { selected });
        }
    }

    /// Clear the selection. Never triggers a refetch.
    pub fn clear_selection(&self) {
        let removed = self.inner.lock().selection.clear();
        if removed > 0 {
            self.emit(TableEvent::AllDeselected);
            self.emit(TableEvent::SelectionChanged { selected: 0 });
        }
    }

    pub fn is_selected(&self, id: &RowId) -> bool {
        self.inner.lock().selection.is_selected(id)
    }

    pub fn selected_ids(&self) -> Vec<RowId> {
        self.inner.lock().selection.selected_ids()
    }

    fn emit_selection(&self, changes: Vec<SelectionChange>) {
        if changes.is_empty() {
            return;
        }
        let selected = self.inner.lock().selection.len();
        for change in changes {
            match change {
                SelectionChange::Selected(id) => self.emit(TableEvent::RowSelected(id)),
                SelectionChange::Deselected(id) => self.emit(TableEvent::RowDeselected(id)),
            }
        }
        self.emit(TableEvent::SelectionChanged { selected });
    }

    // --- keyboard -------------------------------------------------------

    /// Dispatch one navigation command. Dropped while a text-entry surface
    /// reports focus; page commands route through the query layer.
    pub async fn handle_key(&self, command: NavCommand) {
        if let Some(focus) = &self.focus {
            if focus.is_text_input_focused() {
                return;
            }
        }

        let effect = {
            let mut inner = self.inner.lock();
            let Inner {
                rows,
                selection,
                navigator,
                ..
            } = &mut *inner;
            navigator.apply(command, rows, selection)
        };

        match effect {
            NavEffect::None => {}
            NavEffect::Moved { changes, .. } => self.emit_selection(changes),
            NavEffect::Page(request) => {
                let target = {
                    let inner = self.inner.lock();
                    match request {
                        PageRequest::Next => {
                            if !inner.plan.next_enabled {
                                return;
                            }
                            inner.query.page + 1
                        }
                        PageRequest::Prev => {
                            if !inner.plan.prev_enabled {
                                return;
                            }
                            inner.query.page - 1
                        }
                        PageRequest::First => 1,
                    }
                };
                self.set_page(target).await;
            }
            NavEffect::Activated(row) => self.emit(TableEvent::RowActivated(row)),
            NavEffect::Toggled(changes) => self.emit_selection(changes),
            NavEffect::SelectedAll(added) => {
                if added > 0 {
                    let selected = self.inner.lock().selection.len();
                    self.emit(TableEvent::AllSelected);
                    self.emit(TableEvent::SelectionChanged { selected });
                }
            }
            NavEffect::Cleared(removed) => {
                if removed > 0 {
                    self.emit(TableEvent::AllDeselected);
                    self.emit(TableEvent::SelectionChanged { selected: 0 });
                }
            }
        }
    }

    // --- fetch coordination ---------------------------------------------

    /// Best-effort state save; storage problems are logged, never raised.
    fn persist(&self) {
        if let Some(store) = &self.store {
            let query = self.inner.lock().query.clone();
            save_query(store.as_ref(), &self.options.table_id, &query);
        }
    }

    /// Bump the generation, optionally wait out a debounce window, then
    /// execute unless a newer schedule superseded this one meanwhile.
    async fn schedule(&self, debounce: Option<Duration>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, ?debounce, "scheduling fetch");
        if let Some(delay) = debounce {
            tokio::time::sleep(delay).await;
            if self.generation.load(Ordering::SeqCst) != generation {
                tracing::debug!(generation, "superseded while debouncing");
                return;
            }
        }
        self.execute(generation).await;
    }

    #[tracing::instrument(skip(self), fields(table_id = %self.options.table_id))]
    async fn execute(&self, generation: u64) {
        let wire = {
            let mut inner = self.inner.lock();
            inner.loading = true;
            inner.query.to_page_query(false)
        };
        self.emit(TableEvent::LoadingStarted);

        let timeout = self.options.fetch_timeout;
        let result = match tokio::time::timeout(timeout, self.source.fetch_page(&wire)).await {
            Ok(result) => result,
            Err(_) => Err(GridlineError::Timeout(timeout.as_millis() as u64)),
        };

        // Last-request-wins: even a response that resolves after a newer
        // one was applied stays inert.
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "discarding stale fetch result");
            return;
        }

        match result {
            Ok(page) => self.apply_page(generation, page),
            Err(err) => {
                self.inner.lock().loading = false;
                tracing::warn!(generation, error = %err, "fetch failed, keeping previously rendered rows");
                self.emit(TableEvent::FetchFailed(Arc::new(err)));
            }
        }
    }

    fn apply_page(&self, generation: u64, page: PageResult) {
        let PageResult {
            rows,
            current_page,
            last_page,
            total,
        } = page;
        let row_count = rows.len();
        {
            let mut inner = self.inner.lock();
            // the endpoint's page bounds are authoritative; converge on them
            if current_page >= 1 && inner.query.page != current_page {
                inner.query = inner.query.with_page(current_page);
            }
            inner.rows = rows;
            inner.total = total;
            inner.plan = if self.options.detailed_pagination {
                PaginationPlan::detailed(current_page, last_page)
            } else {
                PaginationPlan::simple(current_page, last_page)
            };
            inner.navigator.invalidate();
            inner.loading = false;
        }
        tracing::info!(generation, rows = row_count, total, "page loaded");
        self.emit(TableEvent::LoadingFinished);
    }
}
