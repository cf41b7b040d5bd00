//! Integration tests for TableController
//!
//! Exercises the fetch coordination (debounce, generation-tagged staleness,
//! timeout, failure handling), selection and keyboard navigation against
//! the MockSource.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gridline_controller::{
    FocusProbe, MemoryStore, NavCommand, SelectionMode, StateStore, TableController, TableOptions,
    save_query,
};
use gridline_core::{GridlineError, RowId, TableEvent};

use common::{page_of, EventLog, MockSource};

fn fast_options() -> TableOptions {
    TableOptions {
        search_debounce: Duration::from_millis(30),
        filter_debounce: Duration::from_millis(30),
        fetch_timeout: Duration::from_millis(200),
        ..Default::default()
    }
}

/// A three-page collection: ids 1..6, 6..11, 11..16
fn three_page_source() -> MockSource {
    MockSource::new()
        .with_page(1, page_of(1..6, 1, 3, 15))
        .with_page(2, page_of(6..11, 2, 3, 15))
        .with_page(3, page_of(11..16, 3, 3, 15))
}

async fn wait_for_fetch(source: &MockSource, page: u64) {
    for _ in 0..500 {
        if source.fetches_for_page(page) > 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("no fetch for page {page} was issued");
}

// ============ fetch coordination ============

#[tokio::test]
async fn init_loads_the_first_page() {
    let source = Arc::new(three_page_source());
    let controller = TableController::new(source.clone(), fast_options());
    let log = EventLog::new();
    controller.subscribe(log.recorder());

    controller.init().await;

    let view = controller.view();
    assert_eq!(view.rows.len(), 5);
    assert_eq!(view.total, 15);
    assert!(!view.loading);
    assert!(!view.empty);
    assert!(log
        .events()
        .iter()
        .any(|e| matches!(e, TableEvent::Initialized)));
    assert_eq!(log.count(|e| matches!(e, TableEvent::LoadingStarted)), 1);
    assert_eq!(log.count(|e| matches!(e, TableEvent::LoadingFinished)), 1);
}

#[tokio::test]
async fn stale_response_never_wins() {
    let source = Arc::new(three_page_source());
    let gate = source.gate(2);
    let controller = Arc::new(TableController::new(source.clone(), fast_options()));
    controller.init().await;

    // page 2 fetch starts but its response is held open
    let slow = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.set_page(2).await })
    };
    wait_for_fetch(&source, 2).await;

    // a newer navigation supersedes it and completes first
    controller.set_page(3).await;
    let after_third: Vec<RowId> = controller.view().rows.iter().filter_map(|r| r.id()).collect();
    assert_eq!(after_third.first(), Some(&RowId::new("11")));

    // now the page-2 response arrives late; it must stay inert
    gate.notify_one();
    slow.await.expect("slow navigation task");

    let view = controller.view();
    let first_id = view.rows.first().and_then(|r| r.id());
    assert_eq!(first_id, Some(RowId::new("11")), "stale page 2 replaced page 3");
    assert_eq!(controller.query().page, 3);
    assert_eq!(source.fetches_for_page(2), 1);
}

#[tokio::test]
async fn rapid_search_input_is_debounced_to_one_fetch() {
    let source = Arc::new(three_page_source());
    let controller = Arc::new(TableController::new(source.clone(), fast_options()));
    controller.init().await;

    tokio::join!(
        controller.set_search("a"),
        controller.set_search("ad"),
        controller.set_search("ada"),
    );

    let searches: Vec<String> = source
        .query_log()
        .into_iter()
        .filter(|q| !q.search.is_empty())
        .map(|q| q.search)
        .collect();
    assert_eq!(searches, vec!["ada".to_string()], "only the last term is fetched");
    assert_eq!(controller.query().page, 1);
}

#[tokio::test]
async fn timeout_is_classified_and_rows_survive() {
    let source = Arc::new(three_page_source());
    let _gate = source.gate(2); // never released
    let controller = TableController::new(source.clone(), fast_options());
    let log = EventLog::new();
    controller.subscribe(log.recorder());
    controller.init().await;

    controller.set_page(2).await;

    let timed_out = log.events().iter().any(|e| {
        matches!(e, TableEvent::FetchFailed(err) if matches!(err.as_ref(), GridlineError::Timeout(_)))
    });
    assert!(timed_out, "expected a classified timeout failure");

    // previously rendered rows are not destroyed
    let view = controller.view();
    assert_eq!(view.rows.len(), 5);
    assert_eq!(view.rows[0].id(), Some(RowId::new("1")));
    assert!(!view.loading);
}

#[tokio::test]
async fn fetch_failure_keeps_previous_rows() {
    let source = Arc::new(three_page_source());
    let controller = TableController::new(source.clone(), fast_options());
    let log = EventLog::new();
    controller.subscribe(log.recorder());
    controller.init().await;

    source.set_fail(true);
    controller.reload().await;

    assert_eq!(log.count(|e| matches!(e, TableEvent::FetchFailed(_))), 1);
    assert_eq!(controller.view().rows.len(), 5, "rows survive a transient failure");
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn empty_result_is_an_explicit_empty_state() {
    let source = Arc::new(MockSource::new()); // every page resolves empty
    let controller = TableController::new(source, fast_options());
    controller.init().await;

    let view = controller.view();
    assert!(view.rows.is_empty());
    assert!(view.empty);
    assert!(!view.loading);
}

#[tokio::test]
async fn endpoint_page_clamp_converges_local_state() {
    // Asking for page 99 of a 3-page collection: the endpoint clamps and
    // answers with page 3 metadata; controller and planner follow it.
    let source = Arc::new(
        MockSource::new()
            .with_page(1, page_of(1..6, 1, 3, 15))
            .with_page(99, page_of(11..16, 3, 3, 15)),
    );
    let controller = TableController::new(source, fast_options());
    controller.init().await;

    controller.set_page(99).await;

    assert_eq!(controller.query().page, 3);
    let view = controller.view();
    assert_eq!(view.plan.current, 3);
    assert_eq!(view.plan.last, 3);
    assert!(!view.plan.next_enabled);
}

#[tokio::test]
async fn sort_change_keeps_page_and_refetches_immediately() {
    let source = Arc::new(three_page_source());
    let controller = TableController::new(source.clone(), fast_options());
    controller.init().await;
    controller.set_page(2).await;

    controller
        .set_sort("name", gridline_core::SortOrder::Desc)
        .await;

    let query = controller.query();
    assert_eq!(query.page, 2, "sorting must not reset pagination");
    let last = source.query_log().pop().expect("sort fetch");
    assert_eq!(last.sort_by.as_deref(), Some("name"));
}

// ============ persistence ============

#[tokio::test]
async fn saved_state_is_restored_on_init() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let saved = gridline_controller::QueryState::default()
        .with_search("ada")
        .with_page(2);
    save_query(store.as_ref(), "users", &saved);

    let source = Arc::new(three_page_source());
    let options = TableOptions {
        table_id: "users".to_string(),
        ..fast_options()
    };
    let controller = TableController::new(source.clone(), options).with_store(store);
    let log = EventLog::new();
    controller.subscribe(log.recorder());

    controller.init().await;

    assert_eq!(log.count(|e| matches!(e, TableEvent::StateRestored)), 1);
    let first_fetch = source.query_log().first().cloned().expect("initial fetch");
    assert_eq!(first_fetch.search, "ada");
    assert_eq!(first_fetch.page, 2);
}

#[tokio::test]
async fn query_changes_are_persisted() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(three_page_source());
    let options = TableOptions {
        table_id: "users".to_string(),
        ..fast_options()
    };
    let controller =
        TableController::new(source, options).with_store(store.clone() as Arc<dyn StateStore>);
    controller.init().await;

    controller.set_page(3).await;

    let raw = store.get("users").expect("state saved");
    assert!(raw.contains("\"page\":3"), "saved state carries the page: {raw}");
}

// ============ selection ============

#[tokio::test]
async fn selection_persists_across_pagination() {
    let source = Arc::new(three_page_source());
    let controller = TableController::new(source, fast_options());
    controller.init().await;

    controller.select("2");
    assert!(controller.is_selected(&RowId::new("2")));

    controller.set_page(2).await;
    assert!(
        controller.is_selected(&RowId::new("2")),
        "selection is keyed by id, not by rendered position"
    );

    controller.set_page(1).await;
    assert_eq!(controller.selected_ids(), vec![RowId::new("2")]);
}

#[tokio::test]
async fn single_mode_select_replaces_and_emits() {
    let source = Arc::new(three_page_source());
    let controller = TableController::new(source, fast_options())
        .with_selection_mode(SelectionMode::Single);
    let log = EventLog::new();
    controller.subscribe(log.recorder());
    controller.init().await;

    controller.select("A");
    controller.select("B");

    assert_eq!(controller.selected_ids(), vec![RowId::new("B")]);
    assert_eq!(log.count(|e| matches!(e, TableEvent::RowSelected(_))), 2);
    assert_eq!(log.count(|e| matches!(e, TableEvent::RowDeselected(_))), 1);
    assert_eq!(log.count(|e| matches!(e, TableEvent::SelectionChanged { .. })), 2);
}

#[tokio::test]
async fn select_all_in_single_mode_is_silent_noop() {
    let source = Arc::new(three_page_source());
    let controller = TableController::new(source, fast_options())
        .with_selection_mode(SelectionMode::Single);
    let log = EventLog::new();
    controller.subscribe(log.recorder());
    controller.init().await;

    controller.select_all();

    assert!(controller.selected_ids().is_empty());
    assert_eq!(log.count(|e| matches!(e, TableEvent::AllSelected)), 0);
    assert_eq!(log.count(|e| matches!(e, TableEvent::SelectionChanged { .. })), 0);
}

#[tokio::test]
async fn redundant_toggle_emits_nothing() {
    let source = Arc::new(three_page_source());
    let controller = TableController::new(source, fast_options());
    let log = EventLog::new();
    controller.subscribe(log.recorder());
    controller.init().await;

    controller.toggle("A", Some(true));
    controller.toggle("A", Some(true)); // same state as the prior force

    assert_eq!(log.count(|e| matches!(e, TableEvent::SelectionChanged { .. })), 1);
}

#[tokio::test]
async fn select_all_and_clear_emit_aggregate_events() {
    let source = Arc::new(three_page_source());
    let controller = TableController::new(source, fast_options());
    let log = EventLog::new();
    controller.subscribe(log.recorder());
    controller.init().await;

    controller.select_all();
    assert_eq!(controller.selected_ids().len(), 5);
    assert_eq!(log.count(|e| matches!(e, TableEvent::AllSelected)), 1);

    controller.clear_selection();
    assert!(controller.selected_ids().is_empty());
    assert_eq!(log.count(|e| matches!(e, TableEvent::AllDeselected)), 1);

    // clearing an empty selection is silent
    controller.clear_selection();
    assert_eq!(log.count(|e| matches!(e, TableEvent::AllDeselected)), 1);
}

// ============ keyboard navigation ============

#[tokio::test]
async fn keyboard_page_navigation_goes_through_query_layer() {
    let source = Arc::new(three_page_source());
    let controller = TableController::new(source.clone(), fast_options());
    controller.init().await;

    controller.handle_key(NavCommand::NextPage).await;
    assert_eq!(controller.query().page, 2);

    controller.handle_key(NavCommand::FirstPage).await;
    assert_eq!(controller.query().page, 1);

    // previous at the first page is a no-op
    controller.handle_key(NavCommand::PrevPage).await;
    assert_eq!(controller.query().page, 1);
}

#[tokio::test]
async fn next_page_at_last_page_is_a_noop() {
    let source = Arc::new(three_page_source());
    let controller = TableController::new(source.clone(), fast_options());
    controller.init().await;
    controller.set_page(3).await;

    controller.handle_key(NavCommand::NextPage).await;

    assert_eq!(controller.query().page, 3);
    assert_eq!(source.fetches_for_page(4), 0);
}

#[tokio::test]
async fn cursor_recovers_after_refetch() {
    let source = Arc::new(three_page_source());
    let controller = TableController::new(source, fast_options());
    controller.init().await;

    // select id 2 (index 1 on page 1), then page away: id 2 is absent
    controller.select("2");
    controller.set_page(2).await;
    assert_eq!(controller.view().cursor, None, "row-set change invalidates the cursor");

    controller.handle_key(NavCommand::CursorDown).await;
    assert_eq!(
        controller.view().cursor,
        Some(0),
        "with the selected id absent, the first movement lands on row 0"
    );

    // back on page 1 the cursor re-derives from the selected id
    controller.set_page(1).await;
    controller.handle_key(NavCommand::CursorDown).await;
    assert_eq!(controller.view().cursor, Some(2));
}

#[tokio::test]
async fn row_activation_carries_full_row_data() {
    let source = Arc::new(three_page_source());
    let controller = TableController::new(source, fast_options());
    let log = EventLog::new();
    controller.subscribe(log.recorder());
    controller.init().await;

    controller.handle_key(NavCommand::CursorDown).await;
    controller.handle_key(NavCommand::Activate).await;

    let activated = log.events().into_iter().find_map(|e| match e {
        TableEvent::RowActivated(row) => Some(row),
        _ => None,
    });
    let row = activated.expect("activation event");
    assert_eq!(row.id(), Some(RowId::new("1")));
    assert_eq!(
        row.get("name").map(ToString::to_string),
        Some("row 1".to_string())
    );
}

struct TextInputFocused(AtomicBool);

impl FocusProbe for TextInputFocused {
    fn is_text_input_focused(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn commands_are_dropped_while_typing() {
    let source = Arc::new(three_page_source());
    let probe = Arc::new(TextInputFocused(AtomicBool::new(true)));
    let controller =
        TableController::new(source, fast_options()).with_focus_probe(probe.clone());
    controller.init().await;

    controller.handle_key(NavCommand::CursorDown).await;
    assert_eq!(controller.view().cursor, None, "focused text input swallows commands");

    probe.0.store(false, Ordering::SeqCst);
    controller.handle_key(NavCommand::CursorDown).await;
    assert_eq!(controller.view().cursor, Some(0));
}
