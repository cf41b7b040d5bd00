//! Notifications emitted by the table controller
//!
//! Render surfaces and external code subscribe to these; they are the only
//! outbound channel the controller has. Events carry plain data, never
//! references into controller state.

use std::sync::Arc;

use crate::error::GridlineError;
use crate::types::{Row, RowId, SortOrder};

/// Events emitted by a table controller
#[derive(Debug, Clone)]
pub enum TableEvent {
    /// Controller constructed and ready
    Initialized,
    /// A fetch has started; show the spinner
    LoadingStarted,
    /// The latest fetch finished and its rows are visible
    LoadingFinished,
    /// A fetch failed; previously rendered rows remain in place
    FetchFailed(Arc<GridlineError>),
    /// Free-text search term changed
    SearchChanged(String),
    /// A per-column filter changed (empty value means cleared)
    FilterChanged { column: String, value: String },
    /// Sort key or direction changed (`None` means sorting cleared)
    SortChanged {
        column: Option<String>,
        order: SortOrder,
    },
    /// Current page changed
    PageChanged(u64),
    /// Page size changed
    PerPageChanged(u64),
    /// Query state reset to defaults
    Reset,
    /// Explicit reload of the current query
    Reloaded,
    /// Selection membership changed in any way
    SelectionChanged { selected: usize },
    /// A specific row entered the selection
    RowSelected(RowId),
    /// A specific row left the selection
    RowDeselected(RowId),
    /// Every visible row was selected at once
    AllSelected,
    /// The selection was cleared at once
    AllDeselected,
    /// A row was activated (opened); carries the full row data
    RowActivated(Row),
    /// Query state was restored from the persistence store
    StateRestored,
}
