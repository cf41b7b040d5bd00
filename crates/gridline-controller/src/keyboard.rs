//! Keyboard navigation over the rendered row set
//!
//! The navigator holds a cursor into the *currently rendered* rows, not a
//! global index. Commands come in as typed values; key-to-command mapping
//! belongs to the render surface, which also answers the focus capability
//! query (`FocusProbe`) so table shortcuts stay inert while the user types
//! into a search or filter box.

use gridline_core::Row;

use crate::selection::{SelectionChange, SelectionMode, SelectionModel};

/// Capability query owned by the render surface: is a text-entry surface
/// currently focused? The controller drops navigation commands while this
/// reports true.
pub trait FocusProbe: Send + Sync {
    fn is_text_input_focused(&self) -> bool;
}

/// Navigation and selection commands over the rendered rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    /// Move the cursor up one row
    CursorUp,
    /// Move the cursor down one row
    CursorDown,
    /// Jump to the first row of the current page
    CursorFirst,
    /// Jump to the last row of the current page
    CursorLast,
    /// Navigate to the next page
    NextPage,
    /// Navigate to the previous page
    PrevPage,
    /// Navigate to the first page
    FirstPage,
    /// Activate (open) the current selection
    Activate,
    /// Toggle the cursor row's membership (multiple mode only)
    ToggleCurrent,
    /// Select every rendered row (multiple mode only)
    SelectAll,
    /// Clear the selection
    ClearSelection,
}

/// Page navigation requested by a command; resolved by the query layer,
/// never by the selection model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Next,
    Prev,
    First,
}

/// What applying a command did
#[derive(Debug, Clone, PartialEq)]
pub enum NavEffect {
    /// Nothing happened (empty page, wrong mode, stale cursor)
    None,
    /// The cursor moved; in single mode this may carry selection changes
    Moved {
        index: usize,
        changes: Vec<SelectionChange>,
    },
    /// Delegate to the pagination/query layer
    Page(PageRequest),
    /// The current selection was activated; carries the full row
    Activated(Row),
    /// The cursor row's membership was toggled
    Toggled(Vec<SelectionChange>),
    /// Every rendered row was selected; count of newly added ids
    SelectedAll(usize),
    /// The selection was cleared; count of removed ids
    Cleared(usize),
}

/// Cursor state machine over the rendered row sequence
#[derive(Debug, Clone, Default)]
pub struct KeyboardNavigator {
    cursor: Option<usize>,
}

impl KeyboardNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The explicit cursor, if one is currently resolved
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Forget the cursor. Called whenever the rendered row set changes
    /// (new page, filter, sort); the next command re-derives a cursor from
    /// selection membership against the new rows.
    pub fn invalidate(&mut self) {
        self.cursor = None;
    }

    /// Apply one command against the rendered rows and the selection.
    pub fn apply(
        &mut self,
        command: NavCommand,
        rows: &[Row],
        selection: &mut SelectionModel,
    ) -> NavEffect {
        match command {
            NavCommand::CursorUp => self.step(-1, rows, selection),
            NavCommand::CursorDown => self.step(1, rows, selection),
            NavCommand::CursorFirst => {
                if rows.is_empty() {
                    NavEffect::None
                } else {
                    self.land(0, rows, selection)
                }
            }
            NavCommand::CursorLast => {
                if rows.is_empty() {
                    NavEffect::None
                } else {
                    self.land(rows.len() - 1, rows, selection)
                }
            }
            NavCommand::NextPage => NavEffect::Page(PageRequest::Next),
            NavCommand::PrevPage => NavEffect::Page(PageRequest::Prev),
            NavCommand::FirstPage => NavEffect::Page(PageRequest::First),
            NavCommand::Activate => match self.resolve(rows, selection) {
                Some(index) => NavEffect::Activated(rows[index].clone()),
                None => NavEffect::None,
            },
            NavCommand::ToggleCurrent => {
                if selection.mode() != SelectionMode::Multiple {
                    return NavEffect::None;
                }
                let Some(index) = self.resolve(rows, selection) else {
                    return NavEffect::None;
                };
                let Some(id) = rows[index].id() else {
                    return NavEffect::None;
                };
                let changes = selection.toggle(id, None);
                if changes.is_empty() {
                    NavEffect::None
                } else {
                    NavEffect::Toggled(changes)
                }
            }
            NavCommand::SelectAll => {
                if selection.mode() != SelectionMode::Multiple {
                    return NavEffect::None;
                }
                let added = selection.select_all(rows.iter().filter_map(Row::id));
                NavEffect::SelectedAll(added)
            }
            NavCommand::ClearSelection => NavEffect::Cleared(selection.clear()),
        }
    }

    /// Move the cursor by one row, clamped to the page bounds. With no
    /// resolvable cursor the first movement lands on row 0.
    fn step(&mut self, delta: i64, rows: &[Row], selection: &mut SelectionModel) -> NavEffect {
        if rows.is_empty() {
            return NavEffect::None;
        }
        let target = match self.resolve(rows, selection) {
            None => 0,
            Some(index) if delta > 0 => (index + 1).min(rows.len() - 1),
            Some(index) => index.saturating_sub(1),
        };
        self.land(target, rows, selection)
    }

    /// Place the cursor on `index`. In single mode the cursor row becomes
    /// the selection; in multiple mode movement alone never mutates it.
    fn land(&mut self, index: usize, rows: &[Row], selection: &mut SelectionModel) -> NavEffect {
        self.cursor = Some(index);
        let changes = if selection.mode() == SelectionMode::Single {
            match rows[index].id() {
                Some(id) => selection.select(id),
                None => Vec::new(),
            }
        } else {
            Vec::new()
        };
        NavEffect::Moved { index, changes }
    }

    /// Resolve a cursor against the current rows: the explicit cursor when
    /// still in range, otherwise the first row whose id is selected.
    fn resolve(&mut self, rows: &[Row], selection: &SelectionModel) -> Option<usize> {
        if let Some(index) = self.cursor {
            if index < rows.len() {
                return Some(index);
            }
        }
        let derived = rows.iter().position(|row| {
            row.id()
                .map(|id| selection.is_selected(&id))
                .unwrap_or(false)
        });
        self.cursor = derived;
        derived
    }
}
