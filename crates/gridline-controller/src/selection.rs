//! Row selection state machine
//!
//! Selection is keyed by row id, never by row position, so it survives
//! pagination, filtering and re-sorting. Mutations report exactly what
//! changed; an operation that targets an id already in the desired state
//! returns no changes and must not produce a notification.

use indexmap::IndexSet;

use gridline_core::RowId;

/// Selection cardinality mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// At most one selected row; selecting replaces the previous selection
    Single,
    /// Unbounded selection
    #[default]
    Multiple,
}

/// A single membership change, in application order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    Selected(RowId),
    Deselected(RowId),
}

/// Tracks the set of selected row ids
#[derive(Debug, Clone)]
pub struct SelectionModel {
    mode: SelectionMode,
    selected: IndexSet<RowId>,
}

impl SelectionModel {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            selected: IndexSet::new(),
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Pure membership lookup
    pub fn is_selected(&self, id: &RowId) -> bool {
        self.selected.contains(id)
    }

    /// Selected ids in insertion order
    pub fn selected_ids(&self) -> Vec<RowId> {
        self.selected.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Select a row. In `Single` mode any other member is deselected first;
    /// in `Multiple` mode the id is added. Selecting an already-selected id
    /// changes nothing.
    pub fn select(&mut self, id: RowId) -> Vec<SelectionChange> {
        if self.selected.contains(&id) {
            return Vec::new();
        }
        let mut changes = Vec::new();
        if self.mode == SelectionMode::Single {
            for prior in self.selected.drain(..) {
                changes.push(SelectionChange::Deselected(prior));
            }
        }
        self.selected.insert(id.clone());
        changes.push(SelectionChange::Selected(id));
        changes
    }

    /// Toggle a row's membership.
    ///
    /// In `Single` mode, toggling the sole member deselects it and toggling
    /// anything else behaves as `select`. In `Multiple` mode, `force`
    /// pins the target state (a no-op when already there) and `None` flips
    /// current membership.
    pub fn toggle(&mut self, id: RowId, force: Option<bool>) -> Vec<SelectionChange> {
        match self.mode {
            SelectionMode::Single => {
                if self.selected.contains(&id) {
                    self.selected.shift_remove(&id);
                    vec![SelectionChange::Deselected(id)]
                } else {
                    self.select(id)
                }
            }
            SelectionMode::Multiple => {
                let member = self.selected.contains(&id);
                let desired = force.unwrap_or(!member);
                if desired == member {
                    return Vec::new();
                }
                if desired {
                    self.selected.insert(id.clone());
                    vec![SelectionChange::Selected(id)]
                } else {
                    self.selected.shift_remove(&id);
                    vec![SelectionChange::Deselected(id)]
                }
            }
        }
    }

    /// Add every visible row id to the selection. Only meaningful in
    /// `Multiple` mode (`Single` mode is a no-op); does not fetch pages
    /// beyond the rendered set. Returns how many ids were newly added.
    pub fn select_all(&mut self, visible: impl IntoIterator<Item = RowId>) -> usize {
        if self.mode == SelectionMode::Single {
            return 0;
        }
        let mut added = 0;
        for id in visible {
            if self.selected.insert(id) {
                added += 1;
            }
        }
        added
    }

    /// Empty the selection; returns how many ids were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.selected.len();
        self.selected.clear();
        removed
    }
}
