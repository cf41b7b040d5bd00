//! Query-state persistence
//!
//! Saves and restores the live query through a process-external key-value
//! store. Writes are fire-and-forget and best-effort: a failing store is
//! logged and ignored, never surfaced into the fetch/render cycle. Saved
//! state carries a timestamp and is discarded on restore once older than
//! the configured maximum age.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gridline_core::SortOrder;

use crate::query::QueryState;

/// Process-external key-value persistence, keyed by table identifier
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Serialized form of a query snapshot plus its save time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedQuery {
    pub search: String,
    pub filters: BTreeMap<String, String>,
    pub sort: Option<String>,
    pub order: SortOrder,
    pub page: u64,
    pub per_page: u64,
    pub saved_at: DateTime<Utc>,
}

impl SavedQuery {
    pub fn from_state(state: &QueryState) -> Self {
        Self {
            search: state.search.clone(),
            filters: state.column_filters.clone(),
            sort: state.sort.clone(),
            order: state.order,
            page: state.page,
            per_page: state.per_page,
            saved_at: Utc::now(),
        }
    }

    pub fn into_state(self) -> QueryState {
        QueryState {
            search: self.search,
            column_filters: self.filters,
            sort: self.sort,
            order: self.order,
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn is_expired(&self, max_age: Duration) -> bool {
        let max = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        Utc::now().signed_duration_since(self.saved_at) > max
    }
}

/// Persist the current query state under `table_id`. Best-effort.
pub fn save_query(store: &dyn StateStore, table_id: &str, state: &QueryState) {
    let saved = SavedQuery::from_state(state);
    match serde_json::to_string(&saved) {
        Ok(json) => store.set(table_id, &json),
        Err(err) => {
            tracing::warn!(error = %err, table_id, "failed to serialize query state, skipping save");
        }
    }
}

/// Restore a previously saved query state, discarding unreadable or
/// expired entries (and removing them from the store).
pub fn restore_query(
    store: &dyn StateStore,
    table_id: &str,
    max_age: Duration,
) -> Option<QueryState> {
    let raw = store.get(table_id)?;
    let saved: SavedQuery = match serde_json::from_str(&raw) {
        Ok(saved) => saved,
        Err(err) => {
            tracing::warn!(error = %err, table_id, "discarding unreadable saved query state");
            store.remove(table_id);
            return None;
        }
    };
    if saved.is_expired(max_age) {
        tracing::debug!(table_id, saved_at = %saved.saved_at, "discarding expired query state");
        store.remove(table_id);
        return None;
    }
    Some(saved.into_state())
}

/// In-memory store; useful for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    entries: parking_lot::Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

/// File-backed store holding one JSON object of `table_id -> saved state`
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Open the store at the platform data directory
    /// (`<data_dir>/gridline/table_state.json`), creating parents as needed.
    pub fn open_default() -> anyhow::Result<Self> {
        let dir = dirs::data_dir()
            .context("Could not determine data directory")?
            .join("gridline");
        if !dir.exists() {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {:?}", dir))?;
        }
        Ok(Self::new(dir.join("table_state.json")))
    }

    fn read_all(&self) -> HashMap<String, String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => HashMap::new(),
        }
    }

    fn write_all(&self, entries: &HashMap<String, String>) {
        let json = match serde_json::to_string_pretty(entries) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize state file");
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.path, json) {
            tracing::warn!(error = %err, path = ?self.path, "failed to write state file");
        }
    }
}

impl StateStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.read_all();
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.read_all();
        if entries.remove(key).is_some() {
            self.write_all(&entries);
        }
    }
}
