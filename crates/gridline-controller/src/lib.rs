//! Gridline Controller - The live table-view engine
//!
//! Owns the query state, coordinates fetches against a `DataSource` with
//! debouncing, generation-tagged staleness and timeouts, and tracks row
//! selection and keyboard navigation over the currently rendered page.
//!
//! The controller is headless: render surfaces subscribe to `TableEvent`
//! notifications and read view snapshots; they never mutate controller
//! state directly.

mod controller;
mod keyboard;
mod pagination;
mod persistence;
mod query;
mod selection;

pub use controller::*;
pub use keyboard::*;
pub use pagination::*;
pub use persistence::*;
pub use query::*;
pub use selection::*;
