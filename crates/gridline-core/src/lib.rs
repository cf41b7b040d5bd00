//! Gridline Core - Shared abstractions for the table-view controller
//!
//! This crate provides the fundamental traits and types that the other
//! Gridline crates depend on. It defines:
//!
//! - `DataSource` - Trait for remote paginated collection endpoints
//! - `PageQuery` / `PageResult` - Wire query parameters and decoded pages
//! - Common types like `Value`, `Row`, `RowId`, `SortOrder`
//! - `TableEvent` - Notifications observable by render surfaces

mod error;
mod events;
mod source;
mod types;

pub use error::*;
pub use events::*;
pub use source::*;
pub use types::*;
