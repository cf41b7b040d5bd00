//! Sink abstraction consumed by the export pipeline
//!
//! A sink receives header labels once, then rendered rows one at a time,
//! and is finalized exactly once: a terminal `finish` on success or a
//! terminal `abort` on failure. After an `abort`, a fallback pass may call
//! `begin` again and write from scratch — an aborted sink must leave no
//! partial artifact behind.

use thiserror::Error;

use crate::transform::SinkKind;

/// Errors raised by sinks and document writers
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Writer error: {0}")]
    Writer(String),
}

/// A destination for rendered export rows
pub trait RowSink: Send {
    /// Which transform family this sink wants
    fn kind(&self) -> SinkKind;

    /// Start (or, after an abort, restart) the artifact with these headers
    fn begin(&mut self, headers: &[String]) -> Result<(), SinkError>;

    /// Append one rendered row
    fn write_row(&mut self, cells: &[String]) -> Result<(), SinkError>;

    /// Seal the artifact; at most one successful `finish` per export
    fn finish(&mut self) -> Result<(), SinkError>;

    /// Discard everything written since `begin`; must not fail
    fn abort(&mut self);
}
