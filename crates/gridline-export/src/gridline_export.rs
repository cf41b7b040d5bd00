//! Gridline Export - Chunked multi-format export pipeline
//!
//! Re-walks a remote paginated collection in bounded chunks and streams
//! each batch into a `RowSink` (delimited text, in-memory workbook, or an
//! external document writer), enforcing a record ceiling and a
//! caller-declared fallback policy when the chunked walk fails. One
//! pipeline, parameterized by the sink, replaces per-format export loops.

mod delimited;
mod document;
mod pipeline;
mod sink;
mod transform;
mod workbook;

pub use delimited::*;
pub use document::*;
pub use pipeline::*;
pub use sink::*;
pub use transform::*;
pub use workbook::*;
