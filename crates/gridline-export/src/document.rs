//! Document-writer sink
//!
//! Print views and paginated documents are produced by an external
//! `DocumentWriter`; the sink adapter only feeds it headers and rendered
//! rows. The byte-level document format is entirely the writer's concern.

use chrono::{DateTime, Utc};

use crate::sink::{RowSink, SinkError};
use crate::transform::SinkKind;

/// Which document shape the writer should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Single flowing print view
    Print,
    /// Paginated document (page breaks, running headers)
    Paginated,
}

/// Metadata handed to the writer at `begin`
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    pub title: String,
    pub kind: DocumentKind,
    pub generated_at: DateTime<Utc>,
}

impl DocumentMeta {
    pub fn new(title: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            title: title.into(),
            kind,
            generated_at: Utc::now(),
        }
    }
}

/// External collaborator producing the downloadable document artifact
pub trait DocumentWriter: Send {
    fn begin(&mut self, meta: &DocumentMeta, headers: &[String]) -> Result<(), SinkError>;
    fn write_row(&mut self, cells: &[String]) -> Result<(), SinkError>;
    fn finish(&mut self) -> Result<(), SinkError>;
    fn abort(&mut self);
}

/// Adapts a `DocumentWriter` to the pipeline's sink contract
pub struct DocumentSink<W: DocumentWriter> {
    writer: W,
    meta: DocumentMeta,
}

impl<W: DocumentWriter> DocumentSink<W> {
    pub fn new(writer: W, meta: DocumentMeta) -> Self {
        Self { writer, meta }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: DocumentWriter> RowSink for DocumentSink<W> {
    fn kind(&self) -> SinkKind {
        match self.meta.kind {
            DocumentKind::Print => SinkKind::Print,
            DocumentKind::Paginated => SinkKind::Document,
        }
    }

    fn begin(&mut self, headers: &[String]) -> Result<(), SinkError> {
        self.writer.begin(&self.meta, headers)
    }

    fn write_row(&mut self, cells: &[String]) -> Result<(), SinkError> {
        self.writer.write_row(cells)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.finish()
    }

    fn abort(&mut self) {
        self.writer.abort();
    }
}
