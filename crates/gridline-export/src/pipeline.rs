//! The chunked export pipeline
//!
//! Walks the remote collection sequentially in bounded pages — one request
//! in flight at a time, so row order and worst-case memory stay bounded —
//! and streams every batch straight into the sink. A record ceiling caps
//! the export; a caller-declared fallback policy decides what happens when
//! the chunked walk fails. Whatever happens, the sink sees exactly one
//! terminal call: `finish` on success or `abort` on failure.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use gridline_core::{DataSource, GridlineError, PageQuery, Row};

use crate::sink::{RowSink, SinkError};
use crate::transform::{render_headers, render_row, ColumnSpec, SinkKind};

/// Degradation path when the chunked walk fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Abort the sink, issue one bulk request of this fixed size and
    /// rewrite the artifact from scratch
    SingleRequest { size: u64 },
    /// Abort the sink and export only the rows already rendered in the
    /// current page view
    VisibleRows,
}

/// Pipeline tuning for one export invocation
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Rows requested per page
    pub chunk_size: u64,
    /// Maximum rows ever written; exceeding it truncates the export
    pub record_ceiling: u64,
    /// Caller-declared degradation path
    pub fallback: FallbackPolicy,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            record_ceiling: 50_000,
            fallback: FallbackPolicy::SingleRequest { size: 1000 },
        }
    }
}

/// One export invocation: the frozen query plus pipeline options
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub id: Uuid,
    base: PageQuery,
    pub options: ExportOptions,
}

impl ExportJob {
    /// Freeze a query for export. Search, sort and filters are taken from
    /// `base`; its page and page size are ignored and overridden per chunk.
    pub fn new(base: PageQuery, options: ExportOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            base,
            options,
        }
    }

    fn chunk_query(&self, page: u64) -> PageQuery {
        PageQuery {
            page,
            per_page: self.options.chunk_size,
            export: true,
            ..self.base.clone()
        }
    }

    fn bulk_query(&self, size: u64) -> PageQuery {
        PageQuery {
            page: 1,
            per_page: size,
            export: true,
            ..self.base.clone()
        }
    }
}

/// How an export ended (errors aside)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The whole collection was written
    Complete { rows_written: u64 },
    /// The record ceiling was reached; not a failure, but surfaced
    Truncated { rows_written: u64, ceiling: u64 },
    /// The chunked walk failed and the fallback produced a reduced export
    Fallback { rows_written: u64 },
}

impl ExportOutcome {
    pub fn rows_written(&self) -> u64 {
        match self {
            ExportOutcome::Complete { rows_written }
            | ExportOutcome::Truncated { rows_written, .. }
            | ExportOutcome::Fallback { rows_written } => *rows_written,
        }
    }
}

/// Errors during export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Export failed ({primary}) and fallback failed ({fallback})")]
    FallbackExhausted {
        primary: GridlineError,
        fallback: String,
    },
}

/// Phases of the export process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Starting,
    Exporting,
    FallingBack,
    Finalizing,
    Complete,
}

/// Export progress information
#[derive(Debug, Clone)]
pub struct ExportProgress {
    pub phase: ExportPhase,
    pub pages_fetched: u64,
    pub rows_written: u64,
    pub message: Option<String>,
}

/// Progress callback for export operations
pub type ExportProgressCallback = Box<dyn Fn(ExportProgress) + Send + Sync>;

/// Chunk-walking exporter over a `DataSource`
pub struct ExportPipeline {
    source: Arc<dyn DataSource>,
    progress: Option<ExportProgressCallback>,
}

impl ExportPipeline {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            progress: None,
        }
    }

    /// Set progress callback
    pub fn with_progress(mut self, callback: ExportProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    fn report(&self, phase: ExportPhase, pages_fetched: u64, rows_written: u64, message: Option<String>) {
        if let Some(callback) = &self.progress {
            callback(ExportProgress {
                phase,
                pages_fetched,
                rows_written,
                message,
            });
        }
    }

    /// Run one export job into the sink.
    ///
    /// `visible` carries the rows currently rendered in the live view; it
    /// is only consulted by the `VisibleRows` fallback.
    #[tracing::instrument(skip_all, fields(job_id = %job.id))]
    pub async fn run(
        &self,
        job: &ExportJob,
        columns: &[ColumnSpec],
        sink: &mut dyn RowSink,
        visible: &[Row],
    ) -> Result<ExportOutcome, ExportError> {
        let headers = render_headers(columns);
        let kind = sink.kind();

        self.report(ExportPhase::Starting, 0, 0, Some("Export started".into()));
        if let Err(err) = sink.begin(&headers) {
            sink.abort();
            return Err(err.into());
        }

        let mut rows_written: u64 = 0;
        let mut pages_fetched: u64 = 0;
        let mut page: u64 = 1;

        let primary = loop {
            let batch = match self.source.fetch_page(&job.chunk_query(page)).await {
                Ok(batch) => batch,
                Err(err) => break err,
            };
            pages_fetched += 1;
            let batch_len = batch.rows.len() as u64;

            let remaining = job.options.record_ceiling.saturating_sub(rows_written);
            let take = batch_len.min(remaining) as usize;
            for row in batch.rows.iter().take(take) {
                if let Err(err) = sink.write_row(&render_row(columns, row, kind)) {
                    sink.abort();
                    return Err(err.into());
                }
            }
            rows_written += take as u64;

            tracing::debug!(page, batch = batch_len, rows_written, "chunk written");
            self.report(
                ExportPhase::Exporting,
                pages_fetched,
                rows_written,
                Some(format!("Exported {} rows", rows_written)),
            );

            // Termination order matters: a short batch is the last page and
            // wins over the ceiling, which wins over anything else.
            if batch_len < job.options.chunk_size {
                self.finalize(sink, pages_fetched, rows_written)?;
                tracing::info!(rows_written, pages_fetched, "export complete");
                return Ok(ExportOutcome::Complete { rows_written });
            }
            if rows_written >= job.options.record_ceiling {
                self.finalize(sink, pages_fetched, rows_written)?;
                tracing::info!(
                    rows_written,
                    ceiling = job.options.record_ceiling,
                    "export truncated at record ceiling"
                );
                return Ok(ExportOutcome::Truncated {
                    rows_written,
                    ceiling: job.options.record_ceiling,
                });
            }
            page += 1;
        };

        // The chunked walk failed: discard partial output and degrade per
        // the caller's policy.
        sink.abort();
        tracing::warn!(error = %primary, page, "chunked export failed, applying fallback");
        self.report(
            ExportPhase::FallingBack,
            pages_fetched,
            0,
            Some(format!("Export failed ({}), falling back", primary)),
        );
        self.run_fallback(job, columns, sink, &headers, kind, visible, primary)
            .await
    }

    fn finalize(
        &self,
        sink: &mut dyn RowSink,
        pages_fetched: u64,
        rows_written: u64,
    ) -> Result<(), ExportError> {
        self.report(ExportPhase::Finalizing, pages_fetched, rows_written, None);
        // A failed finish is already the terminal call; no abort after it.
        sink.finish()?;
        self.report(
            ExportPhase::Complete,
            pages_fetched,
            rows_written,
            Some("Export completed".into()),
        );
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_fallback(
        &self,
        job: &ExportJob,
        columns: &[ColumnSpec],
        sink: &mut dyn RowSink,
        headers: &[String],
        kind: SinkKind,
        visible: &[Row],
        primary: GridlineError,
    ) -> Result<ExportOutcome, ExportError> {
        let rows: Vec<Row> = match job.options.fallback {
            FallbackPolicy::SingleRequest { size } => {
                match self.source.fetch_page(&job.bulk_query(size)).await {
                    Ok(batch) => batch.rows,
                    Err(err) => {
                        return Err(ExportError::FallbackExhausted {
                            primary,
                            fallback: err.to_string(),
                        });
                    }
                }
            }
            FallbackPolicy::VisibleRows => visible.to_vec(),
        };

        if let Err(err) = sink.begin(headers) {
            sink.abort();
            return Err(ExportError::FallbackExhausted {
                primary,
                fallback: err.to_string(),
            });
        }

        let mut rows_written: u64 = 0;
        for row in rows.iter().take(job.options.record_ceiling as usize) {
            if let Err(err) = sink.write_row(&render_row(columns, row, kind)) {
                sink.abort();
                return Err(ExportError::FallbackExhausted {
                    primary,
                    fallback: err.to_string(),
                });
            }
            rows_written += 1;
        }

        if let Err(err) = sink.finish() {
            return Err(ExportError::FallbackExhausted {
                primary,
                fallback: err.to_string(),
            });
        }

        tracing::info!(rows_written, "fallback export complete");
        self.report(
            ExportPhase::Complete,
            0,
            rows_written,
            Some(format!("Fallback export wrote {} rows", rows_written)),
        );
        Ok(ExportOutcome::Fallback { rows_written })
    }
}
