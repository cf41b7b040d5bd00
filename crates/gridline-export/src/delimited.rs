//! Line-oriented delimited text sink (CSV and friends)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::sink::{RowSink, SinkError};
use crate::transform::SinkKind;

/// Field separator for delimited output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldDelimiter {
    #[default]
    Comma,
    Tab,
    Semicolon,
    Pipe,
}

impl FieldDelimiter {
    pub fn as_char(&self) -> char {
        match self {
            FieldDelimiter::Comma => ',',
            FieldDelimiter::Tab => '\t',
            FieldDelimiter::Semicolon => ';',
            FieldDelimiter::Pipe => '|',
        }
    }
}

/// Record separator for delimited output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordDelimiter {
    #[default]
    Lf,
    CrLf,
}

impl RecordDelimiter {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordDelimiter::Lf => "\n",
            RecordDelimiter::CrLf => "\r\n",
        }
    }
}

/// Optional qualifier wrapped around each field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextQualifier {
    #[default]
    DoubleQuote,
    SingleQuote,
    None,
}

impl TextQualifier {
    pub fn as_char(&self) -> Option<char> {
        match self {
            TextQualifier::DoubleQuote => Some('"'),
            TextQualifier::SingleQuote => Some('\''),
            TextQualifier::None => None,
        }
    }
}

/// Formatting options for the delimited sink
#[derive(Debug, Clone, Default)]
pub struct DelimitedOptions {
    pub field_delimiter: FieldDelimiter,
    pub record_delimiter: RecordDelimiter,
    pub text_qualifier: TextQualifier,
    /// Write a header record before the data rows
    pub include_headers: bool,
}

impl DelimitedOptions {
    /// Comma-separated, double-quoted, LF-terminated, with headers
    pub fn csv() -> Self {
        Self {
            include_headers: true,
            ..Default::default()
        }
    }
}

enum Destination {
    /// Stream to a file; `begin` truncates, `abort` removes it
    File {
        path: PathBuf,
        writer: Option<BufWriter<File>>,
    },
    /// Accumulate in memory (tests, previews, small exports)
    Memory { buffer: Vec<u8>, open: bool },
}

/// Streams rendered rows as delimited text
pub struct DelimitedSink {
    options: DelimitedOptions,
    destination: Destination,
    rows_written: u64,
}

impl DelimitedSink {
    /// Sink writing to the given path. The file is created on `begin`.
    pub fn file(path: impl Into<PathBuf>, options: DelimitedOptions) -> Self {
        Self {
            options,
            destination: Destination::File {
                path: path.into(),
                writer: None,
            },
            rows_written: 0,
        }
    }

    /// Sink accumulating in memory
    pub fn memory(options: DelimitedOptions) -> Self {
        Self {
            options,
            destination: Destination::Memory {
                buffer: Vec::new(),
                open: false,
            },
            rows_written: 0,
        }
    }

    /// Data rows written since the last `begin`
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// The accumulated text of a memory sink
    pub fn contents(&self) -> Option<String> {
        match &self.destination {
            Destination::Memory { buffer, .. } => Some(String::from_utf8_lossy(buffer).into_owned()),
            Destination::File { .. } => None,
        }
    }

    fn format_record(&self, cells: &[String]) -> String {
        let qualifier = self.options.text_qualifier.as_char();
        let field_delim = self.options.field_delimiter.as_char().to_string();
        let mut record = cells
            .iter()
            .map(|cell| qualify_value(cell, qualifier))
            .collect::<Vec<_>>()
            .join(&field_delim);
        record.push_str(self.options.record_delimiter.as_str());
        record
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        match &mut self.destination {
            Destination::File { writer, .. } => match writer {
                Some(writer) => {
                    writer.write_all(bytes)?;
                    Ok(())
                }
                None => Err(SinkError::Writer("sink not begun".to_string())),
            },
            Destination::Memory { buffer, open } => {
                if !*open {
                    return Err(SinkError::Writer("sink not begun".to_string()));
                }
                buffer.extend_from_slice(bytes);
                Ok(())
            }
        }
    }
}

/// Wrap a field in the qualifier, doubling any embedded qualifier character
fn qualify_value(value: &str, qualifier: Option<char>) -> String {
    match qualifier {
        Some(q) => {
            let escaped = value.replace(q, &format!("{}{}", q, q));
            format!("{}{}{}", q, escaped, q)
        }
        None => value.to_string(),
    }
}

impl RowSink for DelimitedSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Delimited
    }

    fn begin(&mut self, headers: &[String]) -> Result<(), SinkError> {
        self.rows_written = 0;
        match &mut self.destination {
            Destination::File { path, writer } => {
                // File::create truncates, so a fallback restart starts clean
                *writer = Some(BufWriter::new(File::create(&*path)?));
            }
            Destination::Memory { buffer, open } => {
                buffer.clear();
                *open = true;
            }
        }
        if self.options.include_headers {
            let record = self.format_record(headers);
            self.write_bytes(record.as_bytes())?;
        }
        Ok(())
    }

    fn write_row(&mut self, cells: &[String]) -> Result<(), SinkError> {
        let record = self.format_record(cells);
        self.write_bytes(record.as_bytes())?;
        self.rows_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        match &mut self.destination {
            Destination::File { writer, .. } => {
                if let Some(mut writer) = writer.take() {
                    writer.flush()?;
                }
            }
            Destination::Memory { open, .. } => *open = false,
        }
        Ok(())
    }

    fn abort(&mut self) {
        self.rows_written = 0;
        match &mut self.destination {
            Destination::File { path, writer } => {
                writer.take();
                if path.exists() {
                    if let Err(err) = std::fs::remove_file(&*path) {
                        tracing::warn!(error = %err, path = ?path, "failed to remove aborted export file");
                    }
                }
            }
            Destination::Memory { buffer, open } => {
                buffer.clear();
                *open = false;
            }
        }
    }
}
