//! In-memory workbook sink
//!
//! Accumulates the export as a structured tabular document that a
//! spreadsheet writer (or a JSON consumer) can serialize afterwards. Kept
//! in memory deliberately: the pipeline's record ceiling bounds the size.

use serde::{Deserialize, Serialize};

use crate::sink::{RowSink, SinkError};
use crate::transform::SinkKind;

/// One sheet of tabular data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A workbook of one or more sheets
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(Sheet::row_count).sum()
    }

    /// Serialize the workbook to pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Sink accumulating one sheet in memory
pub struct WorkbookSink {
    sheet_name: String,
    sheet: Option<Sheet>,
    finished: Option<Workbook>,
}

impl WorkbookSink {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            sheet: None,
            finished: None,
        }
    }

    /// The sealed workbook; `None` until a successful `finish`
    pub fn into_workbook(self) -> Option<Workbook> {
        self.finished
    }
}

impl RowSink for WorkbookSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Workbook
    }

    fn begin(&mut self, headers: &[String]) -> Result<(), SinkError> {
        let mut sheet = Sheet::new(self.sheet_name.clone());
        sheet.headers = headers.to_vec();
        self.sheet = Some(sheet);
        self.finished = None;
        Ok(())
    }

    fn write_row(&mut self, cells: &[String]) -> Result<(), SinkError> {
        match &mut self.sheet {
            Some(sheet) => {
                sheet.rows.push(cells.to_vec());
                Ok(())
            }
            None => Err(SinkError::Writer("sink not begun".to_string())),
        }
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        match self.sheet.take() {
            Some(sheet) => {
                self.finished = Some(Workbook {
                    sheets: vec![sheet],
                });
                Ok(())
            }
            None => Err(SinkError::Writer("sink not begun".to_string())),
        }
    }

    fn abort(&mut self) {
        self.sheet = None;
        self.finished = None;
    }
}
