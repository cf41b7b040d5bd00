//! Column specifications and cell transforms
//!
//! Every exported cell goes through exactly one transform, chosen by
//! precedence: the generic value formatting, overridden by the column's
//! display formatter, overridden by an explicit per-target transform.

use std::collections::HashMap;
use std::sync::Arc;

use gridline_core::{Row, Value};

/// Which family of sink a transform targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    /// Line-oriented delimited text (CSV and friends)
    Delimited,
    /// In-memory workbook
    Workbook,
    /// Print view via a document writer
    Print,
    /// Paginated document via a document writer
    Document,
}

/// A cell transform: value plus its whole row, to allow derived cells
pub type CellFormatter = Arc<dyn Fn(&Value, &Row) -> String + Send + Sync>;

/// One exported column: where the value comes from and how it is rendered
#[derive(Clone)]
pub struct ColumnSpec {
    /// Row field this column reads
    pub key: String,
    /// Header label
    pub header: String,
    display: Option<CellFormatter>,
    overrides: HashMap<SinkKind, CellFormatter>,
}

impl ColumnSpec {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            header: key.clone(),
            key,
            display: None,
            overrides: HashMap::new(),
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Reuse the render-for-display formatter as the cell text
    pub fn with_display(
        mut self,
        formatter: impl Fn(&Value, &Row) -> String + Send + Sync + 'static,
    ) -> Self {
        self.display = Some(Arc::new(formatter));
        self
    }

    /// Explicit transform for one sink kind; takes precedence over the
    /// display formatter and the generic value string.
    pub fn with_override(
        mut self,
        kind: SinkKind,
        formatter: impl Fn(&Value, &Row) -> String + Send + Sync + 'static,
    ) -> Self {
        self.overrides.insert(kind, Arc::new(formatter));
        self
    }

    /// Render one cell for the given sink kind.
    pub fn cell(&self, row: &Row, kind: SinkKind) -> String {
        let value = row.get(&self.key).unwrap_or(&Value::Null);
        if let Some(formatter) = self.overrides.get(&kind) {
            return formatter(value, row);
        }
        if let Some(formatter) = &self.display {
            return formatter(value, row);
        }
        value.to_string()
    }
}

impl std::fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("has_display", &self.display.is_some())
            .field("override_kinds", &self.overrides.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Header labels in column order
pub fn render_headers(columns: &[ColumnSpec]) -> Vec<String> {
    columns.iter().map(|c| c.header.clone()).collect()
}

/// One row rendered to cells, in column order
pub fn render_row(columns: &[ColumnSpec], row: &Row, kind: SinkKind) -> Vec<String> {
    columns.iter().map(|c| c.cell(row, kind)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row() -> Row {
        Row::from_fields(vec![
            ("id".to_string(), Value::Int(7)),
            ("price".to_string(), Value::Float(12.5)),
            ("name".to_string(), Value::String("Widget".to_string())),
        ])
    }

    #[test]
    fn generic_transform_is_the_value_string() {
        let spec = ColumnSpec::new("price");
        assert_eq!(spec.cell(&row(), SinkKind::Delimited), "12.5");
    }

    #[test]
    fn display_formatter_overrides_generic() {
        let spec = ColumnSpec::new("price").with_display(|v, _| format!("${}", v));
        assert_eq!(spec.cell(&row(), SinkKind::Delimited), "$12.5");
        assert_eq!(spec.cell(&row(), SinkKind::Workbook), "$12.5");
    }

    #[test]
    fn target_override_wins_over_display() {
        let spec = ColumnSpec::new("price")
            .with_display(|v, _| format!("${}", v))
            .with_override(SinkKind::Delimited, |v, _| format!("{:.2}", v.as_f64().unwrap_or(0.0)));

        assert_eq!(spec.cell(&row(), SinkKind::Delimited), "12.50");
        // other targets still use the display formatter
        assert_eq!(spec.cell(&row(), SinkKind::Print), "$12.5");
    }

    #[test]
    fn missing_field_renders_as_null() {
        let spec = ColumnSpec::new("absent");
        assert_eq!(spec.cell(&row(), SinkKind::Delimited), "");
    }

    #[test]
    fn formatter_sees_the_whole_row() {
        let spec =
            ColumnSpec::new("name").with_display(|v, row| {
                format!("{} (#{})", v, row.get("id").unwrap_or(&Value::Null))
            });
        assert_eq!(spec.cell(&row(), SinkKind::Workbook), "Widget (#7)");
    }

    #[test]
    fn render_row_in_column_order() {
        let columns = vec![
            ColumnSpec::new("name").with_header("Name"),
            ColumnSpec::new("price").with_header("Price"),
        ];
        assert_eq!(render_headers(&columns), vec!["Name", "Price"]);
        assert_eq!(
            render_row(&columns, &row(), SinkKind::Delimited),
            vec!["Widget", "12.5"]
        );
    }
}
