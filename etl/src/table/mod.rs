//! In-memory table model shared by every pipeline stage.
//!
//! A [`Table`] is an ordered list of named [`Column`]s of equal length.
//! Stages never mutate a table in place: each one takes `&Table` and
//! returns a new value.
//!
//! - [`Values::Text`] - raw cell text as read from the input
//! - [`Values::Numeric`] - parsed reals, `None` being the missing marker
//! - [`Values::Indicator`] - generated 0/1 columns

use serde::{Deserialize, Serialize};

// =============================================================================
// Column values
// =============================================================================

/// Typed cell storage for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum Values {
    Text(Vec<String>),
    /// `None` marks a missing value, distinct from `0.0`.
    Numeric(Vec<Option<f64>>),
    Indicator(Vec<u8>),
}

impl Values {
    pub fn len(&self) -> usize {
        match self {
            Values::Text(v) => v.len(),
            Values::Numeric(v) => v.len(),
            Values::Indicator(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable kind name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Values::Text(_) => "text",
            Values::Numeric(_) => "numeric",
            Values::Indicator(_) => "an indicator",
        }
    }

    /// Number of cells holding no value: empty text or a missing marker.
    pub fn missing_count(&self) -> usize {
        match self {
            Values::Text(v) => v.iter().filter(|s| s.is_empty()).count(),
            Values::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            Values::Indicator(_) => 0,
        }
    }

    /// Render one cell as output text.
    pub fn render(&self, row: usize) -> String {
        match self {
            Values::Text(v) => v[row].clone(),
            Values::Numeric(v) => v[row].map(format_number).unwrap_or_default(),
            Values::Indicator(v) => v[row].to_string(),
        }
    }
}

/// Shortest representation that parses back to the same `f64`.
///
/// Magnitudes of `1e16` and above, or below `1e-5`, use exponent notation
/// (`1e300`, `2.5e-7`); `Display` would spell out every digit.
pub fn format_number(value: f64) -> String {
    // -0.0 would otherwise print as "-0"
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if magnitude >= 1e16 || magnitude < 1e-5 {
        format!("{:e}", value)
    } else {
        value.to_string()
    }
}

// =============================================================================
// Column
// =============================================================================

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Values,
}

impl Column {
    pub fn text(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values: Values::Text(values),
        }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values: Values::Numeric(values),
        }
    }

    pub fn indicator(name: impl Into<String>, values: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            values: Values::Indicator(values),
        }
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match &self.values {
            Values::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.values {
            Values::Numeric(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_indicator(&self) -> Option<&[u8]> {
        match &self.values {
            Values::Indicator(v) => Some(v),
            _ => None,
        }
    }

    /// Same values under a new name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: self.values.clone(),
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// Column-oriented table with a fixed row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    row_count: usize,
    columns: Vec<Column>,
}

impl Table {
    /// Build a table from columns that all hold `row_count` cells.
    ///
    /// The row count is carried separately so a table keeps its rows
    /// even when every column has been removed.
    pub fn new(row_count: usize, columns: Vec<Column>) -> Self {
        debug_assert!(
            columns.iter().all(|c| c.values.len() == row_count),
            "every column must hold {} cells",
            row_count
        );
        Self { row_count, columns }
    }

    /// Build a text table from a header and row-major records.
    ///
    /// Every record must have one field per header entry.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let row_count = rows.len();
        let mut cells: Vec<Vec<String>> = headers
            .iter()
            .map(|_| Vec::with_capacity(row_count))
            .collect();

        for row in rows {
            for (i, value) in row.into_iter().enumerate() {
                cells[i].push(value);
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column::text(name, values))
            .collect();

        Self::new(row_count, columns)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`, as reported in stage notices.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count, self.columns.len())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Render row `row` as output text, one string per column.
    pub fn render_row(&self, row: usize) -> Vec<String> {
        self.columns.iter().map(|c| c.values.render(row)).collect()
    }
}
