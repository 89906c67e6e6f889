//! Numeric normalization: formatted text to reals with a missing marker.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{TransformError, TransformResult};
use crate::table::{Column, Table};

/// Whitespace, thousands separators and currency symbols.
static FORMATTING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s,$€£¥]").expect("formatting pattern is a valid regex"));

/// Parse a formatted cell such as `$140,546.86` or `(1,200.00)`.
///
/// Returns `None`, the missing marker, for empty cells, stray text and
/// non-finite values. This never fails: an unparseable cell is a
/// recoverable per-cell condition resolved later by imputation.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let cleaned = FORMATTING.replace_all(raw, "");

    // Accounting notation for negatives
    let (body, sign) = match cleaned
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (inner, -1.0),
        None => (&*cleaned, 1.0),
    };

    if body.is_empty() {
        return None;
    }

    body.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| sign * v)
}

/// Convert each listed text column to a numeric column.
///
/// Listed columns absent from the table are skipped. A listed column that
/// is already numeric is kept as is.
pub fn normalize_numeric(table: &Table, numeric: &[String]) -> TransformResult<Table> {
    let columns = table
        .columns()
        .iter()
        .map(|column| {
            if !numeric.contains(&column.name) || column.as_numeric().is_some() {
                return Ok(column.clone());
            }
            let cells = column.as_text().ok_or_else(|| TransformError::WrongKind {
                column: column.name.clone(),
                expected: "text",
            })?;
            Ok(Column::numeric(
                column.name.clone(),
                cells.iter().map(|raw| parse_numeric(raw)).collect(),
            ))
        })
        .collect::<TransformResult<Vec<_>>>()?;

    Ok(Table::new(table.row_count(), columns))
}
