//! One-hot encoding of categorical columns.
//!
//! Each categorical column becomes one 0/1 indicator column per distinct
//! label seen at fit time. Labels are sorted by byte order, so the output
//! column order depends only on the input values.
//!
//! Indicator names are `[<prefix>__]<column>_<label>` where the label is
//! escaped (`\` as `\\`, `_` as `\_`), so two labels of the same column
//! never share a name. Column names are kept as written; a name produced
//! by two different columns (`A` + `_x` and `A_\` + `x`) is a
//! [`TransformError::ColumnCollision`], never a merge.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::assemble::ensure_unique_names;
use crate::error::{TransformError, TransformResult};
use crate::table::{Column, Table};

/// Escape a label for use in an indicator column name.
pub fn escape_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '_' => out.push_str("\\_"),
            c => out.push(c),
        }
    }
    out
}

/// Name of the indicator column for `label` in `column`.
pub fn indicator_name(prefix: Option<&str>, column: &str, label: &str) -> String {
    match prefix {
        Some(p) => format!("{}__{}_{}", p, column, escape_label(label)),
        None => format!("{}_{}", column, escape_label(label)),
    }
}

/// Sorted distinct labels of one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Levels {
    pub column: String,
    pub labels: Vec<String>,
}

/// One-hot encoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    prefix: Option<String>,
    levels: Vec<Levels>,
    is_fitted: bool,
}

impl OneHotEncoder {
    /// Create a new encoder; `prefix` is prepended to every indicator name.
    pub fn new(prefix: Option<String>) -> Self {
        Self {
            prefix,
            levels: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn the label set of each listed column.
    ///
    /// Listed columns absent from `table` are skipped.
    pub fn fit(&mut self, table: &Table, columns: &[String]) -> TransformResult<&mut Self> {
        self.levels.clear();

        for name in columns {
            let Some(column) = table.column(name) else {
                continue;
            };
            let cells = column.as_text().ok_or_else(|| TransformError::WrongKind {
                column: name.clone(),
                expected: "text",
            })?;

            let labels: BTreeSet<&str> = cells.iter().map(String::as_str).collect();
            self.levels.push(Levels {
                column: name.clone(),
                labels: labels.into_iter().map(str::to_string).collect(),
            });
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace each fitted column with its indicator columns, in place.
    ///
    /// Labels not seen at fit time yield a row of zeros.
    pub fn transform(&self, table: &Table) -> TransformResult<Table> {
        if !self.is_fitted {
            return Err(TransformError::NotFitted("encoder"));
        }

        for levels in &self.levels {
            if !table.contains(&levels.column) {
                return Err(TransformError::MissingColumn(levels.column.clone()));
            }
        }

        let mut columns = Vec::with_capacity(table.column_count() + self.indicator_count());
        for column in table.columns() {
            match self.levels.iter().find(|l| l.column == column.name) {
                Some(levels) => columns.extend(self.encode_column(column, levels)?),
                None => columns.push(column.clone()),
            }
        }

        let encoded = Table::new(table.row_count(), columns);
        ensure_unique_names(&encoded)?;
        Ok(encoded)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, table: &Table, columns: &[String]) -> TransformResult<Table> {
        self.fit(table, columns)?;
        self.transform(table)
    }

    pub fn levels(&self) -> &[Levels] {
        &self.levels
    }

    /// Total number of indicator columns produced.
    pub fn indicator_count(&self) -> usize {
        self.levels.iter().map(|l| l.labels.len()).sum()
    }

    /// Indicator names generated for `column`, in output order.
    pub fn indicator_names(&self, column: &str) -> Vec<String> {
        self.levels
            .iter()
            .filter(|l| l.column == column)
            .flat_map(|l| {
                l.labels
                    .iter()
                    .map(|label| indicator_name(self.prefix.as_deref(), &l.column, label))
            })
            .collect()
    }

    fn encode_column(&self, column: &Column, levels: &Levels) -> TransformResult<Vec<Column>> {
        let cells = column.as_text().ok_or_else(|| TransformError::WrongKind {
            column: column.name.clone(),
            expected: "text",
        })?;

        Ok(levels
            .labels
            .iter()
            .map(|label| {
                Column::indicator(
                    indicator_name(self.prefix.as_deref(), &levels.column, label),
                    cells.iter().map(|c| u8::from(c == label)).collect(),
                )
            })
            .collect())
    }
}
