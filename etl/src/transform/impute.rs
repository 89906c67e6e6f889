//! Missing-value imputation.
//!
//! Numeric columns fill their missing markers with a per-column statistic
//! computed from the non-missing values only. Categorical columns fill empty
//! cells with their most frequent label. A column with nothing to compute a
//! statistic from is a fatal error: it is never silently filled with zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::scale::mean;
use crate::error::{TransformError, TransformResult};
use crate::table::{Column, Table};

/// Statistic used to fill numeric missing markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericStrategy {
    /// Mean of the non-missing values
    #[default]
    Mean,
    /// Median of the non-missing values
    Median,
}

/// Handling of empty cells in categorical columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalStrategy {
    /// Fill with the most frequent non-empty label (ties: smallest label)
    #[default]
    MostFrequent,
    /// Keep the empty string as a label of its own
    AsLabel,
}

/// Fitted fill value for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericFill {
    pub column: String,
    pub value: f64,
    /// Missing cells seen at fit time
    pub missing: usize,
}

/// Fitted fill value for one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalFill {
    pub column: String,
    /// `None` when empty cells are kept as a label
    pub value: Option<String>,
    /// Empty cells seen at fit time
    pub missing: usize,
}

/// Per-column imputer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Imputer {
    numeric_strategy: NumericStrategy,
    categorical_strategy: CategoricalStrategy,
    numeric: Vec<NumericFill>,
    categorical: Vec<CategoricalFill>,
    is_fitted: bool,
}

impl Imputer {
    /// Create a new imputer
    pub fn new(numeric_strategy: NumericStrategy, categorical_strategy: CategoricalStrategy) -> Self {
        Self {
            numeric_strategy,
            categorical_strategy,
            numeric: Vec::new(),
            categorical: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn fill values. Listed columns absent from `table` are skipped.
    pub fn fit(
        &mut self,
        table: &Table,
        numeric: &[String],
        categorical: &[String],
    ) -> TransformResult<&mut Self> {
        self.numeric.clear();
        self.categorical.clear();

        for name in numeric {
            let Some(column) = table.column(name) else {
                continue;
            };
            let cells = column.as_numeric().ok_or_else(|| TransformError::WrongKind {
                column: name.clone(),
                expected: "numeric",
            })?;

            let mut observed: Vec<f64> = cells.iter().flatten().copied().collect();
            if observed.is_empty() {
                return Err(TransformError::AllValuesMissing {
                    column: name.clone(),
                });
            }

            let value = match self.numeric_strategy {
                NumericStrategy::Mean => mean(&observed),
                NumericStrategy::Median => median(&mut observed),
            };
            if !value.is_finite() {
                return Err(TransformError::NonFinite {
                    column: name.clone(),
                });
            }

            self.numeric.push(NumericFill {
                column: name.clone(),
                value,
                missing: cells.len() - observed.len(),
            });
        }

        for name in categorical {
            let Some(column) = table.column(name) else {
                continue;
            };
            let cells = column.as_text().ok_or_else(|| TransformError::WrongKind {
                column: name.clone(),
                expected: "text",
            })?;

            let missing = cells.iter().filter(|s| s.is_empty()).count();
            let value = match self.categorical_strategy {
                CategoricalStrategy::AsLabel => None,
                CategoricalStrategy::MostFrequent => {
                    let label = most_frequent(cells).ok_or_else(|| {
                        TransformError::AllValuesMissing {
                            column: name.clone(),
                        }
                    })?;
                    Some(label.to_string())
                }
            };

            self.categorical.push(CategoricalFill {
                column: name.clone(),
                value,
                missing,
            });
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace missing cells with the fitted values.
    ///
    /// Every fitted column must be present in `table`.
    pub fn transform(&self, table: &Table) -> TransformResult<Table> {
        if !self.is_fitted {
            return Err(TransformError::NotFitted("imputer"));
        }

        for name in self.fitted_columns() {
            if !table.contains(name) {
                return Err(TransformError::MissingColumn(name.to_string()));
            }
        }

        let columns = table
            .columns()
            .iter()
            .map(|column| self.impute_column(column))
            .collect::<TransformResult<Vec<_>>>()?;

        Ok(Table::new(table.row_count(), columns))
    }

    /// Fit and transform in one step
    pub fn fit_transform(
        &mut self,
        table: &Table,
        numeric: &[String],
        categorical: &[String],
    ) -> TransformResult<Table> {
        self.fit(table, numeric, categorical)?;
        self.transform(table)
    }

    pub fn numeric_fills(&self) -> &[NumericFill] {
        &self.numeric
    }

    pub fn categorical_fills(&self) -> &[CategoricalFill] {
        &self.categorical
    }

    fn fitted_columns(&self) -> impl Iterator<Item = &str> {
        self.numeric
            .iter()
            .map(|f| f.column.as_str())
            .chain(self.categorical.iter().map(|f| f.column.as_str()))
    }

    fn impute_column(&self, column: &Column) -> TransformResult<Column> {
        if let Some(fill) = self.numeric.iter().find(|f| f.column == column.name) {
            let cells = column.as_numeric().ok_or_else(|| TransformError::WrongKind {
                column: column.name.clone(),
                expected: "numeric",
            })?;
            return Ok(Column::numeric(
                column.name.clone(),
                cells.iter().map(|v| Some(v.unwrap_or(fill.value))).collect(),
            ));
        }

        if let Some(fill) = self.categorical.iter().find(|f| f.column == column.name) {
            let cells = column.as_text().ok_or_else(|| TransformError::WrongKind {
                column: column.name.clone(),
                expected: "text",
            })?;
            let Some(ref value) = fill.value else {
                return Ok(column.clone());
            };
            return Ok(Column::text(
                column.name.clone(),
                cells
                    .iter()
                    .map(|s| if s.is_empty() { value.clone() } else { s.clone() })
                    .collect(),
            ));
        }

        Ok(column.clone())
    }
}


fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        // Halving first keeps the sum of two values near f64::MAX finite
        values[mid - 1] / 2.0 + values[mid] / 2.0
    } else {
        values[mid]
    }
}

/// Most frequent non-empty label; ties go to the lexicographically smallest.
fn most_frequent(cells: &[String]) -> Option<&str> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for cell in cells.iter().filter(|s| !s.is_empty()) {
        *counts.entry(cell.as_str()).or_default() += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}
