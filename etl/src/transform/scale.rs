//! Standard scaling (z-score): `(x - mean) / std`.
//!
//! Statistics are taken over the full column using the population standard
//! deviation. A degenerate column, one whose values are all identical, has
//! no usable scale: it is passed through unscaled rather than turned into
//! NaN or infinity. A statistic or scaled value that is still not finite is
//! a [`TransformError::NonFinite`] error.

use serde::{Deserialize, Serialize};

use crate::error::{TransformError, TransformResult};
use crate::table::{Column, Table};

/// Fitted parameters for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleParams {
    pub column: String,
    pub mean: f64,
    /// `None` for a degenerate column: scaling skipped
    pub std: Option<f64>,
}

impl ScaleParams {
    pub fn is_degenerate(&self) -> bool {
        self.std.is_none()
    }

    fn scale(&self, value: f64) -> f64 {
        match self.std {
            Some(std) => {
                let z = (value - self.mean) / std;
                // `value - mean` overflows for far-apart values of opposite sign
                if z.is_finite() {
                    z
                } else {
                    value / std - self.mean / std
                }
            }
            None => value,
        }
    }

    fn unscale(&self, value: f64) -> f64 {
        match self.std {
            Some(std) => value * std + self.mean,
            None => value,
        }
    }
}

/// Feature scaler
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scaler {
    params: Vec<ScaleParams>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new scaler
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the scaler to the listed numeric columns.
    ///
    /// Listed columns absent from `table` are skipped. Missing markers, if
    /// any are left, are ignored by the statistics.
    pub fn fit(&mut self, table: &Table, columns: &[String]) -> TransformResult<&mut Self> {
        self.params.clear();

        for name in columns {
            let Some(column) = table.column(name) else {
                continue;
            };
            let cells = column.as_numeric().ok_or_else(|| TransformError::WrongKind {
                column: name.clone(),
                expected: "numeric",
            })?;
            let observed: Vec<f64> = cells.iter().flatten().copied().collect();
            self.params.push(compute_params(name, &observed)?);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Scale every fitted column. All of them must be present in `table`.
    pub fn transform(&self, table: &Table) -> TransformResult<Table> {
        self.map_columns(table, ScaleParams::scale)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, table: &Table, columns: &[String]) -> TransformResult<Table> {
        self.fit(table, columns)?;
        self.transform(table)
    }

    /// Undo [`Scaler::transform`].
    pub fn inverse_transform(&self, table: &Table) -> TransformResult<Table> {
        self.map_columns(table, ScaleParams::unscale)
    }

    pub fn params(&self) -> &[ScaleParams] {
        &self.params
    }

    /// Columns passed through unscaled.
    pub fn degenerate_columns(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| p.is_degenerate())
            .map(|p| p.column.as_str())
            .collect()
    }

    fn map_columns(&self, table: &Table, f: fn(&ScaleParams, f64) -> f64) -> TransformResult<Table> {
        if !self.is_fitted {
            return Err(TransformError::NotFitted("scaler"));
        }

        for params in &self.params {
            if !table.contains(&params.column) {
                return Err(TransformError::MissingColumn(params.column.clone()));
            }
        }

        let columns = table
            .columns()
            .iter()
            .map(|column| {
                let Some(params) = self.params.iter().find(|p| p.column == column.name) else {
                    return Ok(column.clone());
                };
                let cells = column.as_numeric().ok_or_else(|| TransformError::WrongKind {
                    column: column.name.clone(),
                    expected: "numeric",
                })?;
                let values: Vec<Option<f64>> =
                    cells.iter().map(|v| v.map(|x| f(params, x))).collect();
                if values.iter().flatten().any(|x| !x.is_finite()) {
                    return Err(TransformError::NonFinite {
                        column: column.name.clone(),
                    });
                }
                Ok(Column::numeric(column.name.clone(), values))
            })
            .collect::<TransformResult<Vec<_>>>()?;

        Ok(Table::new(table.row_count(), columns))
    }
}

/// Mean and population standard deviation of `values`.
///
/// Values are divided by a power of two close to their largest magnitude
/// before accumulating (Welford), so inputs near `f64::MAX` cannot overflow
/// the running sums. Dividing by a power of two is exact.
pub(crate) fn moments(values: &[f64]) -> (f64, f64) {
    let max_abs = values.iter().fold(0.0f64, |m, x| m.max(x.abs()));
    if values.is_empty() || max_abs == 0.0 || !max_abs.is_finite() {
        return (0.0, 0.0);
    }
    let exponent = max_abs.log2().floor().clamp(-1022.0, 1023.0) as i64;
    let scale = f64::from_bits(((exponent + 1023) as u64) << 52);

    let mut mean = 0.0;
    let mut m2 = 0.0;
    for (k, &x) in values.iter().enumerate() {
        let x = x / scale;
        let delta = x - mean;
        mean += delta / (k + 1) as f64;
        m2 += delta * (x - mean);
    }
    let variance = (m2 / values.len() as f64).max(0.0);

    (mean * scale, variance.sqrt() * scale)
}

/// Overflow-safe arithmetic mean.
pub(crate) fn mean(values: &[f64]) -> f64 {
    moments(values).0
}

fn compute_params(column: &str, values: &[f64]) -> TransformResult<ScaleParams> {
    if values.is_empty() {
        return Ok(ScaleParams {
            column: column.to_string(),
            mean: 0.0,
            std: None,
        });
    }

    let non_finite = || TransformError::NonFinite {
        column: column.to_string(),
    };
    if values.iter().any(|x| !x.is_finite()) {
        return Err(non_finite());
    }

    let (mean, std) = moments(values);
    if !mean.is_finite() || !std.is_finite() {
        return Err(non_finite());
    }

    // Identical values can still leave rounding noise in `std`
    let identical = values.iter().all(|&x| x == values[0]);
    let std = if identical || std == 0.0 { None } else { Some(std) };

    Ok(ScaleParams {
        column: column.to_string(),
        mean,
        std,
    })
}
