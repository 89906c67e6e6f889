//! Assembly of the output table.
//!
//! Output layout, rows in input order:
//!
//! ```text
//! identifier | passthrough... | numeric... | indicators...
//! ```
//!
//! Passthrough and numeric columns keep their input order; indicator
//! columns follow their source column's input order, then sorted label
//! order. Columns with no role are left out.

use std::collections::HashSet;

use super::encode::OneHotEncoder;
use crate::error::{TransformError, TransformResult};
use crate::schema::Schema;
use crate::table::{Column, Table};

/// Assembled output table plus the columns that were left out.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub table: Table,
    /// Input columns with no role in the schema
    pub unassigned: Vec<String>,
}

/// Fail with [`TransformError::ColumnCollision`] on the first repeated name.
pub fn ensure_unique_names(table: &Table) -> TransformResult<()> {
    let mut seen = HashSet::with_capacity(table.column_count());
    for name in table.headers() {
        if !seen.insert(name) {
            return Err(TransformError::ColumnCollision(name.to_string()));
        }
    }
    Ok(())
}

/// Output name of a numeric column.
pub fn numeric_name(prefix: Option<&str>, column: &str) -> String {
    match prefix {
        Some(p) => format!("{}__{}", p, column),
        None => column.to_string(),
    }
}

/// Reorder the encoded table into the output layout.
pub fn assemble(table: &Table, schema: &Schema, encoder: &OneHotEncoder) -> TransformResult<Assembly> {
    let identifier = table
        .column(&schema.identifier)
        .ok_or_else(|| TransformError::MissingColumn(schema.identifier.clone()))?;

    let indicator_names: HashSet<String> = encoder
        .levels()
        .iter()
        .flat_map(|l| encoder.indicator_names(&l.column))
        .collect();

    let mut passthrough = Vec::new();
    let mut numeric = Vec::new();
    let mut indicators = Vec::new();
    let mut unassigned = Vec::new();

    for column in table.columns() {
        if column.name == schema.identifier {
            continue;
        }
        if schema.passthrough.contains(&column.name) {
            passthrough.push(column.clone());
        } else if schema.numeric.contains(&column.name) {
            numeric.push(column.renamed(numeric_name(
                schema.numeric_prefix.as_deref(),
                &column.name,
            )));
        } else if column.as_indicator().is_some() && indicator_names.contains(&column.name) {
            indicators.push(column.clone());
        } else {
            unassigned.push(column.name.clone());
        }
    }

    let mut columns: Vec<Column> =
        Vec::with_capacity(1 + passthrough.len() + numeric.len() + indicators.len());
    columns.push(identifier.clone());
    columns.extend(passthrough);
    columns.extend(numeric);
    columns.extend(indicators);

    let table = Table::new(table.row_count(), columns);
    ensure_unique_names(&table)?;

    Ok(Assembly { table, unassigned })
}
