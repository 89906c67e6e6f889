//! Column exclusion.

use crate::table::Table;

/// Names from `excluded` that are present in `table`, in table order.
pub fn dropped_columns<'a>(table: &'a Table, excluded: &[String]) -> Vec<&'a str> {
    table
        .headers()
        .into_iter()
        .filter(|name| excluded.iter().any(|e| e == name))
        .collect()
}

/// Return `table` without the `excluded` columns.
///
/// Names that are not in the table are ignored, so the operation is
/// idempotent and the order of `excluded` does not matter.
pub fn exclude_columns(table: &Table, excluded: &[String]) -> Table {
    let columns = table
        .columns()
        .iter()
        .filter(|c| !excluded.contains(&c.name))
        .cloned()
        .collect();

    Table::new(table.row_count(), columns)
}
