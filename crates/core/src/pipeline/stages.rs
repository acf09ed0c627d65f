//! Individual cleaning stages.
//!
//! Stages are stateless and only use the [`TabularData`] surface.

use tracing::debug;

use crate::table::{TableError, TabularData, Value};

/// Fill value for missing non-numeric cells.
pub const FILL_SENTINEL: &str = "Unknown";

/// A target candidate has fewer distinct values than this (and more than one).
pub const TARGET_MAX_DISTINCT: usize = 20;

/// Remove columns whose values are all missing. Returns the removed names.
pub fn drop_empty_columns<T: TabularData>(table: &mut T) -> Result<Vec<String>, TableError> {
    let rows = table.row_count();
    let mut empty = Vec::new();
    for name in table.column_names() {
        if table.null_count(&name)? == rows {
            empty.push(name);
        }
    }
    if !empty.is_empty() {
        table.drop_columns(&empty)?;
    }
    Ok(empty)
}

/// Remove rows equal to an earlier row. Returns the number removed.
pub fn drop_duplicate_rows<T: TabularData>(table: &mut T) -> usize {
    table.drop_duplicate_rows()
}

/// Fill missing values column by column. Returns the names of filled columns.
///
/// Numeric columns get the median of their present values; every other
/// column gets [`FILL_SENTINEL`].
pub fn fill_missing_values<T: TabularData>(table: &mut T) -> Result<Vec<String>, TableError> {
    let mut filled = Vec::new();
    for name in table.column_names() {
        if table.null_count(&name)? == 0 {
            continue;
        }
        let value = if table.column_kind(&name)?.is_numeric() {
            match table.median(&name)? {
                Some(median) => Value::Float(median),
                None => continue,
            }
        } else {
            Value::Text(FILL_SENTINEL.to_string())
        };
        debug!("Filling missing values in column {} with {:?}", name, value);
        table.fill_null(&name, value)?;
        filled.push(name);
    }
    Ok(filled)
}

/// Columns with more than one and fewer than [`TARGET_MAX_DISTINCT`]
/// distinct present values. Columns that cannot be analyzed are skipped.
pub fn target_candidates<T: TabularData>(table: &T) -> Vec<String> {
    table
        .column_names()
        .into_iter()
        .filter(|name| match table.distinct_count(name) {
            Ok(distinct) => distinct > 1 && distinct < TARGET_MAX_DISTINCT,
            Err(e) => {
                debug!("Skipping column {} for target analysis: {}", name, e);
                false
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, ColumnKind, Table};

    fn gappy_table() -> Table {
        Table::new(vec![
            Column::new(
                "a",
                ColumnKind::Int,
                vec![Value::Int(1), Value::Int(1), Value::Int(2)],
            ),
            Column::new(
                "b",
                ColumnKind::Int,
                vec![Value::Null, Value::Null, Value::Int(5)],
            ),
            Column::new(
                "c",
                ColumnKind::Null,
                vec![Value::Null, Value::Null, Value::Null],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_drop_empty_columns() {
        let mut table = gappy_table();
        let removed = drop_empty_columns(&mut table).unwrap();
        assert_eq!(removed, vec!["c"]);
        assert_eq!(table.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_stages_drop_dedup_and_fill() {
        let mut table = gappy_table();
        drop_empty_columns(&mut table).unwrap();
        assert_eq!(drop_duplicate_rows(&mut table), 1);

        let filled = fill_missing_values(&mut table).unwrap();
        assert_eq!(filled, vec!["b"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.column("b").unwrap().values,
            vec![Value::Int(5), Value::Int(5)]
        );
    }

    #[test]
    fn test_fill_text_with_sentinel() {
        let mut table = Table::new(vec![Column::new(
            "city",
            ColumnKind::Text,
            vec![Value::Text("Rome".into()), Value::Null],
        )])
        .unwrap();
        fill_missing_values(&mut table).unwrap();
        assert_eq!(
            table.column("city").unwrap().values[1],
            Value::Text(FILL_SENTINEL.into())
        );
    }

    #[test]
    fn test_target_candidates_bounds() {
        let rows = 50;
        let binary = (0..rows).map(|i| Value::Int(i % 2)).collect();
        let constant = (0..rows).map(|_| Value::Int(7)).collect();
        let wide = (0..rows).map(|i| Value::Int(i % 25)).collect();
        let nineteen = (0..rows).map(|i| Value::Int(i % 19)).collect();
        let twenty = (0..rows).map(|i| Value::Int(i % 20)).collect();

        let table = Table::new(vec![
            Column::new("binary", ColumnKind::Int, binary),
            Column::new("constant", ColumnKind::Int, constant),
            Column::new("wide", ColumnKind::Int, wide),
            Column::new("nineteen", ColumnKind::Int, nineteen),
            Column::new("twenty", ColumnKind::Int, twenty),
        ])
        .unwrap();

        assert_eq!(target_candidates(&table), vec!["binary", "nineteen"]);
    }
}
