//! Table traits.

use std::collections::HashSet;

use super::types::{ColumnKind, Table, TableError, Value};

/// The operations the cleaning pipeline needs from a table.
pub trait TabularData: Send + Sync {
    /// Number of rows.
    fn row_count(&self) -> usize;

    /// Column names in table order.
    fn column_names(&self) -> Vec<String>;

    /// Inferred kind of a column.
    fn column_kind(&self, column: &str) -> Result<ColumnKind, TableError>;

    /// Number of missing values in a column.
    fn null_count(&self, column: &str) -> Result<usize, TableError>;

    /// Median of the non-missing values, `None` for non-numeric or empty columns.
    fn median(&self, column: &str) -> Result<Option<f64>, TableError>;

    /// Number of distinct non-missing values.
    fn distinct_count(&self, column: &str) -> Result<usize, TableError>;

    /// Remove the named columns.
    fn drop_columns(&mut self, columns: &[String]) -> Result<(), TableError>;

    /// Remove rows equal to an earlier row, keeping first occurrences in order.
    /// Returns the number of rows removed.
    fn drop_duplicate_rows(&mut self) -> usize;

    /// Replace every missing value in a column with `value`.
    fn fill_null(&mut self, column: &str, value: Value) -> Result<(), TableError>;
}

/// Decodes raw upload bytes into a [`Table`].
pub trait TableReader: Send + Sync {
    fn read(&self, bytes: &[u8]) -> Result<Table, TableError>;

    /// Name of the input format, used in logs.
    fn format_name(&self) -> &'static str;
}

impl TabularData for Table {
    fn row_count(&self) -> usize {
        self.shape().0
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    fn column_kind(&self, column: &str) -> Result<ColumnKind, TableError> {
        self.column(column)
            .map(|c| c.kind)
            .ok_or_else(|| TableError::UnknownColumn(column.to_string()))
    }

    fn null_count(&self, column: &str) -> Result<usize, TableError> {
        self.column(column)
            .map(|c| c.null_count())
            .ok_or_else(|| TableError::UnknownColumn(column.to_string()))
    }

    fn median(&self, column: &str) -> Result<Option<f64>, TableError> {
        self.column(column)
            .map(|c| c.median())
            .ok_or_else(|| TableError::UnknownColumn(column.to_string()))
    }

    fn distinct_count(&self, column: &str) -> Result<usize, TableError> {
        self.column(column)
            .map(|c| c.distinct_count())
            .ok_or_else(|| TableError::UnknownColumn(column.to_string()))
    }

    fn drop_columns(&mut self, columns: &[String]) -> Result<(), TableError> {
        if let Some(missing) = columns.iter().find(|name| self.column(name).is_none()) {
            return Err(TableError::UnknownColumn(missing.clone()));
        }
        self.columns.retain(|c| !columns.contains(&c.name));
        Ok(())
    }

    fn drop_duplicate_rows(&mut self) -> usize {
        let rows = self.row_count();
        let mut seen: HashSet<Vec<&Value>> = HashSet::with_capacity(rows);
        let mut keep = Vec::with_capacity(rows);
        for row in 0..rows {
            let key: Vec<&Value> = self.columns.iter().map(|c| &c.values[row]).collect();
            keep.push(seen.insert(key));
        }

        drop(seen);

        let removed = keep.iter().filter(|k| !**k).count();
        if removed == 0 {
            return 0;
        }

        for column in &mut self.columns {
            let mut flags = keep.iter();
            column.values.retain(|_| *flags.next().unwrap_or(&true));
        }
        removed
    }

    fn fill_null(&mut self, column: &str, value: Value) -> Result<(), TableError> {
        let col = self.column_mut(column)?;

        let kind = match (col.kind, &value) {
            (_, Value::Null) => return Ok(()),
            (ColumnKind::Int, Value::Int(_)) => ColumnKind::Int,
            (ColumnKind::Int, Value::Float(f)) if f.fract() == 0.0 && f.is_finite() => {
                return fill_values(col, Value::Int(*f as i64));
            }
            // A non-integral median promotes an integer column.
            (ColumnKind::Int, Value::Float(_)) => {
                for v in col.values.iter_mut() {
                    if let Value::Int(i) = v {
                        *v = Value::Float(*i as f64);
                    }
                }
                ColumnKind::Float
            }
            (ColumnKind::Float, Value::Float(_)) => ColumnKind::Float,
            (ColumnKind::Float, Value::Int(i)) => {
                return fill_values(col, Value::Float(*i as f64));
            }
            (ColumnKind::Text | ColumnKind::Null, Value::Text(_)) => ColumnKind::Text,
            (kind, value) => {
                return Err(TableError::TypeMismatch {
                    column: column.to_string(),
                    kind,
                    value: format!("{:?}", value),
                })
            }
        };

        col.kind = kind;
        fill_values(col, value)
    }
}

fn fill_values(col: &mut super::types::Column, value: Value) -> Result<(), TableError> {
    for v in col.values.iter_mut().filter(|v| v.is_null()) {
        *v = value.clone();
    }
    Ok(())
}
