//! Types for the table module.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading or transforming a table.
#[derive(Debug, Error)]
pub enum TableError {
    /// The input could not be decoded as a table.
    #[error("failed to parse table: {0}")]
    Parse(String),

    /// A column name did not resolve.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// A fill value does not fit the column type.
    #[error("cannot fill column {column} of type {kind} with {value}")]
    TypeMismatch {
        column: String,
        kind: ColumnKind,
        value: String,
    },
}

/// A single cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

// Floats compare bitwise so that rows can be hashed for deduplication.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Int(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Text(v) => v.hash(state),
        }
    }
}

/// Inferred type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Int,
    Float,
    Text,
    /// Every value is missing, so no type could be inferred.
    Null,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Int | ColumnKind::Float)
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnKind::Int => "int64",
            ColumnKind::Float => "float64",
            ColumnKind::Text => "str",
            ColumnKind::Null => "null",
        };
        f.write_str(name)
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    pub fn distinct_count(&self) -> usize {
        self.values
            .iter()
            .filter(|v| !v.is_null())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Median of the non-missing numeric values.
    pub fn median(&self) -> Option<f64> {
        if !self.kind.is_numeric() {
            return None;
        }
        let mut nums: Vec<f64> = self.values.iter().filter_map(Value::as_f64).collect();
        if nums.is_empty() {
            return None;
        }
        nums.sort_by(|a, b| a.total_cmp(b));
        let mid = nums.len() / 2;
        if nums.len() % 2 == 0 {
            Some((nums[mid - 1] + nums[mid]) / 2.0)
        } else {
            Some(nums[mid])
        }
    }
}

/// Column-major table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    /// Build a table, checking that all columns have the same length and
    /// distinct names.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        // Columns are addressed by name, so a repeated name would hide one.
        let mut seen = HashSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.name.as_str())) {
            return Err(TableError::Parse(format!(
                "duplicate column name: {}",
                dup.name
            )));
        }
        if let Some(first) = columns.first() {
            let rows = first.values.len();
            if let Some(bad) = columns.iter().find(|c| c.values.len() != rows) {
                return Err(TableError::Parse(format!(
                    "column {} has {} values, expected {}",
                    bad.name,
                    bad.values.len(),
                    rows
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Result<&mut Column, TableError> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        let rows = self.columns.first().map_or(0, |c| c.values.len());
        (rows, self.columns.len())
    }

    /// First `n` values of every column, keyed by column name in column order.
    pub fn head(&self, n: usize) -> Vec<(String, Vec<Value>)> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.values.iter().take(n).cloned().collect()))
            .collect()
    }
}
