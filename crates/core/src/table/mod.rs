//! In-memory tabular data used by the cleaning pipeline.
//!
//! The pipeline only talks to a table through the [`TabularData`] trait;
//! [`Table`] is the column-major implementation produced by [`CsvReader`].

mod csv_reader;
mod traits;
mod types;

pub use csv_reader::CsvReader;
pub use traits::{TableReader, TabularData};
pub use types::{Column, ColumnKind, Table, TableError, Value};
