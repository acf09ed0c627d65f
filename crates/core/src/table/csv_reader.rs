//! CSV implementation of [`TableReader`].

use tracing::debug;

use super::traits::TableReader;
use super::types::{Column, ColumnKind, Table, TableError, Value};

/// Reads comma-separated input with a header row.
///
/// Empty fields are missing values. A column is typed as integer when every
/// present field parses as `i64`, as float when every present field parses
/// as `f64`, and as text otherwise.
#[derive(Debug, Clone)]
pub struct CsvReader {
    delimiter: u8,
}

impl CsvReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TableReader for CsvReader {
    fn read(&self, bytes: &[u8]) -> Result<Table, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| TableError::Parse(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.len() == 1 && headers[0].is_empty() {
            return Ok(Table::default());
        }

        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record.map_err(|e| TableError::Parse(e.to_string()))?;
            for (idx, field) in record.iter().enumerate() {
                raw[idx].push((!field.is_empty()).then(|| field.to_string()));
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw)
            .map(|(name, fields)| infer_column(name, fields))
            .collect();

        let table = Table::new(columns)?;
        let (rows, cols) = table.shape();
        debug!("Parsed CSV input: {} rows, {} columns", rows, cols);
        Ok(table)
    }

    fn format_name(&self) -> &'static str {
        "csv"
    }
}

fn infer_column(name: String, fields: Vec<Option<String>>) -> Column {
    let present = || fields.iter().flatten();

    let kind = if present().next().is_none() {
        ColumnKind::Null
    } else if present().all(|f| f.parse::<i64>().is_ok()) {
        ColumnKind::Int
    } else if present().all(|f| f.parse::<f64>().is_ok()) {
        ColumnKind::Float
    } else {
        ColumnKind::Text
    };

    let values = fields
        .into_iter()
        .map(|field| match (field, kind) {
            (None, _) => Value::Null,
            (Some(f), ColumnKind::Int) => f.parse().map(Value::Int).unwrap_or(Value::Null),
            (Some(f), ColumnKind::Float) => f.parse().map(Value::Float).unwrap_or(Value::Null),
            (Some(f), _) => Value::Text(f),
        })
        .collect();

    Column::new(name, kind, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TabularData;

    #[test]
    fn test_read_infers_types() {
        let csv = "id,score,name\n1,2.5,ann\n2,3,bob\n";
        let table = CsvReader::new().read(csv.as_bytes()).unwrap();

        assert_eq!(table.shape(), (2, 3));
        assert_eq!(table.column_kind("id").unwrap(), ColumnKind::Int);
        assert_eq!(table.column_kind("score").unwrap(), ColumnKind::Float);
        assert_eq!(table.column_kind("name").unwrap(), ColumnKind::Text);
        assert_eq!(table.column("score").unwrap().values[1], Value::Float(3.0));
    }

    #[test]
    fn test_read_empty_fields_are_null() {
        let csv = "a,b,c\n1,,\n1,,\n2,5,\n";
        let table = CsvReader::new().read(csv.as_bytes()).unwrap();

        assert_eq!(table.null_count("b").unwrap(), 2);
        assert_eq!(table.column_kind("b").unwrap(), ColumnKind::Int);
        assert_eq!(table.column_kind("c").unwrap(), ColumnKind::Null);
        assert_eq!(table.null_count("c").unwrap(), 3);
    }

    #[test]
    fn test_read_header_only_has_zero_rows() {
        let table = CsvReader::new().read(b"a,b\n").unwrap();
        assert_eq!(table.shape(), (0, 2));
    }

    #[test]
    fn test_read_empty_input_has_no_columns() {
        let table = CsvReader::new().read(b"").unwrap();
        assert_eq!(table.shape(), (0, 0));
    }

    #[test]
    fn test_read_ragged_row_fails() {
        let result = CsvReader::new().read(b"a,b\n1,2\n3\n");
        assert!(matches!(result, Err(TableError::Parse(_))));
    }

    #[test]
    fn test_read_duplicate_header_fails() {
        let result = CsvReader::new().read(b"a,b,a\n1,2,\n3,4,\n");
        match result {
            Err(TableError::Parse(message)) => assert!(message.contains("duplicate column name: a")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_read_custom_delimiter() {
        let table = CsvReader::new()
            .with_delimiter(b';')
            .read(b"a;b\n1;x\n")
            .unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
    }
}
