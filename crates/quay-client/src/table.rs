use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value as Json;

use crate::error::{TableError, TableResult};
use crate::value::{coerce, TypeTag, Value};

/// Wire form of one table block:
/// `{"columns": [{"name": ..., "type": ...}], "data": [[...], ...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTable {
    pub columns: Vec<RawColumn>,
    #[serde(default)]
    pub data: Vec<Vec<Json>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: TypeTag,
}

/// One typed row; same length and type-aligned with the table schema.
pub type Row = Vec<Value>;

/// One named, schema'd set of rows returned by the service.
///
/// Every row's arity equals the schema length, and every cell either matches
/// its column's declared type or is null. Rows keep server-delivery order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Vec<ColumnSchema>,
    rows: Vec<Row>,
}

impl Table {
    /// Decodes one raw table block into a typed table.
    ///
    /// Fails fast at the first bad row; sibling tables in the same response
    /// are decoded independently of this one.
    pub fn decode(raw: &RawTable) -> TableResult<Table> {
        let mut schema = Vec::with_capacity(raw.columns.len());
        let mut seen = HashSet::new();
        for column in &raw.columns {
            let data_type = TypeTag::parse(&column.data_type).ok_or_else(|| {
                TableError::MalformedSchema(format!(
                    "column '{}' has unknown type '{}'",
                    column.name, column.data_type
                ))
            })?;
            if !seen.insert(column.name.clone()) {
                return Err(TableError::MalformedSchema(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
            schema.push(ColumnSchema {
                name: column.name.clone(),
                data_type,
            });
        }

        let mut rows = Vec::with_capacity(raw.data.len());
        for (row_index, raw_row) in raw.data.iter().enumerate() {
            if raw_row.len() != schema.len() {
                return Err(TableError::RowArityMismatch {
                    row: row_index,
                    expected: schema.len(),
                    actual: raw_row.len(),
                });
            }
            let mut row = Vec::with_capacity(schema.len());
            for (column_index, cell) in raw_row.iter().enumerate() {
                let value = coerce(cell, schema[column_index].data_type).map_err(|source| {
                    TableError::CellDecodeFailed {
                        row: row_index,
                        column: column_index,
                        source,
                    }
                })?;
                row.push(value);
            }
            rows.push(row);
        }

        Ok(Table { schema, rows })
    }

    pub fn schema(&self) -> &[ColumnSchema] {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_position(column).is_some()
    }

    /// Zero-based index of a column, or `None` if the table lacks it.
    pub fn column_position(&self, column: &str) -> Option<usize> {
        self.schema.iter().position(|c| c.name == column)
    }

    pub fn get_row(&self, position: usize) -> Option<&Row> {
        self.rows.get(position)
    }

    /// Value at a row position and column name.
    pub fn get_value(&self, position: usize, column: &str) -> Option<&Value> {
        let column = self.column_position(column)?;
        self.rows.get(position).map(|row| &row[column])
    }

    /// Keeps at most the first `n` rows.
    pub fn truncate(&mut self, n: usize) {
        self.rows.truncate(n);
    }

    /// Consumes the table, yielding its rows in order.
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub(crate) fn extend_rows(&mut self, rows: Vec<Row>) {
        self.rows.extend(rows);
    }
}
