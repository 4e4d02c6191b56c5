use crate::cell::CellValue;
use crate::error::ShapeError;
use serde::{Deserialize, Serialize};

/// An ordered sequence of rows sharing one ordered list of column names.
///
/// Every row holds exactly `columns.len()` values, in column order. The
/// constructors enforce this, so code holding a `Table` can index rows by
/// column position without re-checking widths.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Create an empty table with the given header.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Table {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create a table from a header and its rows, checking every row's width.
    ///
    /// # Examples
    /// ```
    /// use review_sheet::cell::CellValue;
    /// use review_sheet::table::Table;
    ///
    /// let table = Table::from_rows(
    ///     ["id", "amount"],
    ///     vec![vec![CellValue::Int(1), CellValue::Float(9.5)]],
    /// ).unwrap();
    /// assert_eq!(table.row_count(), 1);
    ///
    /// assert!(Table::from_rows(["id", "amount"], vec![vec![CellValue::Int(1)]]).is_err());
    /// ```
    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<Self, ShapeError> {
        let mut table = Table::new(columns);
        table.rows.reserve(rows.len());
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append a row, rejecting it if its width differs from the header.
    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<(), ShapeError> {
        if row.len() != self.columns.len() {
            return Err(ShapeError {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<CellValue>>) {
        (self.columns, self.rows)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Look up a cell by row position and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }
}
