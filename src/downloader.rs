use crate::cell::CellValue;
use crate::error::ExportError;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Encodings offered for a flagged-row download.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            other => Err(format!("unsupported export format: {}", other)),
        }
    }
}

/// Encodes an export set into downloadable bytes.
pub trait Exporter {
    fn encode(
        &self,
        table: &Table,
        format: ExportFormat,
        sheet_name: &str,
    ) -> Result<Vec<u8>, ExportError>;
}

/// The stock exporter: csv crate for text, rust_xlsxwriter for workbooks.
#[derive(Debug, Default, Clone, Copy)]
pub struct SheetExporter;

impl Exporter for SheetExporter {
    fn encode(
        &self,
        table: &Table,
        format: ExportFormat,
        sheet_name: &str,
    ) -> Result<Vec<u8>, ExportError> {
        match format {
            ExportFormat::Csv => Ok(to_csv(table)?.into_bytes()),
            ExportFormat::Xlsx => to_xlsx(table, sheet_name),
        }
    }
}

/// Convert a table to CSV format
///
/// The header row holds the column names, followed by one line per row.
/// No index column is written. Fields containing commas, quotes or line
/// breaks are quoted.
///
/// CSV carries no types, so reading the output back infers them again. A text
/// cell that reads as a number or a boolean, such as `"00123"` or `"True"`
/// loaded from a workbook, comes back as `Int` or `Bool`.
///
/// # Examples
/// ```
/// use review_sheet::cell::CellValue;
/// use review_sheet::downloader::to_csv;
/// use review_sheet::table::Table;
///
/// let table = Table::from_rows(
///     ["payee", "amount"],
///     vec![vec![CellValue::from("Smith, J"), CellValue::Float(12.5)]],
/// ).unwrap();
/// assert_eq!(to_csv(&table).unwrap(), "payee,amount\n\"Smith, J\",12.5\n");
/// ```
pub fn to_csv(table: &Table) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|value| value.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Convert a table to XLSX format
///
/// Writes a workbook with a single worksheet named `sheet_name`: the header
/// row holds the column names and each table row follows on its own line.
/// Empty cells are left blank.
pub fn to_xlsx(table: &Table, sheet_name: &str) -> Result<Vec<u8>, ExportError> {
    use rust_xlsxwriter::Workbook;

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (c, name) in table.columns().iter().enumerate() {
        worksheet.write_string(0, c as u16, name)?;
    }

    for (r, row) in table.rows().iter().enumerate() {
        let xl_row = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            let xl_col = c as u16;
            match value {
                CellValue::Empty => {}
                CellValue::Bool(b) => {
                    worksheet.write_boolean(xl_row, xl_col, *b)?;
                }
                CellValue::Int(i) => {
                    worksheet.write_number(xl_row, xl_col, *i as f64)?;
                }
                CellValue::Float(f) => {
                    worksheet.write_number(xl_row, xl_col, *f)?;
                }
                CellValue::Text(s) => {
                    worksheet.write_string(xl_row, xl_col, s)?;
                }
            }
        }
    }

    let buffer = workbook.save_to_buffer()?;
    Ok(buffer)
}
