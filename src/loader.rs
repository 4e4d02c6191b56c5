use crate::cell::CellValue;
use crate::error::ParseError;
use crate::table::Table;
use log::{debug, info};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

/// Turns uploaded file bytes into a [`Table`].
///
/// Implementations must not keep state between calls; a failed parse is
/// reported to the caller and never reaches a session.
pub trait Loader {
    fn parse(&self, bytes: &[u8], file_name: &str) -> Result<Table, ParseError>;
}

/// The stock loader: `.csv` through the csv crate, `.xlsx` through calamine.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl Loader for FileLoader {
    fn parse(&self, bytes: &[u8], file_name: &str) -> Result<Table, ParseError> {
        parse_upload(bytes, file_name)
    }
}

/// Detect file type from the file name and parse with the matching decoder
///
/// # Arguments
/// * `bytes` - Raw file contents
/// * `file_name` - Name of the uploaded file; only its extension is used
///
/// # Returns
/// * `Result<Table, ParseError>` - The parsed table or a user-facing error
///
/// # Examples
/// ```
/// use review_sheet::loader::parse_upload;
///
/// let table = parse_upload(b"id,amount\n1,10.5\n", "transactions.csv").unwrap();
/// assert_eq!(table.columns(), ["id", "amount"]);
///
/// assert!(parse_upload(b"", "transactions.pdf").is_err());
/// ```
pub fn parse_upload(bytes: &[u8], file_name: &str) -> Result<Table, ParseError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    let table = match extension.as_deref() {
        Some("csv") => from_csv(bytes),
        Some("xlsx") => from_xlsx(bytes),
        Some(ext) => Err(ParseError::UnsupportedExtension(ext.to_string())),
        None => Err(ParseError::MissingExtension),
    }?;

    info!(
        "parsed {} ({} rows x {} columns)",
        file_name,
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

/// Read a file from disk and parse it according to its extension.
pub fn load_file(filepath: impl AsRef<Path>) -> Result<Table, ParseError> {
    let path = filepath.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    parse_upload(&bytes, name)
}

/// Parse comma-separated text. The first record is the header.
///
/// Short rows are padded with empty cells; a row with more fields than the
/// header is rejected.
pub fn from_csv(bytes: &[u8]) -> Result<Table, ParseError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(ParseError::NoColumns),
    };
    if header.is_empty() {
        return Err(ParseError::NoColumns);
    }

    let columns = normalize_headers(header.iter().map(str::to_string).collect());
    let width = columns.len();
    let mut table = Table::new(columns);

    for record in records {
        let record = record?;
        if record.len() > width {
            let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
            return Err(ParseError::RaggedRow {
                line,
                expected: width,
                found: record.len(),
            });
        }
        let mut row: Vec<CellValue> = record.iter().map(CellValue::parse_text).collect();
        row.resize(width, CellValue::Empty);
        table.push_row(row)?;
    }

    debug!("csv decoded: {} data rows", table.row_count());
    Ok(table)
}

/// Parse the first worksheet of an Excel workbook. The first row is the header.
pub fn from_xlsx(bytes: &[u8]) -> Result<Table, ParseError> {
    use calamine::{Reader, Xlsx};

    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ParseError::NoSheets)?;

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut rows = range.rows();

    let header = match rows.next() {
        Some(header) if !header.is_empty() => header,
        _ => return Err(ParseError::NoColumns),
    };
    let columns = normalize_headers(header.iter().map(|cell| cell.to_string()).collect());
    let mut table = Table::new(columns);

    for row in rows {
        table.push_row(row.iter().map(xlsx_value).collect())?;
    }

    debug!(
        "xlsx sheet '{}' decoded: {} data rows",
        sheet_name,
        table.row_count()
    );
    Ok(table)
}

fn xlsx_value(cell: &calamine::Data) -> CellValue {
    use calamine::Data;

    match cell {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Int(*i),
        // Workbooks store every number as a double
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            CellValue::Int(*f as i64)
        }
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

/// Blank header cells become `Unnamed: <index>`; repeated names get `.1`, `.2`, ...
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut used = HashSet::new();
    let mut columns = Vec::with_capacity(raw.len());

    for (i, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut suffix = 0;
        while used.contains(&candidate) {
            suffix += 1;
            candidate = format!("{}.{}", base, suffix);
        }
        used.insert(candidate.clone());
        columns.push(candidate);
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_duplicate_headers() {
        let columns = normalize_headers(vec![
            "amount".to_string(),
            "".to_string(),
            "amount".to_string(),
            "amount".to_string(),
        ]);
        assert_eq!(columns, ["amount", "Unnamed: 1", "amount.1", "amount.2"]);
    }

    #[test]
    fn integral_workbook_numbers_become_ints() {
        assert_eq!(xlsx_value(&calamine::Data::Float(12.0)), CellValue::Int(12));
        assert_eq!(xlsx_value(&calamine::Data::Float(12.5)), CellValue::Float(12.5));
    }
}
