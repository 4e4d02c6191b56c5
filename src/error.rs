use crate::session::SessionMode;
use thiserror::Error;

/// A row whose width does not match its table's header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("row {row} has {found} values, expected {expected}")]
pub struct ShapeError {
    pub row: usize,
    pub expected: usize,
    pub found: usize,
}

/// Failure to turn an uploaded file into a table.
///
/// Surfaced to the user as a message; an upload that fails to parse has no
/// effect on the session it was meant for.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("File has no extension")]
    MissingExtension,

    #[error("No columns to parse from file")]
    NoColumns,

    #[error("No sheets found in Excel file")]
    NoSheets,

    #[error("Error tokenizing data: line {line} has {found} fields, expected {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Error reading file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Error reading file: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("Error reading file: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Shape(#[from] ShapeError),
}

/// A transition that was rejected. The session is left exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("no table has been loaded")]
    NotLoaded,

    #[error("the reconciliation engine has not been run")]
    EngineNotRun,

    #[error("row {row} is out of range for a table of {len} rows")]
    RowOutOfRange { row: usize, len: usize },

    #[error("row {row} is not on the current page (rows {start}..{end})")]
    RowNotVisible { row: usize, start: usize, end: usize },

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("column '{0}' is managed by the session and cannot be edited")]
    ReservedColumn(String),

    #[error("{action} is not available in {mode} mode")]
    Unsupported {
        action: &'static str,
        mode: SessionMode,
    },

    #[error("engine returned {found} rows for an input of {expected} rows")]
    EngineContract { expected: usize, found: usize },
}

/// Failure to encode an export set.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("export failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Invalid application configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Any failure of a review request, from upload to download.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("{0}")]
    Export(#[from] ExportError),
}
