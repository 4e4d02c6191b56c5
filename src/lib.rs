/*!
# Transaction Review

A browser-based review tool for transaction spreadsheets, built in Rust.

## Overview

A reviewer uploads a `.csv` or `.xlsx` file of transactions, edits rows in
an editable grid, ticks rows through a `select` checkbox column, and acts on
the ticked rows in bulk: removing them, or flagging them for export. The
flagged rows can then be downloaded as CSV or as an Excel workbook.

Two workflows are supported:

- **Finalize**: rows are flagged `final` directly on the uploaded table.
- **Reconcile**: the table is shown ten rows per page, a reconciliation
  engine turns it into a result table, and rows of the result are flagged
  `fraud`.

## Architecture

### Session core
- **session**: `TableSession`, the state machine that owns the working table,
  the id-keyed selection and flag sets, the page window and the engine
  result. Every interaction is an `Action` applied to a session value.

### Collaborators
- **loader**: CSV (csv crate) and XLSX (calamine) decoding, dispatched by extension
- **engine**: the reconciliation engine seam; the stock engine is the identity
- **downloader**: CSV and XLSX (rust_xlsxwriter) encoding of export sets
- **reviewer**: wires a session to its loader, engine and exporter

### Persistence
- **saving**: gzip-compressed bincode snapshots of a session

### Web layer (`web` feature)
- **app**: axum routes, one session per browser cookie

## REST API Endpoints

- `GET /api/session` - Current grid, page and engine result
- `POST /api/upload` - Multipart upload (field `file`)
- `POST /api/action` - Apply a grid action (`select`, `edit`, `remove_selected`, ...)
- `GET /api/export/{final|fraud}?format=csv|xlsx` - Download flagged rows
*/

pub mod cell;
pub mod config;
pub mod downloader;
pub mod engine;
pub mod error;
pub mod loader;
pub mod reviewer;
pub mod saving;
pub mod session;
pub mod table;

#[cfg(feature = "web")]
pub mod app;

/// Re-export the types most callers need
pub use cell::CellValue;
pub use downloader::{ExportFormat, Exporter, SheetExporter};
pub use engine::{Engine, IdentityEngine};
pub use error::{ConfigError, ExportError, ParseError, ReviewError, SessionError, ShapeError};
pub use loader::{FileLoader, Loader};
pub use reviewer::{Download, ExportFile, Reviewer};
pub use session::{
    Action, FlagKind, Notice, Outcome, PaginationWindow, RerunPolicy, RowId, SessionMode,
    SessionState, TableSession, WorkingTable, transition,
};
pub use table::Table;
