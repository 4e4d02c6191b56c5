use crate::downloader::{ExportFormat, Exporter, SheetExporter};
use crate::engine::{Engine, IdentityEngine};
use crate::error::{ParseError, ReviewError, SessionError};
use crate::loader::{FileLoader, Loader};
use crate::session::{Action, FlagKind, Notice, Outcome, TableSession};
use log::info;

/// A file ready to hand to the browser.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Download {
    File(ExportFile),
    Notice(Notice),
}

/// Wires a session to its loader, engine and exporter.
///
/// The reviewer holds no session state; the same reviewer serves any number
/// of sessions.
pub struct Reviewer {
    loader: Box<dyn Loader + Send + Sync>,
    engine: Box<dyn Engine + Send + Sync>,
    exporter: Box<dyn Exporter + Send + Sync>,
}

impl Default for Reviewer {
    fn default() -> Self {
        Reviewer::new(FileLoader, IdentityEngine, SheetExporter)
    }
}

impl Reviewer {
    pub fn new(
        loader: impl Loader + Send + Sync + 'static,
        engine: impl Engine + Send + Sync + 'static,
        exporter: impl Exporter + Send + Sync + 'static,
    ) -> Self {
        Reviewer {
            loader: Box::new(loader),
            engine: Box::new(engine),
            exporter: Box::new(exporter),
        }
    }

    /// Parse an upload and load it into `session`.
    ///
    /// On a parse failure the session is not touched.
    pub fn upload(
        &self,
        session: &mut TableSession,
        bytes: &[u8],
        file_name: &str,
    ) -> Result<(), ParseError> {
        let table = self.loader.parse(bytes, file_name)?;
        session.load(table);
        Ok(())
    }

    pub fn act(&self, session: &mut TableSession, action: Action) -> Result<Outcome, SessionError> {
        session.apply(action, self.engine.as_ref())
    }

    /// Encode the rows carrying `flag` for download.
    pub fn download(
        &self,
        session: &TableSession,
        flag: FlagKind,
        format: ExportFormat,
    ) -> Result<Download, ReviewError> {
        let Some(table) = session.export(flag)? else {
            return Ok(Download::Notice(Notice::NothingToExport));
        };

        let bytes = self.exporter.encode(&table, format, flag.sheet_name())?;
        let file_name = format!("{}.{}", flag.file_stem(), format.extension());
        info!(
            "exported {} {} rows as {} ({} bytes)",
            table.row_count(),
            flag.column_name(),
            file_name,
            bytes.len()
        );

        Ok(Download::File(ExportFile {
            file_name,
            mime_type: format.mime_type(),
            bytes,
        }))
    }
}
