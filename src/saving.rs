use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Write};
use std::path::Path;

use crate::session::TableSession;

pub fn save_session(session: &TableSession, filename: impl AsRef<Path>) -> std::io::Result<()> {
    let file = File::create(filename)?;
    write_session(session, file)
}

pub fn load_session(filename: impl AsRef<Path>) -> std::io::Result<TableSession> {
    let file = File::open(filename)?;
    read_session(file)
}

/// Gzip-compressed bincode snapshot of a session, for keeping state between requests.
pub fn session_to_bytes(session: &TableSession) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_session(session, &mut buffer)?;
    Ok(buffer)
}

pub fn session_from_bytes(bytes: &[u8]) -> std::io::Result<TableSession> {
    read_session(Cursor::new(bytes))
}

fn write_session<W: Write>(session: &TableSession, sink: W) -> std::io::Result<()> {
    let encoder = GzEncoder::new(sink, Compression::default());
    let mut writer = BufWriter::new(encoder);

    serialize_into(&mut writer, session).map_err(std::io::Error::other)?;

    let encoder = writer.into_inner().map_err(|e| e.into_error())?;
    encoder.finish()?;
    Ok(())
}

fn read_session<R: std::io::Read>(source: R) -> std::io::Result<TableSession> {
    let decoder = GzDecoder::new(source);
    let mut reader = BufReader::new(decoder);

    let session: TableSession = deserialize_from(&mut reader)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    Ok(session)
}
