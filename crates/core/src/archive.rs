//! In-memory ZIP packaging of exported tables.

use crate::constants::{ARCHIVE_FOLDER_NAME, ARCHIVE_NAME_FORMAT};
use crate::ExportResult;
use chrono::{DateTime, TimeZone};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A finished archive ready to be returned to a caller.
#[derive(Debug, Clone)]
pub struct ExportArchive {
    /// Suggested download name, e.g. `Zip_2024-Mar-05-142233.zip`.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Builds a ZIP archive in memory with every entry under a single folder.
pub struct ArchiveBuilder {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    folder: String,
    options: FileOptions,
}

impl ArchiveBuilder {
    /// Start an archive whose entries live under [`ARCHIVE_FOLDER_NAME`].
    pub fn new() -> ExportResult<Self> {
        Self::with_folder(ARCHIVE_FOLDER_NAME)
    }

    /// Start an archive whose entries live under `folder`. The folder entry is written first.
    pub fn with_folder(folder: &str) -> ExportResult<Self> {
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.add_directory(format!("{folder}/"), options)?;

        Ok(Self {
            zip,
            folder: folder.to_owned(),
            options,
        })
    }

    /// Add `contents` as `<folder>/<name>`.
    pub fn add_file(&mut self, name: &str, contents: &[u8]) -> ExportResult<()> {
        self.zip
            .start_file(format!("{}/{}", self.folder, name), self.options)?;
        self.zip
            .write_all(contents)
            .map_err(zip::result::ZipError::Io)?;
        Ok(())
    }

    /// Write the central directory and return the archive bytes.
    pub fn finish(mut self) -> ExportResult<Vec<u8>> {
        let cursor = self.zip.finish()?;
        Ok(cursor.into_inner())
    }
}

/// Download name for an archive created at `now`.
pub fn archive_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format(ARCHIVE_NAME_FORMAT).to_string()
}
