//! ZIP archive writer for support dumps.
//!
//! Entries are appended one at a time in submission order and flushed after
//! each body so compressed bytes reach the sink instead of piling up in the
//! deflate buffer. The central directory is written by [`ArchiveHandle::finish`].

mod streamer;

pub use streamer::{StreamHandle, StreamSummary};

use crate::config::MAX_COMPRESSION_LEVEL;
use crate::error::{DumpError, DumpResult};
use crate::payload::Payload;
use chrono::{Datelike, Local, Timelike};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use zip::result::ZipError;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

/// Per-entry settings shared by every entry of one archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryOptions {
    compression_level: i64,
}

impl Default for EntryOptions {
    fn default() -> Self {
        Self {
            compression_level: MAX_COMPRESSION_LEVEL,
        }
    }
}

impl EntryOptions {
    /// Deflate at `level`, clamped to 0..=9.
    pub fn with_level(level: i64) -> Self {
        Self {
            compression_level: level.clamp(0, MAX_COMPRESSION_LEVEL),
        }
    }

    pub fn compression_level(&self) -> i64 {
        self.compression_level
    }

    fn file_options(&self) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.compression_level))
            .last_modified_time(now_dos_time())
            .unix_permissions(0o644)
    }
}

/// ZIP timestamps cannot represent dates before 1980; those fall back to the format minimum.
fn now_dos_time() -> zip::DateTime {
    let now = Local::now();
    zip::DateTime::from_date_and_time(
        u16::try_from(now.year()).unwrap_or(1980),
        now.month() as u8,
        now.day() as u8,
        now.hour() as u8,
        now.minute() as u8,
        now.second() as u8,
    )
    .unwrap_or_default()
}

/// Reason an entry name cannot be written, if any.
fn entry_name_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("entry name is empty");
    }
    if name.starts_with('/') || name.contains('\\') {
        return Some("entry name must be relative and use forward slashes");
    }
    if name.split('/').any(|part| part == "..") {
        return Some("entry name must not contain '..'");
    }
    None
}

fn zip_io(err: ZipError) -> std::io::Error {
    match err {
        ZipError::Io(e) => e,
        other => std::io::Error::other(other),
    }
}

/// An open archive. Owned by exactly one writer at a time.
pub struct ArchiveHandle<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: EntryOptions,
    names: HashSet<String>,
    bytes: u64,
}

impl ArchiveHandle<BufWriter<File>> {
    /// Create (truncating) the archive file at `path`.
    pub fn create(path: &Path, options: EntryOptions) -> DumpResult<Self> {
        let file = File::create(path).map_err(|source| DumpError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file), options))
    }
}

impl<W: Write + Seek> ArchiveHandle<W> {
    pub fn new(writer: W, options: EntryOptions) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            options,
            names: HashSet::new(),
            bytes: 0,
        }
    }

    /// Number of entries written so far.
    pub fn entries(&self) -> usize {
        self.names.len()
    }

    /// Uncompressed payload bytes written so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Append one payload as a new entry and flush it toward the sink.
    pub fn write_entry(&mut self, payload: &Payload) -> DumpResult<()> {
        if let Some(reason) = entry_name_problem(&payload.name) {
            return Err(DumpError::entry_create(&payload.name, reason));
        }
        if self.names.contains(&payload.name) {
            return Err(DumpError::entry_create(
                &payload.name,
                "duplicate entry name",
            ));
        }

        self.zip
            .start_file(payload.name.as_str(), self.options.file_options())
            .map_err(|e| DumpError::entry_create(&payload.name, e))?;
        self.names.insert(payload.name.clone());

        self.zip
            .write_all(&payload.data)
            .map_err(|e| DumpError::write(&payload.name, e))?;
        self.bytes += payload.data.len() as u64;

        self.zip
            .flush()
            .map_err(|e| DumpError::write(&payload.name, e))?;
        Ok(())
    }

    /// Write the central directory and hand back the flushed sink.
    pub fn finish(self) -> DumpResult<W> {
        let mut writer = self
            .zip
            .finish()
            .map_err(|e| DumpError::Finalize { source: zip_io(e) })?;
        writer
            .flush()
            .map_err(|source| DumpError::Finalize { source })?;
        Ok(writer)
    }
}
