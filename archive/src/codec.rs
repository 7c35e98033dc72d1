//! The archive codec abstraction.
//!
//! A codec turns a stream of `(table, rows)` groups into bytes and, when it
//! can, turns those bytes back into records shaped by the live schema.
//! Encoding is push-based through a [`TableWriter`]; decoding drives a
//! visitor so that records reach the persistence sink one at a time.

use std::fmt;
use std::io::{Read, Seek, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use table_backup_core::{Catalog, Record, Row, TableDescriptor};

use crate::d3b::D3bCodec;
use crate::error::{ArchiveError, Result};
use crate::notify::Notifier;
use crate::outcome::RestoreReport;
use crate::report::ReportCodec;
use crate::text::TextResource;
use crate::workbook::WorkbookCodec;

/// Seekable output stream.
pub trait WriteSeek: Write + Seek {}

impl<T: Write + Seek + ?Sized> WriteSeek for T {}

/// Seekable input stream.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// Container formats known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveFormat {
    /// Zip container with one `DATA` entry of marker and JSON lines.
    D3b,
    /// Workbook with one worksheet per table.
    Xlsx,
    /// Export-only workbook with labelled sheets and a styled header.
    XlsxReport,
}

impl ArchiveFormat {
    pub const ALL: [ArchiveFormat; 3] = [
        ArchiveFormat::D3b,
        ArchiveFormat::Xlsx,
        ArchiveFormat::XlsxReport,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveFormat::D3b => "d3b",
            ArchiveFormat::Xlsx => "xlsx",
            ArchiveFormat::XlsxReport => "xlsx-report",
        }
    }

    /// Infers the restorable format from a file extension.
    ///
    /// `.xlsx` maps to [`ArchiveFormat::Xlsx`]; reports are only produced on
    /// explicit request.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "d3b" | "zip" => Some(ArchiveFormat::D3b),
            "xlsx" => Some(ArchiveFormat::Xlsx),
            _ => None,
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveFormat {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        ArchiveFormat::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ArchiveError::UnknownFormat(s.to_string()))
    }
}

/// Directions a codec supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub encode: bool,
    pub decode: bool,
}

/// Receives table groups during a backup.
pub trait TableWriter {
    /// Starts a group. Called once per table, before its first row.
    fn begin_table(&mut self, table: &TableDescriptor) -> Result<()>;

    /// Appends one row to the current group.
    fn write_row(&mut self, row: &Row) -> Result<()>;

    /// Flushes everything to the output stream.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// What a decoder needs besides the input stream.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    /// Live schema the archive is matched against.
    pub catalog: &'a Catalog,
    pub notifier: &'a Notifier,
    pub texts: &'a TextResource,
}

/// Callback receiving each reconstructed record.
pub type RecordVisitor<'v> = dyn FnMut(&TableDescriptor, Record) -> Result<()> + 'v;

/// An archive container format.
pub trait ArchiveCodec {
    fn format(&self) -> ArchiveFormat;

    fn capabilities(&self) -> Capabilities;

    /// Opens a writer over `out`.
    fn writer<'w>(&self, out: &'w mut dyn WriteSeek) -> Result<Box<dyn TableWriter + 'w>>;

    /// Reads `input`, coercing every row of a known table into a record and
    /// passing it to `visit`. Groups without a live table are reported as
    /// skipped.
    fn decode(
        &self,
        input: &mut dyn ReadSeek,
        ctx: DecodeContext<'_>,
        visit: &mut RecordVisitor<'_>,
    ) -> Result<RestoreReport>;
}

/// Returns the codec implementing `format`.
pub fn codec_for(format: ArchiveFormat) -> Box<dyn ArchiveCodec> {
    match format {
        ArchiveFormat::D3b => Box::new(D3bCodec),
        ArchiveFormat::Xlsx => Box::new(WorkbookCodec),
        ArchiveFormat::XlsxReport => Box::new(ReportCodec),
    }
}
