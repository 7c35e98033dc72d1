//! Archive codecs and the backup/restore orchestrator.
//!
//! This crate turns the tables of any backend implementing the
//! `table-backup-core` traits into an archive file and back:
//!
//! - **`d3b`**: a zip container with one `DATA` entry of `#<type>` marker
//!   lines and JSON rows ([`D3bCodec`]).
//! - **`xlsx`**: a workbook with one worksheet per table ([`WorkbookCodec`]).
//! - **`xlsx-report`**: an export-only workbook with labelled sheets
//!   ([`ReportCodec`]).
//!
//! [`BackupContext`] drives a backup, check, restore or schema update and
//! reports progress and lifecycle state to optional callbacks.
//!
//! # Quick start
//!
//! ```no_run
//! use table_backup_archive::{ArchiveFormat, BackupContext, BackupOptions};
//! use table_backup_core::{Catalog, MemoryDatabase};
//!
//! let catalog = Catalog::load("catalog.yaml").unwrap();
//! let mut db = MemoryDatabase::new(catalog);
//!
//! let ctx = BackupContext::for_format(ArchiveFormat::D3b)
//!     .with_progress(|percent, label| println!("[{percent:>3}%] {}", label.unwrap_or("")))
//!     .with_state(|text| println!("{text}"));
//! let report = ctx.backup_file(&mut db, "backup.d3b", &BackupOptions::default()).unwrap();
//! println!("{} rows written", report.row_count());
//! ```

mod codec;
mod context;
mod d3b;
mod error;
mod notify;
mod outcome;
mod report;
mod text;
mod workbook;

#[cfg(test)]
mod test_support;

pub use codec::{
    ArchiveCodec, ArchiveFormat, Capabilities, DecodeContext, ReadSeek, RecordVisitor,
    TableWriter, WriteSeek, codec_for,
};
pub use context::{BackupContext, BackupOptions};
pub use d3b::{D3bCodec, DATA_ENTRY};
pub use error::{ArchiveError, Result};
pub use notify::{Notifier, percent};
pub use outcome::{BackupReport, RestoreReport, SkippedTable, TableCount};
pub use report::ReportCodec;
pub use text::TextResource;
pub use workbook::WorkbookCodec;
