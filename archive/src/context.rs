//! Backup and restore orchestration.
//!
//! [`BackupContext`] binds a codec to the notification channels and texts,
//! and drives a backend through the backup, check, restore and update-schema
//! flows.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//!
//! use table_backup_archive::{ArchiveFormat, BackupContext, BackupOptions};
//! use table_backup_core::{
//!     Catalog, ColumnDescriptor, ColumnKind, MemoryDatabase, Row, SchemaLifecycle, TableDescriptor,
//! };
//!
//! let catalog = Catalog::new(vec![
//!     TableDescriptor::new("Users", "demo.User")
//!         .with_column(ColumnDescriptor::new("Id", ColumnKind::Text).primary_key())
//!         .with_column(ColumnDescriptor::new("Name", ColumnKind::Text)),
//! ]);
//! let mut source = MemoryDatabase::new(catalog.clone());
//! source.insert_row("Users", Row::new().with("Id", "U001").with("Name", "User01"));
//!
//! let ctx = BackupContext::for_format(ArchiveFormat::D3b);
//! let mut archive = Cursor::new(Vec::new());
//! let report = ctx.backup(&mut source, &mut archive, &BackupOptions::default()).unwrap();
//! assert_eq!(report.row_count(), 1);
//!
//! let mut target = MemoryDatabase::new(catalog);
//! target.ensure_created().unwrap();
//! archive.set_position(0);
//! let restored = ctx.restore(&mut target, &mut archive, |_, _| {}).unwrap();
//! assert_eq!(restored.saved, 1);
//! assert_eq!(target.rows("Users"), source.rows("Users"));
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use tracing::{info, warn};

use table_backup_core::{
    Catalog, CoreError, Record, RecordSink, RowSource, ScanError, SchemaLifecycle, SchemaOracle,
    TableDescriptor,
};

use crate::codec::{ArchiveCodec, ArchiveFormat, DecodeContext, RecordVisitor, codec_for};
use crate::error::{ArchiveError, Result};
use crate::notify::{Notifier, percent};
use crate::outcome::{BackupReport, RestoreReport, SkippedTable, TableCount};
use crate::text::TextResource;

type TableNameMap = Box<dyn Fn(&str) -> String>;

/// Per-run backup options.
#[derive(Default)]
pub struct BackupOptions {
    table_name_map: Option<TableNameMap>,
    tables: Option<Vec<String>>,
}

impl BackupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrites table names before they are queried. Markers and sheet
    /// names keep the schema's names.
    pub fn with_table_name_map(mut self, map: impl Fn(&str) -> String + 'static) -> Self {
        self.table_name_map = Some(Box::new(map));
        self
    }

    /// Queries `<prefix><table>` instead of `<table>`.
    pub fn with_table_prefix(self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.with_table_name_map(move |name| format!("{prefix}{name}"))
    }

    /// Restricts the backup to tables matching one of `names`, by record
    /// type name or table name.
    pub fn with_tables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn includes(&self, table: &TableDescriptor) -> bool {
        match &self.tables {
            None => true,
            Some(names) => names
                .iter()
                .any(|n| *n == table.type_name || *n == table.name),
        }
    }

    pub fn query_name(&self, table: &str) -> String {
        match &self.table_name_map {
            Some(map) => map(table),
            None => table.to_string(),
        }
    }
}

impl fmt::Debug for BackupOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupOptions")
            .field("table_name_map", &self.table_name_map.is_some())
            .field("tables", &self.tables)
            .finish()
    }
}

/// Drives backups and restores through one archive codec.
pub struct BackupContext {
    codec: Box<dyn ArchiveCodec>,
    notifier: Notifier,
    texts: TextResource,
}

impl BackupContext {
    pub fn new(codec: Box<dyn ArchiveCodec>) -> Self {
        Self {
            codec,
            notifier: Notifier::default(),
            texts: TextResource::default(),
        }
    }

    pub fn for_format(format: ArchiveFormat) -> Self {
        Self::new(codec_for(format))
    }

    /// Installs the progress callback: `(percentage, current table label)`.
    pub fn with_progress(mut self, callback: impl Fn(u8, Option<&str>) + 'static) -> Self {
        self.notifier = self.notifier.on_progress(callback);
        self
    }

    /// Installs the state callback.
    pub fn with_state(mut self, callback: impl Fn(&str) + 'static) -> Self {
        self.notifier = self.notifier.on_state(callback);
        self
    }

    pub fn with_texts(mut self, texts: TextResource) -> Self {
        self.texts = texts;
        self
    }

    pub fn format(&self) -> ArchiveFormat {
        self.codec.format()
    }

    pub fn texts(&self) -> &TextResource {
        &self.texts
    }

    fn require_decode(&self, operation: &'static str) -> Result<()> {
        if self.codec.capabilities().decode {
            Ok(())
        } else {
            Err(ArchiveError::Unsupported {
                format: self.codec.format(),
                operation,
            })
        }
    }

    /// Writes every table of `db` to `out`.
    ///
    /// The schema is created first if it is missing. Tables are written in
    /// schema order; a table whose query fails is skipped and listed in the
    /// report, and a table without rows contributes no group.
    pub fn backup<D, W>(&self, db: &mut D, out: &mut W, options: &BackupOptions) -> Result<BackupReport>
    where
        D: SchemaOracle + RowSource + SchemaLifecycle,
        W: Write + Seek,
    {
        if !self.codec.capabilities().encode {
            return Err(ArchiveError::Unsupported {
                format: self.codec.format(),
                operation: "backup",
            });
        }
        self.notifier.state(&self.texts.backing_up_data);
        db.ensure_created()
            .map_err(|e| CoreError::Schema(Box::new(e)))?;

        let tables: Vec<TableDescriptor> = db
            .list_tables()
            .into_iter()
            .filter(|t| options.includes(t))
            .collect();
        let total = tables.len();
        let mut writer = self.codec.writer(out)?;
        let mut report = BackupReport::default();

        for (i, table) in tables.iter().enumerate() {
            let label = format!("({}/{}) {}", i + 1, total, table.display_label());
            self.notifier
                .progress(percent((i + 1) as u64, total as u64), Some(&label));

            let query_name = options.query_name(&table.name);
            let mut started = false;
            let scanned = db.scan_table(&query_name, |row| -> Result<()> {
                if !started {
                    writer.begin_table(table)?;
                    started = true;
                }
                writer.write_row(&row)
            });

            match scanned {
                Ok(0) => report.empty.push(table.name.clone()),
                Ok(rows) => {
                    info!(table = %table.name, rows, "table backed up");
                    report.tables.push(TableCount {
                        table: table.name.clone(),
                        type_name: table.type_name.clone(),
                        rows,
                    });
                }
                Err(ScanError::Query(e)) if !started => {
                    warn!(table = %table.name, query = %query_name, error = %e, "skipping table");
                    report.skipped.push(SkippedTable {
                        table: table.name.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(ScanError::Query(e)) => {
                    return Err(ArchiveError::ScanAborted {
                        table: table.name.clone(),
                        source: Box::new(e),
                    });
                }
                Err(ScanError::Visit(e)) => return Err(e),
            }
        }

        writer.finish()?;
        Ok(report)
    }

    /// Creates (or truncates) `path` and backs up into it.
    pub fn backup_file<D>(
        &self,
        db: &mut D,
        path: impl AsRef<Path>,
        options: &BackupOptions,
    ) -> Result<BackupReport>
    where
        D: SchemaOracle + RowSource + SchemaLifecycle,
    {
        let mut out = BufWriter::new(File::create(path)?);
        let report = self.backup(db, &mut out, options)?;
        out.flush()?;
        Ok(report)
    }

    /// Parses `input` against the live schema of `db` without persisting
    /// anything. `on_record` sees every reconstructed record.
    pub fn check<D, R, F>(&self, db: &D, input: &mut R, mut on_record: F) -> Result<RestoreReport>
    where
        D: SchemaOracle + ?Sized,
        R: Read + Seek,
        F: FnMut(&TableDescriptor, &Record),
    {
        self.require_decode("check")?;
        let catalog = Catalog::from_oracle(db);
        self.decode(input, &catalog, &mut |table, record| {
            on_record(table, &record);
            Ok(())
        })
    }

    pub fn check_file<D, F>(&self, db: &D, path: impl AsRef<Path>, on_record: F) -> Result<RestoreReport>
    where
        D: SchemaOracle + ?Sized,
        F: FnMut(&TableDescriptor, &Record),
    {
        let mut input = BufReader::new(File::open(path)?);
        self.check(db, &mut input, on_record)
    }

    /// Checks `input` and stages every record in `db`, then commits them all
    /// at once. On any failure the staged records are discarded and nothing
    /// is written.
    pub fn restore<D, R, F>(&self, db: &mut D, input: &mut R, mut on_record: F) -> Result<RestoreReport>
    where
        D: SchemaOracle + RecordSink,
        R: Read + Seek,
        F: FnMut(&TableDescriptor, &Record),
    {
        self.require_decode("restore")?;
        self.notifier.state(&self.texts.restoring_data);
        let catalog = Catalog::from_oracle(&*db);

        let decoded = self.decode(input, &catalog, &mut |table, record| {
            on_record(table, &record);
            db.add(table, &record).map_err(|e| {
                ArchiveError::from(CoreError::Persistence {
                    type_name: table.type_name.clone(),
                    data: record.to_pretty_json(),
                    source: Box::new(e),
                })
            })
        });
        let mut report = match decoded {
            Ok(report) => report,
            Err(e) => {
                db.discard_changes();
                return Err(e);
            }
        };

        self.notifier.state(&self.texts.saving_changes);
        match db.save_changes() {
            Ok(saved) => {
                info!(saved, "changes saved");
                report.saved = saved;
                Ok(report)
            }
            Err(e) => {
                db.discard_changes();
                Err(CoreError::Commit(Box::new(e)).into())
            }
        }
    }

    pub fn restore_file<D, F>(&self, db: &mut D, path: impl AsRef<Path>, on_record: F) -> Result<RestoreReport>
    where
        D: SchemaOracle + RecordSink,
        F: FnMut(&TableDescriptor, &Record),
    {
        let mut input = BufReader::new(File::open(path)?);
        self.restore(db, &mut input, on_record)
    }

    /// Rebuilds the schema of `db` while keeping its data: backs everything
    /// up in memory, drops and recreates the tables, then restores.
    ///
    /// Fails with [`ArchiveError::IncompleteBackup`] before anything is
    /// dropped if any table could not be backed up.
    pub fn update_schema<D>(&self, db: &mut D) -> Result<RestoreReport>
    where
        D: SchemaOracle + RowSource + RecordSink + SchemaLifecycle,
    {
        self.require_decode("schema updates")?;
        let mut buffer = Cursor::new(Vec::new());
        let backup = self.backup(db, &mut buffer, &BackupOptions::default())?;
        if !backup.skipped.is_empty() {
            let tables: Vec<String> = backup.skipped.into_iter().map(|s| s.table).collect();
            warn!(tables = ?tables, "schema update aborted, some tables were not backed up");
            return Err(ArchiveError::IncompleteBackup { tables });
        }

        self.notifier.state(&self.texts.deleting_schema);
        db.ensure_deleted()
            .map_err(|e| CoreError::Schema(Box::new(e)))?;
        self.notifier.state(&self.texts.creating_schema);
        db.ensure_created()
            .map_err(|e| CoreError::Schema(Box::new(e)))?;

        buffer.set_position(0);
        self.restore(db, &mut buffer, |_, _| {})
    }

    fn decode<R: Read + Seek>(
        &self,
        input: &mut R,
        catalog: &Catalog,
        visit: &mut RecordVisitor<'_>,
    ) -> Result<RestoreReport> {
        let ctx = DecodeContext {
            catalog,
            notifier: &self.notifier,
            texts: &self.texts,
        };
        let report = self.codec.decode(input, ctx, visit)?;
        info!(
            records = report.record_count(),
            skipped = report.skipped.len(),
            "archive decoded"
        );
        Ok(report)
    }
}

impl fmt::Debug for BackupContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupContext")
            .field("format", &self.codec.format())
            .field("notifier", &self.notifier)
            .field("texts", &self.texts)
            .finish()
    }
}
