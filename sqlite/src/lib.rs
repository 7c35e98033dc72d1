//! SQLite backend for table backups.
//!
//! This crate implements the `table-backup-core` backend traits for a SQLite
//! database, so its tables can be backed up to and restored from any archive
//! format of `table-backup-archive`.
//!
//! # Architecture
//!
//! The crate is organized into three modules:
//!
//! - **`schema`**: DDL and DML generation from a [`Catalog`](table_backup_core::Catalog)
//! - **`convert`**: SQLite storage classes ↔ engine values, declared types ↔ column kinds
//! - **`database`**: [`SqliteDatabase`], the backend itself
//!
//! # Quick start
//!
//! ```no_run
//! use table_backup_archive::{ArchiveFormat, BackupContext, BackupOptions};
//! use table_backup_sqlite::SqliteDatabase;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("app.db").unwrap();
//! let mut db = SqliteDatabase::introspect(conn).unwrap();
//!
//! let ctx = BackupContext::for_format(ArchiveFormat::D3b);
//! let report = ctx.backup_file(&mut db, "app.d3b", &BackupOptions::default()).unwrap();
//! println!("{} rows in {} tables", report.row_count(), report.tables.len());
//! ```
//!
//! # Restores
//!
//! Records are staged in memory and written by
//! [`save_changes`](table_backup_core::RecordSink::save_changes) inside a
//! single transaction. A failed insert rolls back every record of the run.
//! Table and column names must contain only alphanumeric characters and
//! underscores.

mod convert;
mod database;
mod error;
mod schema;

pub use convert::kind_from_decl;
pub use database::{DatabaseStatus, SqliteDatabase, TableStatus, introspect_catalog};
pub use error::{Result, SqliteError};
pub use schema::{generate_create_sql, generate_drop_sql, quote_identifier, sql_type};
