//! Backup and restore walkthrough.
//!
//! Creates an in-memory database of users and books, backs it up to a
//! `d3b` archive and a workbook, then restores the archive into a second
//! database and prints what arrived.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p table-backup-sqlite --example users_and_books
//! ```

use std::io::Cursor;

use rusqlite::Connection;
use table_backup_archive::{ArchiveFormat, BackupContext, BackupOptions};
use table_backup_core::{
    Catalog, ColumnDescriptor, ColumnKind, RecordSink, SchemaLifecycle, TableDescriptor,
    record_from_text,
};
use table_backup_sqlite::SqliteDatabase;

fn catalog() -> Catalog {
    Catalog::new(vec![
        TableDescriptor::new("Users", "demo.model.User")
            .with_column(ColumnDescriptor::new("Id", ColumnKind::Text).primary_key())
            .with_column(ColumnDescriptor::new("Name", ColumnKind::Text)),
        TableDescriptor::new("Books", "demo.model.Book")
            .with_display_name("Book list")
            .with_column(ColumnDescriptor::new("Id", ColumnKind::Text).primary_key())
            .with_column(ColumnDescriptor::new("Name", ColumnKind::Text))
            .with_column(ColumnDescriptor::new("IsRead", ColumnKind::Boolean))
            .with_column(ColumnDescriptor::new("ReadCount", ColumnKind::Int32))
            .with_column(ColumnDescriptor::new("Price", ColumnKind::Decimal)),
    ])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut source = SqliteDatabase::new(Connection::open_in_memory()?, catalog())?;
    source.ensure_created()?;

    // Seed a few rows through the same staging path a restore uses
    let users = catalog().by_type_name("demo.model.User").cloned().ok_or("no users table")?;
    let books = catalog().by_type_name("demo.model.Book").cloned().ok_or("no books table")?;
    for (id, name) in [("U001", Some("User01")), ("U002", None)] {
        source.add(&users, &record_from_text(&users, [("Id", Some(id)), ("Name", name)])?)?;
    }
    let book = record_from_text(
        &books,
        [
            ("Id", Some("B001")),
            ("Name", Some("Book01")),
            ("IsRead", Some("true")),
            ("ReadCount", Some("3")),
            ("Price", Some("10.50")),
        ],
    )?;
    source.add(&books, &book)?;
    source.save_changes()?;

    // Back up to memory, printing progress as it goes
    let ctx = BackupContext::for_format(ArchiveFormat::D3b)
        .with_progress(|percent, label| println!("[Progress][{percent:02}%] {}", label.unwrap_or("")))
        .with_state(|text| println!("[State] {text}"));
    let mut archive = Cursor::new(Vec::new());
    let backup = ctx.backup(&mut source, &mut archive, &BackupOptions::default())?;
    println!("Backed up {} rows ({} bytes)", backup.row_count(), archive.get_ref().len());

    // The same data as a workbook report
    let mut report = Cursor::new(Vec::new());
    BackupContext::for_format(ArchiveFormat::XlsxReport).backup(
        &mut source,
        &mut report,
        &BackupOptions::default(),
    )?;
    println!("Report workbook: {} bytes", report.get_ref().len());

    // Restore into a fresh database
    let mut target = SqliteDatabase::new(Connection::open_in_memory()?, catalog())?;
    target.ensure_created()?;
    archive.set_position(0);
    let restored = ctx.restore(&mut target, &mut archive, |table, record| {
        println!("  {} {}", table.type_name, record.to_pretty_json().replace('\n', " "));
    })?;
    println!("Restored {} records", restored.saved);

    for table in target.status()?.tables {
        println!("{}: {} rows", table.table, table.rows);
    }
    Ok(())
}
