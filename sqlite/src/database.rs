//! The SQLite backend.
//!
//! [`SqliteDatabase`] owns one connection and the catalog describing its
//! tables. It streams rows for backups, stages records for restores and
//! commits them in a single transaction, and creates or drops the catalog's
//! tables.
//!
//! # Example
//!
//! ```no_run
//! use table_backup_core::{Catalog, SchemaLifecycle};
//! use table_backup_sqlite::SqliteDatabase;
//!
//! let catalog = Catalog::load("catalog.yaml").unwrap();
//! let mut db = SqliteDatabase::open("app.db", catalog).unwrap();
//!
//! // Create missing tables
//! db.ensure_created().unwrap();
//!
//! // Check status
//! let status = db.status().unwrap();
//! for table in &status.tables {
//!     println!("{}: {} rows", table.table, table.rows);
//! }
//! ```

use std::path::Path;

use rusqlite::{Connection, params_from_iter};
use serde::Serialize;
use tracing::{debug, info};

use table_backup_core::{
    Backend, Catalog, ColumnDescriptor, Record, RecordSink, Row, RowSource, ScanError,
    SchemaLifecycle, SchemaOracle, TableDescriptor,
};

use crate::convert::{kind_from_decl, row_from_sql, value_to_sql};
use crate::error::{Result, SqliteError};
use crate::schema::{
    generate_create_sql, generate_drop_sql, insert_sql, quote_identifier, select_all_sql,
    validate_catalog,
};

/// A SQLite database described by a [`Catalog`].
///
/// Implements every backend trait, so it can be backed up, checked against
/// and restored into by the archive orchestrator.
///
/// Staged records live in memory until [`save_changes`](RecordSink::save_changes),
/// which inserts them all inside one transaction: either every record is
/// written or none is.
pub struct SqliteDatabase {
    conn: Connection,
    catalog: Catalog,
    staged: Vec<(String, Record)>,
}

impl SqliteDatabase {
    /// Wraps a connection.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::CatalogError`] if the catalog fails validation and
    /// [`SqliteError::InvalidIdentifier`] if a table or column name is not
    /// usable in DDL.
    pub fn new(conn: Connection, catalog: Catalog) -> Result<Self> {
        catalog.validate()?;
        validate_catalog(&catalog)?;
        Ok(Self {
            conn,
            catalog,
            staged: Vec::new(),
        })
    }

    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>, catalog: Catalog) -> Result<Self> {
        Self::new(Connection::open(path)?, catalog)
    }

    /// Wraps a connection, deriving the catalog from the tables it holds.
    pub fn introspect(conn: Connection) -> Result<Self> {
        let catalog = introspect_catalog(&conn)?;
        debug!(tables = catalog.len(), "catalog introspected");
        Ok(Self {
            conn,
            catalog,
            staged: Vec::new(),
        })
    }

    /// Reports which catalog tables exist and how many rows each holds.
    pub fn status(&self) -> Result<DatabaseStatus> {
        let mut tables = Vec::with_capacity(self.catalog.len());
        for table in self.catalog.tables() {
            let exists = self.table_exists(&table.name)?;
            let rows = if exists { self.count_rows(&table.name)? } else { 0 };
            tables.push(TableStatus {
                table: table.name.clone(),
                type_name: table.type_name.clone(),
                exists,
                rows,
            });
        }
        Ok(DatabaseStatus {
            tables_exist: tables.iter().all(|t| t.exists),
            tables,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the database and returns the underlying connection.
    /// Staged records are dropped.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Checks whether a table exists.
    fn table_exists(&self, name: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1")?;
        let count: i64 = stmt.query_row([name], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn count_rows(&self, name: &str) -> Result<usize> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT COUNT(*) FROM {}", quote_identifier(name)))?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn any_table(&self, exists: bool) -> Result<bool> {
        for table in self.catalog.tables() {
            if self.table_exists(&table.name)? == exists {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn key_of(table: &TableDescriptor, record: &Record) -> Option<String> {
        let parts: Vec<String> = table
            .key_columns()
            .map(|c| record.get(&c.name).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(","))
        }
    }
}

/// Derives a catalog from the user tables of a database.
///
/// Tables are listed in creation order. Each table's record type name is
/// its table name, and column kinds come from the declared column types
/// (see [`kind_from_decl`]).
pub fn introspect_catalog(conn: &Connection) -> Result<Catalog> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY rowid",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let mut info = conn.prepare(&format!("PRAGMA table_info({})", quote_identifier(&name)))?;
        let columns = info
            .query_map([], |row| {
                let column: String = row.get(1)?;
                let decl: Option<String> = row.get(2)?;
                let not_null: i64 = row.get(3)?;
                let pk: i64 = row.get(5)?;
                Ok(ColumnDescriptor {
                    name: column,
                    kind: kind_from_decl(decl.as_deref()),
                    primary_key: pk > 0,
                    nullable: not_null == 0 && pk == 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut table = TableDescriptor::new(name.clone(), name);
        table.columns = columns;
        tables.push(table);
    }
    Ok(Catalog::new(tables))
}

/// Status of one catalog table.
#[derive(Debug, Clone, Serialize)]
pub struct TableStatus {
    pub table: String,
    pub type_name: String,
    /// Whether the table exists in the database.
    pub exists: bool,
    /// Number of rows stored (zero if the table is missing).
    pub rows: usize,
}

/// Snapshot of the catalog tables in a database.
///
/// Returned by [`SqliteDatabase::status`].
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStatus {
    /// Whether every catalog table exists.
    pub tables_exist: bool,
    pub tables: Vec<TableStatus>,
}

impl DatabaseStatus {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

impl SchemaOracle for SqliteDatabase {
    fn list_tables(&self) -> Vec<TableDescriptor> {
        self.catalog.list_tables()
    }

    fn columns_of(&self, table: &str) -> Option<Vec<ColumnDescriptor>> {
        self.catalog.columns_of(table)
    }

    fn display_name_of(&self, table: &str) -> Option<String> {
        self.catalog.display_name_of(table)
    }
}

impl Backend for SqliteDatabase {
    type Error = SqliteError;
}

impl RowSource for SqliteDatabase {
    fn scan_table<V, F>(
        &self,
        table: &str,
        mut visit: F,
    ) -> std::result::Result<usize, ScanError<SqliteError, V>>
    where
        F: FnMut(Row) -> std::result::Result<(), V>,
    {
        let query = |e: rusqlite::Error| ScanError::Query(SqliteError::from(e));

        let mut stmt = self.conn.prepare(&select_all_sql(table)).map_err(query)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query([]).map_err(query)?;

        let mut count = 0;
        while let Some(sql_row) = rows.next().map_err(query)? {
            let row = row_from_sql(sql_row, &columns).map_err(ScanError::Query)?;
            visit(row).map_err(ScanError::Visit)?;
            count += 1;
        }
        Ok(count)
    }
}

impl RecordSink for SqliteDatabase {
    fn add(&mut self, table: &TableDescriptor, record: &Record) -> Result<()> {
        if let Some(key) = Self::key_of(table, record) {
            let clash = self.staged.iter().any(|(name, other)| {
                *name == table.name && Self::key_of(table, other).as_deref() == Some(key.as_str())
            });
            if clash {
                return Err(SqliteError::DuplicateKey {
                    type_name: table.type_name.clone(),
                    key,
                });
            }
        }
        self.staged.push((table.name.clone(), record.clone()));
        Ok(())
    }

    fn save_changes(&mut self) -> Result<usize> {
        let staged = std::mem::take(&mut self.staged);
        if staged.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        for (table, record) in &staged {
            let sql = insert_sql(table, record.iter().map(|(name, _)| name));
            let mut stmt = tx.prepare_cached(&sql)?;
            stmt.execute(params_from_iter(record.values().map(value_to_sql)))
                .map_err(|source| SqliteError::InsertFailed {
                    table: table.clone(),
                    source,
                })?;
        }
        tx.commit()?;

        info!(records = staged.len(), "changes committed");
        Ok(staged.len())
    }

    fn discard_changes(&mut self) {
        self.staged.clear();
    }

    fn pending(&self) -> usize {
        self.staged.len()
    }
}

impl SchemaLifecycle for SqliteDatabase {
    /// Creates missing catalog tables in one transaction.
    fn ensure_created(&mut self) -> Result<bool> {
        let missing = self.any_table(false)?;
        if !missing {
            return Ok(false);
        }
        let sql = generate_create_sql(&self.catalog)?;
        debug!(%sql, "creating tables");
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)?;
        tx.commit()?;
        Ok(true)
    }

    /// Drops the catalog tables, last first, in one transaction.
    fn ensure_deleted(&mut self) -> Result<bool> {
        let present = self.any_table(true)?;
        if !present {
            return Ok(false);
        }
        let sql = generate_drop_sql(&self.catalog)?;
        debug!(%sql, "dropping tables");
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)?;
        tx.commit()?;
        Ok(true)
    }
}
