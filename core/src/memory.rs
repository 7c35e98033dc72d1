//! In-memory backend.
//!
//! [`MemoryDatabase`] keeps rows in plain vectors and implements every
//! backend trait, including an identity check on primary keys and NOT NULL
//! enforcement at commit. It serves as the reference backend for engine
//! tests and for hosts that want to inspect an archive without a database.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::catalog::{Catalog, SchemaOracle};
use crate::source::{Backend, RecordSink, RowSource, ScanError, SchemaLifecycle};
use crate::types::TableDescriptor;
use crate::value::{Record, Row, Value};

/// Errors raised by [`MemoryDatabase`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("no such table: {0}")]
    NoSuchTable(String),
    #[error("query failed for table {0}")]
    QueryFailed(String),
    #[error("an instance of [{type_name}] with key [{key}] is already tracked")]
    DuplicateKey { type_name: String, key: String },
    #[error("NOT NULL constraint failed: {table}.{column}")]
    NotNull { table: String, column: String },
    #[error("commit rejected: {0}")]
    CommitRejected(String),
}

/// A database held entirely in memory.
///
/// # Examples
///
/// ```
/// use table_backup_core::*;
///
/// let catalog = Catalog::new(vec![TableDescriptor::new("Users", "demo.User")
///     .with_column(ColumnDescriptor::new("Id", ColumnKind::Text).primary_key())]);
/// let mut db = MemoryDatabase::new(catalog);
/// db.ensure_created().unwrap();
/// db.insert_row("Users", Row::new().with("Id", "U001"));
///
/// let mut seen = Vec::new();
/// let count = db
///     .scan_table("Users", |row| -> std::result::Result<(), std::convert::Infallible> {
///         seen.push(row);
///         Ok(())
///     })
///     .unwrap();
/// assert_eq!(count, 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    catalog: Catalog,
    data: HashMap<String, Vec<Row>>,
    failing: HashSet<String>,
    staged: Vec<(String, Record)>,
    reject_commit: Option<String>,
}

impl MemoryDatabase {
    /// Creates a database for `catalog` with no physical tables yet.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Appends a row, creating the table if needed.
    pub fn insert_row(&mut self, table: &str, row: Row) {
        self.data.entry(table.to_string()).or_default().push(row);
    }

    /// Returns the committed rows of a table (empty if it does not exist).
    pub fn rows(&self, table: &str) -> &[Row] {
        self.data.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn table_exists(&self, table: &str) -> bool {
        self.data.contains_key(table)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Makes every scan of `table` fail with a query error.
    pub fn fail_queries_on(&mut self, table: &str) {
        self.failing.insert(table.to_string());
    }

    /// Makes the next commit fail with `reason`.
    pub fn reject_next_commit(&mut self, reason: impl Into<String>) {
        self.reject_commit = Some(reason.into());
    }

    fn key_of(table: &TableDescriptor, values: impl Fn(&str) -> Option<Value>) -> Option<String> {
        let parts: Vec<String> = table
            .key_columns()
            .map(|c| values(&c.name).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(","))
        }
    }
}

impl SchemaOracle for MemoryDatabase {
    fn list_tables(&self) -> Vec<TableDescriptor> {
        self.catalog.list_tables()
    }
}

impl Backend for MemoryDatabase {
    type Error = MemoryError;
}

impl RowSource for MemoryDatabase {
    fn scan_table<V, F>(&self, table: &str, mut visit: F) -> Result<usize, ScanError<MemoryError, V>>
    where
        F: FnMut(Row) -> Result<(), V>,
    {
        if self.failing.contains(table) {
            return Err(ScanError::Query(MemoryError::QueryFailed(table.to_string())));
        }
        let rows = self
            .data
            .get(table)
            .ok_or_else(|| ScanError::Query(MemoryError::NoSuchTable(table.to_string())))?;
        for row in rows {
            visit(row.clone()).map_err(ScanError::Visit)?;
        }
        Ok(rows.len())
    }
}

impl RecordSink for MemoryDatabase {
    fn add(&mut self, table: &TableDescriptor, record: &Record) -> Result<(), MemoryError> {
        if let Some(key) = Self::key_of(table, |name| record.get(name).cloned()) {
            let staged_clash = self.staged.iter().any(|(name, other)| {
                *name == table.name
                    && Self::key_of(table, |c| other.get(c).cloned()).as_deref() == Some(key.as_str())
            });
            if staged_clash {
                return Err(MemoryError::DuplicateKey {
                    type_name: table.type_name.clone(),
                    key,
                });
            }
        }
        self.staged.push((table.name.clone(), record.clone()));
        Ok(())
    }

    fn save_changes(&mut self) -> Result<usize, MemoryError> {
        let staged = std::mem::take(&mut self.staged);
        if let Some(reason) = self.reject_commit.take() {
            return Err(MemoryError::CommitRejected(reason));
        }
        for (name, record) in &staged {
            if !self.data.contains_key(name) {
                return Err(MemoryError::NoSuchTable(name.clone()));
            }
            if let Some(table) = self.catalog.by_table_name(name) {
                for column in table.columns.iter().filter(|c| !c.nullable) {
                    if record.get(&column.name).is_none() {
                        return Err(MemoryError::NotNull {
                            table: name.clone(),
                            column: column.name.clone(),
                        });
                    }
                }
            }
        }
        let count = staged.len();
        for (name, record) in staged {
            self.insert_row(&name, record.to_row());
        }
        Ok(count)
    }

    fn discard_changes(&mut self) {
        self.staged.clear();
    }

    fn pending(&self) -> usize {
        self.staged.len()
    }
}

impl SchemaLifecycle for MemoryDatabase {
    fn ensure_created(&mut self) -> Result<bool, MemoryError> {
        let mut created = false;
        for table in self.catalog.tables() {
            if !self.data.contains_key(&table.name) {
                self.data.insert(table.name.clone(), Vec::new());
                created = true;
            }
        }
        Ok(created)
    }

    fn ensure_deleted(&mut self) -> Result<bool, MemoryError> {
        let mut dropped = false;
        for table in self.catalog.tables() {
            dropped |= self.data.remove(&table.name).is_some();
        }
        Ok(dropped)
    }
}
