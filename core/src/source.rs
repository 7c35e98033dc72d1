//! Backend traits: row source, persistence sink, and schema lifecycle.
//!
//! These are the seams between the backup engine and a concrete database.
//! A backend implements [`SchemaOracle`](crate::SchemaOracle) plus whichever
//! of the traits below the operations it supports need:
//!
//! - backup: [`RowSource`] and [`SchemaLifecycle`]
//! - check: nothing beyond the oracle
//! - restore: [`RecordSink`]
//!
//! All traits share the backend's error type through [`Backend`].

use std::fmt;

use crate::types::TableDescriptor;
use crate::value::{Record, Row};

/// Common supertrait carrying the backend's error type.
pub trait Backend {
    type Error: std::error::Error + Send + Sync + 'static;
}

/// Failure of a table scan.
///
/// Distinguishes a query the backend could not run, which a backup treats
/// as a skippable table, from an error raised by the row visitor, which
/// aborts the backup.
#[derive(Debug)]
pub enum ScanError<Q, V> {
    /// The backend failed to query or read the table.
    Query(Q),
    /// The visitor rejected a row.
    Visit(V),
}

impl<Q: fmt::Display, V: fmt::Display> fmt::Display for ScanError<Q, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Query(e) => write!(f, "query failed: {e}"),
            ScanError::Visit(e) => write!(f, "{e}"),
        }
    }
}

impl<Q, V> std::error::Error for ScanError<Q, V>
where
    Q: std::error::Error + 'static,
    V: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Query(e) => Some(e),
            ScanError::Visit(e) => Some(e),
        }
    }
}

/// Streams the rows of one table.
pub trait RowSource: Backend {
    /// Runs a full-table select against `table` and feeds every row to
    /// `visit`, in result-set order. Returns the number of rows visited.
    ///
    /// `table` is the name to query, which may differ from the descriptor's
    /// table name when the caller remaps names. The result-set resource must
    /// be released before returning, on success and on every error path.
    fn scan_table<V, F>(&self, table: &str, visit: F) -> Result<usize, ScanError<Self::Error, V>>
    where
        F: FnMut(Row) -> Result<(), V>;
}

/// Accepts reconstructed records and commits them in one unit.
pub trait RecordSink: Backend {
    /// Stages a record for insertion into `table`.
    ///
    /// Fails if the record clashes with one already staged, so the caller
    /// can still render the rejected record in its diagnostics.
    fn add(&mut self, table: &TableDescriptor, record: &Record) -> Result<(), Self::Error>;

    /// Commits every staged record. Returns the number of records written.
    /// On failure nothing is written and the staged records are dropped.
    fn save_changes(&mut self) -> Result<usize, Self::Error>;

    /// Drops every staged record without writing.
    fn discard_changes(&mut self);

    /// Number of records currently staged.
    fn pending(&self) -> usize;
}

/// Creates and drops the physical schema described by the oracle.
pub trait SchemaLifecycle: Backend {
    /// Creates missing tables. Returns `true` if anything was created.
    fn ensure_created(&mut self) -> Result<bool, Self::Error>;

    /// Drops the schema's tables. Returns `true` if anything was dropped.
    fn ensure_deleted(&mut self) -> Result<bool, Self::Error>;
}
