//! Error types for the SQLite backend.
//!
//! Provides a unified error type covering database access, identifier
//! validation, staging conflicts and value conversion failures.

use thiserror::Error;

/// Errors that can occur during SQLite backend operations.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// A column value has no scalar representation.
    #[error("unsupported value in column '{column}': {reason}")]
    UnsupportedValue { column: String, reason: String },

    /// Table or column name contains invalid characters.
    #[error("invalid identifier '{0}': must contain only alphanumeric characters and underscores")]
    InvalidIdentifier(String),

    /// A record with the same primary key is already staged.
    #[error("an instance of [{type_name}] with key [{key}] is already tracked")]
    DuplicateKey { type_name: String, key: String },

    /// A staged record was rejected while saving.
    #[error("insert into {table} failed: {source}")]
    InsertFailed {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Catalog could not be used for this database.
    #[error("catalog error: {0}")]
    CatalogError(#[from] table_backup_core::CoreError),
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
