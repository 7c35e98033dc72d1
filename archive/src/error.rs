//! Error types for archive encoding, decoding, and orchestration.

use thiserror::Error;

use table_backup_core::CoreError;

use crate::codec::ArchiveFormat;

/// Errors that can occur while writing or reading an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Classified engine failure (serialization, persistence, no data, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Stream I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Zip container failure.
    #[error("zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// Workbook export failure.
    #[error("workbook write error: {0}")]
    WorkbookWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Workbook import failure.
    #[error("workbook read error: {0}")]
    WorkbookRead(#[from] calamine::XlsxError),

    /// JSON serialization failure while encoding.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing failure while loading text resources.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The codec does not implement the requested direction.
    #[error("{format} archives do not support {operation}")]
    Unsupported {
        format: ArchiveFormat,
        operation: &'static str,
    },

    /// A table query failed after some of its rows were already written.
    #[error("reading table {table} failed mid-scan: {source}")]
    ScanAborted {
        table: String,
        #[source]
        source: table_backup_core::BoxError,
    },

    /// A schema update stopped before dropping anything because these
    /// tables could not be backed up.
    #[error("schema update aborted: tables could not be backed up: {}", tables.join(", "))]
    IncompleteBackup { tables: Vec<String> },

    /// Unrecognized format name or file extension.
    #[error("unknown archive format: {0}")]
    UnknownFormat(String),
}

impl ArchiveError {
    /// Returns the classified engine error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            ArchiveError::Core(e) => Some(e),
            _ => None,
        }
    }
}

/// Convenience alias for results with [`ArchiveError`].
pub type Result<T> = std::result::Result<T, ArchiveError>;
