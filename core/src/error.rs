//! Error types shared by backup engines and backends.
//!
//! [`CoreError`] classifies fatal failures the way operators need to see
//! them: a value that could not be deserialized, a record the persistence
//! sink rejected, a commit that failed, or an archive without data.

use thiserror::Error;

/// Boxed error from a backend or codec library.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while backing up or restoring tables.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Archived data could not be turned into a record of the target type.
    #[error("failed to deserialize data [{payload}] as type [{type_name}]: {source}")]
    Serialization {
        payload: String,
        type_name: String,
        #[source]
        source: BoxError,
    },

    /// The persistence sink rejected a reconstructed record.
    #[error("failed to write data [{data}] of type [{type_name}] to the database: {source}")]
    Persistence {
        type_name: String,
        data: String,
        #[source]
        source: BoxError,
    },

    /// Committing the staged records failed.
    #[error("failed to save changes: {0}")]
    Commit(#[source] BoxError),

    /// Preparing the target schema failed.
    #[error("schema error: {0}")]
    Schema(#[source] BoxError),

    /// The archive has no data entry. Carries the operator-facing text.
    #[error("{0}")]
    NoData(String),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A catalog failed validation.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
}

impl CoreError {
    /// Wraps a deserialization failure with the offending payload.
    pub fn serialization(
        payload: impl Into<String>,
        type_name: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        CoreError::Serialization {
            payload: payload.into(),
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// Returns `true` for errors raised while parsing archived values.
    pub fn is_serialization(&self) -> bool {
        matches!(self, CoreError::Serialization { .. })
    }
}

/// Convenience alias for results with [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
