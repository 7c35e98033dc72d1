//! Core types for schema-driven table backups.
//!
//! This crate defines what a backup engine needs to know about a database
//! without depending on any particular one:
//!
//! - [`TableDescriptor`] / [`ColumnDescriptor`] / [`ColumnKind`]: schema
//!   metadata for each persisted record type.
//! - [`Row`] / [`Record`] / [`Value`]: rows as read during backup and
//!   records as reconstructed during restore.
//! - [`coerce_text`] / [`coerce_json`]: conversion of archived fields into
//!   declared column kinds.
//! - [`SchemaOracle`], [`RowSource`], [`RecordSink`], [`SchemaLifecycle`]:
//!   the traits a database backend implements.
//! - [`Catalog`]: an in-memory oracle, loadable from YAML or JSON, and
//!   [`MemoryDatabase`], a backend that keeps everything in memory.
//!
//! # Example
//!
//! ```
//! use table_backup_core::*;
//!
//! let catalog = Catalog::new(vec![
//!     TableDescriptor::new("Books", "demo.model.Book")
//!         .with_column(ColumnDescriptor::new("Id", ColumnKind::Text).primary_key())
//!         .with_column(ColumnDescriptor::new("IsRead", ColumnKind::Boolean)),
//! ]);
//! assert!(validate_tables(catalog.tables()).is_empty());
//!
//! let books = catalog.by_type_name("demo.model.Book").unwrap();
//! let record = record_from_text(books, [("Id", Some("B002")), ("IsRead", Some("1"))]).unwrap();
//! assert_eq!(record.get("IsRead"), Some(&Value::Bool(true)));
//! ```

mod catalog;
mod coerce;
mod error;
mod memory;
mod source;
mod types;
mod validate;
mod value;

pub use catalog::{Catalog, SchemaOracle};
pub use coerce::{
    CoerceError, TextParser, coerce_json, coerce_text, record_from_json, record_from_text,
    text_parser,
};
pub use error::{BoxError, CoreError, Result};
pub use memory::{MemoryDatabase, MemoryError};
pub use source::{Backend, RecordSink, RowSource, ScanError, SchemaLifecycle};
pub use types::{ColumnDescriptor, ColumnKind, TableDescriptor};
pub use validate::{ValidationError, validate_tables};
pub use value::{Record, Row, Value};
