//! Schema oracle and the catalog of table descriptors.
//!
//! The backup engine never reflects over record types. Instead the host
//! hands it a [`SchemaOracle`], which lists the tables of the live schema.
//! [`Catalog`] is the in-memory oracle: a list of descriptors with lookups
//! by type name (archive markers) and table name (workbook sheets). It can
//! be declared in YAML or JSON.
//!
//! # Example YAML
//!
//! ```yaml
//! tables:
//!   - name: Users
//!     type_name: demo.model.User
//!     columns:
//!       - { name: Id, kind: text, primary_key: true }
//!       - { name: Name, kind: text }
//!   - name: Books
//!     type_name: demo.model.Book
//!     display_name: Book Model
//!     columns:
//!       - { name: Id, kind: text, primary_key: true }
//!       - { name: ReadCount, kind: int32, nullable: false }
//!       - { name: IsRead, kind: boolean }
//! ```

use std::collections::HashMap;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::types::{ColumnDescriptor, TableDescriptor};
use crate::validate::validate_tables;

/// Describes the live schema to the backup engine.
///
/// Only [`list_tables`](Self::list_tables) is required; the other lookups
/// have default implementations in terms of it.
pub trait SchemaOracle {
    /// Lists every table in schema-enumeration order.
    fn list_tables(&self) -> Vec<TableDescriptor>;

    /// Returns the columns of a table, by table name.
    fn columns_of(&self, table: &str) -> Option<Vec<ColumnDescriptor>> {
        self.list_tables()
            .into_iter()
            .find(|t| t.name == table)
            .map(|t| t.columns)
    }

    /// Returns the progress label of a table, by table name.
    fn display_name_of(&self, table: &str) -> Option<String> {
        self.list_tables()
            .iter()
            .find(|t| t.name == table)
            .map(TableDescriptor::display_label)
    }
}

/// An ordered set of table descriptors with name lookups.
///
/// # Examples
///
/// ```
/// use table_backup_core::{Catalog, ColumnDescriptor, ColumnKind, TableDescriptor};
///
/// let catalog = Catalog::new(vec![
///     TableDescriptor::new("Users", "demo.User")
///         .with_column(ColumnDescriptor::new("Id", ColumnKind::Text).primary_key()),
/// ]);
///
/// assert_eq!(catalog.len(), 1);
/// assert!(catalog.by_type_name("demo.User").is_some());
/// assert!(catalog.by_table_name("Users").is_some());
/// assert!(catalog.by_type_name("demo.Missing").is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "CatalogFile", into = "CatalogFile")]
pub struct Catalog {
    tables: Vec<TableDescriptor>,
    by_type: HashMap<String, usize>,
    by_table: HashMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tables: Vec<TableDescriptor>,
}

impl From<CatalogFile> for Catalog {
    fn from(file: CatalogFile) -> Self {
        Catalog::new(file.tables)
    }
}

impl From<Catalog> for CatalogFile {
    fn from(catalog: Catalog) -> Self {
        CatalogFile {
            tables: catalog.tables,
        }
    }
}

impl Catalog {
    /// Builds a catalog. Later duplicates of a type or table name shadow
    /// earlier ones in lookups; use [`validate`](Self::validate) to reject them.
    pub fn new(tables: Vec<TableDescriptor>) -> Self {
        let mut by_type = HashMap::with_capacity(tables.len());
        let mut by_table = HashMap::with_capacity(tables.len());
        for (index, table) in tables.iter().enumerate() {
            by_type.insert(table.type_name.clone(), index);
            by_table.insert(table.name.clone(), index);
        }
        Self {
            tables,
            by_type,
            by_table,
        }
    }

    /// Snapshots the tables of any oracle.
    pub fn from_oracle(oracle: &(impl SchemaOracle + ?Sized)) -> Self {
        Self::new(oracle.list_tables())
    }

    /// Loads a catalog from a YAML or JSON file (by extension; YAML otherwise)
    /// and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](CoreError::IoError) if the file cannot be read,
    /// [`YamlError`](CoreError::YamlError) or [`JsonError`](CoreError::JsonError)
    /// if parsing fails, and [`InvalidCatalog`](CoreError::InvalidCatalog) if
    /// validation finds a problem.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        let catalog: Catalog = if is_json(path) {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Saves the catalog as YAML or JSON (by extension).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(std::fs::File::create(path)?);
        if is_json(path) {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            serde_yaml::to_writer(writer, self)?;
        }
        Ok(())
    }

    /// Fails with the first validation problem, if any.
    pub fn validate(&self) -> Result<()> {
        match validate_tables(&self.tables).into_iter().next() {
            Some(err) => Err(CoreError::InvalidCatalog(err.to_string())),
            None => Ok(()),
        }
    }

    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Looks up a table by record type name (archive marker).
    pub fn by_type_name(&self, type_name: &str) -> Option<&TableDescriptor> {
        self.by_type.get(type_name).map(|&i| &self.tables[i])
    }

    /// Looks up a table by physical table name (worksheet name).
    pub fn by_table_name(&self, name: &str) -> Option<&TableDescriptor> {
        self.by_table.get(name).map(|&i| &self.tables[i])
    }

    /// Looks up a table by either name.
    pub fn find(&self, name: &str) -> Option<&TableDescriptor> {
        self.by_type_name(name).or_else(|| self.by_table_name(name))
    }
}

impl SchemaOracle for Catalog {
    fn list_tables(&self) -> Vec<TableDescriptor> {
        self.tables.clone()
    }

    fn columns_of(&self, table: &str) -> Option<Vec<ColumnDescriptor>> {
        self.by_table_name(table).map(|t| t.columns.clone())
    }

    fn display_name_of(&self, table: &str) -> Option<String> {
        self.by_table_name(table).map(TableDescriptor::display_label)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
