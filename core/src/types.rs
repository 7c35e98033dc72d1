//! Table and column descriptors.
//!
//! This module defines the schema metadata handed to the backup engine by
//! the host: which tables exist, which record type each one maps to, and the
//! declared scalar kind of every column. The types are designed for
//! serialization with [`serde`] so a catalog can be declared in YAML or JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared scalar kind of a column.
///
/// Restores coerce every archived field into the kind declared by the live
/// schema, so this enum is the closed set of types the engine understands.
///
/// # Examples
///
/// ```
/// use table_backup_core::ColumnKind;
///
/// let kind = ColumnKind::default();
/// assert_eq!(kind, ColumnKind::Text);
/// assert_eq!(ColumnKind::Int32.to_string(), "int32");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Unsigned 8-bit integer.
    Byte,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Single-precision float.
    Float32,
    /// Double-precision float.
    Float64,
    /// Arbitrary-precision decimal.
    Decimal,
    /// Boolean, archived as `0`/`1` or `true`/`false`.
    Boolean,
    /// Free text (the default).
    #[default]
    Text,
}

impl ColumnKind {
    /// Every supported kind, in declaration order.
    pub const ALL: [ColumnKind; 9] = [
        ColumnKind::Byte,
        ColumnKind::Int16,
        ColumnKind::Int32,
        ColumnKind::Int64,
        ColumnKind::Float32,
        ColumnKind::Float64,
        ColumnKind::Decimal,
        ColumnKind::Boolean,
        ColumnKind::Text,
    ];

    /// Returns the lowercase name used in catalog files and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnKind::Byte => "byte",
            ColumnKind::Int16 => "int16",
            ColumnKind::Int32 => "int32",
            ColumnKind::Int64 => "int64",
            ColumnKind::Float32 => "float32",
            ColumnKind::Float64 => "float64",
            ColumnKind::Decimal => "decimal",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Text => "text",
        }
    }

    /// Returns `true` for the integer kinds.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ColumnKind::Byte | ColumnKind::Int16 | ColumnKind::Int32 | ColumnKind::Int64
        )
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema for a single column.
///
/// Use [`ColumnDescriptor::new`] and the builder methods to declare columns.
///
/// # Examples
///
/// ```
/// use table_backup_core::{ColumnDescriptor, ColumnKind};
///
/// let id = ColumnDescriptor::new("Id", ColumnKind::Text).primary_key();
/// assert!(id.primary_key);
/// assert!(!id.nullable);
///
/// let count = ColumnDescriptor::new("ReadCount", ColumnKind::Int32).not_null();
/// assert!(!count.nullable);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name as it appears in the database.
    pub name: String,
    /// Declared scalar kind.
    #[serde(default)]
    pub kind: ColumnKind,
    /// Whether the column is part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether the column accepts NULL.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnDescriptor {
    /// Creates a nullable, non-key column.
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            primary_key: false,
            nullable: true,
        }
    }

    /// Marks the column as (part of) the primary key. Key columns are not null.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Marks the column as `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Schema for one persisted record type.
///
/// A table descriptor pairs the physical table name with the fully-qualified
/// name of the record type stored in it. Archive markers refer to tables by
/// type name, workbook sheets by table name.
///
/// # Examples
///
/// ```
/// use table_backup_core::{ColumnDescriptor, ColumnKind, TableDescriptor};
///
/// let users = TableDescriptor::new("Users", "demo.model.User")
///     .with_column(ColumnDescriptor::new("Id", ColumnKind::Text).primary_key())
///     .with_column(ColumnDescriptor::new("Name", ColumnKind::Text));
///
/// assert_eq!(users.short_type_name(), "User");
/// assert_eq!(users.display_label(), "User(Users)");
/// assert_eq!(users.column("Name").unwrap().kind, ColumnKind::Text);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Physical table name.
    pub name: String,
    /// Fully-qualified record type name, written to archive markers.
    pub type_name: String,
    /// Human-readable name shown in progress labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Columns in declaration order.
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    /// Creates a descriptor without columns.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            display_name: None,
            columns: Vec::new(),
        }
    }

    /// Appends a column.
    pub fn with_column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Looks up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the position of a column in declaration order.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Returns the primary-key columns in declaration order.
    pub fn key_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    /// Returns the last segment of the type name (after `.` or `::`).
    pub fn short_type_name(&self) -> &str {
        let name = self.type_name.as_str();
        let after_path = name.rsplit("::").next().unwrap_or(name);
        after_path.rsplit('.').next().unwrap_or(after_path)
    }

    /// Returns the label used in progress notifications: the display name
    /// (or short type name) followed by the table name in parentheses.
    pub fn display_label(&self) -> String {
        let display = match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.short_type_name(),
        };
        format!("{display}({})", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_type_name_handles_dotted_and_rust_paths() {
        assert_eq!(TableDescriptor::new("Books", "app.model.Book").short_type_name(), "Book");
        assert_eq!(TableDescriptor::new("Books", "app::model::Book").short_type_name(), "Book");
        assert_eq!(TableDescriptor::new("Books", "Book").short_type_name(), "Book");
    }

    #[test]
    fn test_display_label_prefers_display_name() {
        let table = TableDescriptor::new("Books", "app.Book").with_display_name("Book Model");
        assert_eq!(table.display_label(), "Book Model(Books)");

        let blank = TableDescriptor::new("Books", "app.Book").with_display_name("  ");
        assert_eq!(blank.display_label(), "Book(Books)");
    }

    #[test]
    fn test_column_kind_serde_names() {
        for kind in ColumnKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            let back: ColumnKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn test_column_defaults_from_yaml() {
        let column: ColumnDescriptor = serde_yaml::from_str("name: Title").unwrap();
        assert_eq!(column.kind, ColumnKind::Text);
        assert!(column.nullable);
        assert!(!column.primary_key);
    }

    #[test]
    fn test_key_columns() {
        let table = TableDescriptor::new("Pairs", "app.Pair")
            .with_column(ColumnDescriptor::new("A", ColumnKind::Int32).primary_key())
            .with_column(ColumnDescriptor::new("B", ColumnKind::Int32).primary_key())
            .with_column(ColumnDescriptor::new("Note", ColumnKind::Text));
        let keys: Vec<_> = table.key_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(table.column_index("Note"), Some(2));
    }
}
