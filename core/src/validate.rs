//! Catalog validation.
//!
//! Catches structural problems in a set of table descriptors before a run
//! starts: empty names, duplicate tables or record types, duplicate columns.
//! A catalog with two tables claiming the same record type would make
//! archive markers ambiguous on restore.
//!
//! # Examples
//!
//! ```
//! use table_backup_core::*;
//!
//! let ok = vec![TableDescriptor::new("Users", "demo.User")
//!     .with_column(ColumnDescriptor::new("Id", ColumnKind::Text))];
//! assert!(validate_tables(&ok).is_empty());
//!
//! let dup = vec![
//!     TableDescriptor::new("Users", "demo.User"),
//!     TableDescriptor::new("People", "demo.User"),
//! ];
//! assert!(matches!(validate_tables(&dup)[0], ValidationError::DuplicateTypeName(_)));
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::types::TableDescriptor;

/// Catalog validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Table name is empty or whitespace-only.
    #[error("table name cannot be empty")]
    EmptyTableName,
    /// Record type name is empty or whitespace-only.
    #[error("type name cannot be empty for table: {0}")]
    EmptyTypeName(String),
    /// Column name is empty or whitespace-only.
    #[error("column name cannot be empty in table: {0}")]
    EmptyColumnName(String),
    /// Type names must not start with the marker sigil.
    #[error("type name cannot start with '#': {0}")]
    InvalidTypeName(String),
    /// Two tables share a name.
    #[error("duplicate table: {0}")]
    DuplicateTable(String),
    /// Two tables map the same record type.
    #[error("duplicate type name: {0}")]
    DuplicateTypeName(String),
    /// Two columns in the same table share a name.
    #[error("duplicate column '{column}' in table: {table}")]
    DuplicateColumn { table: String, column: String },
}

/// Validates a list of table descriptors, returning every problem found.
pub fn validate_tables(tables: &[TableDescriptor]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen_tables: HashSet<&str> = HashSet::new();
    let mut seen_types: HashSet<&str> = HashSet::new();

    for table in tables {
        if table.name.trim().is_empty() {
            errors.push(ValidationError::EmptyTableName);
            continue;
        }
        if !seen_tables.insert(table.name.as_str()) {
            errors.push(ValidationError::DuplicateTable(table.name.clone()));
        }

        if table.type_name.trim().is_empty() {
            errors.push(ValidationError::EmptyTypeName(table.name.clone()));
        } else if table.type_name.starts_with('#') {
            errors.push(ValidationError::InvalidTypeName(table.type_name.clone()));
        } else if !seen_types.insert(table.type_name.as_str()) {
            errors.push(ValidationError::DuplicateTypeName(table.type_name.clone()));
        }

        let mut seen_columns: HashSet<&str> = HashSet::new();
        for column in &table.columns {
            if column.name.trim().is_empty() {
                errors.push(ValidationError::EmptyColumnName(table.name.clone()));
            } else if !seen_columns.insert(column.name.as_str()) {
                errors.push(ValidationError::DuplicateColumn {
                    table: table.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnDescriptor, ColumnKind};

    #[test]
    fn test_empty_names() {
        let tables = vec![
            TableDescriptor::new(" ", "demo.A"),
            TableDescriptor::new("B", ""),
            TableDescriptor::new("C", "demo.C").with_column(ColumnDescriptor::new("", ColumnKind::Text)),
        ];
        let errors = validate_tables(&tables);
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyTableName,
                ValidationError::EmptyTypeName("B".into()),
                ValidationError::EmptyColumnName("C".into()),
            ]
        );
    }

    #[test]
    fn test_duplicates() {
        let tables = vec![
            TableDescriptor::new("A", "demo.A")
                .with_column(ColumnDescriptor::new("x", ColumnKind::Text))
                .with_column(ColumnDescriptor::new("x", ColumnKind::Int32)),
            TableDescriptor::new("A", "demo.Other"),
        ];
        let errors = validate_tables(&tables);
        assert!(errors.contains(&ValidationError::DuplicateColumn {
            table: "A".into(),
            column: "x".into()
        }));
        assert!(errors.contains(&ValidationError::DuplicateTable("A".into())));
    }

    #[test]
    fn test_marker_sigil_rejected() {
        let errors = validate_tables(&[TableDescriptor::new("A", "#A")]);
        assert_eq!(errors, vec![ValidationError::InvalidTypeName("#A".into())]);
    }
}
