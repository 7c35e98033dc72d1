//! SQL generation from a table catalog.
//!
//! Generates `CREATE TABLE` and `DROP TABLE` statements for every table of a
//! [`Catalog`], plus the parameterized insert used when saving records.
//!
//! # Column types
//!
//! Each [`ColumnKind`] maps to a declared SQL type whose SQLite affinity
//! keeps values exact. The narrow kinds get type names no other tool
//! generates, so [`kind_from_decl`](crate::convert::kind_from_decl) maps
//! them back to the same kind without narrowing foreign `INT` or `FLOAT`
//! columns:
//!
//! | Kind      | Declared type  | Stored as      |
//! |-----------|----------------|----------------|
//! | `byte`    | `UINT8`        | INTEGER        |
//! | `int16`   | `INT16`        | INTEGER        |
//! | `int32`   | `INT32`        | INTEGER        |
//! | `int64`   | `BIGINT`       | INTEGER        |
//! | `float32` | `FLOAT32`      | REAL           |
//! | `float64` | `DOUBLE`       | REAL           |
//! | `decimal` | `DECIMAL_TEXT` | TEXT           |
//! | `boolean` | `BOOL_INT`     | INTEGER 0/1    |
//! | `text`    | `TEXT`         | TEXT           |
//!
//! # Identifiers
//!
//! Table and column names in DDL must contain only alphanumeric characters
//! and underscores; they are additionally double-quoted everywhere.

use table_backup_core::{Catalog, ColumnKind, TableDescriptor};

use crate::error::{Result, SqliteError};

/// Validates that an identifier contains only alphanumeric characters and underscores.
pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SqliteError::InvalidIdentifier(name.to_string()));
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(SqliteError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// Validates every table and column name of a catalog.
pub(crate) fn validate_catalog(catalog: &Catalog) -> Result<()> {
    for table in catalog.tables() {
        validate_identifier(&table.name)?;
        for column in &table.columns {
            validate_identifier(&column.name)?;
        }
    }
    Ok(())
}

/// Double-quotes an identifier. A dot-qualified name (`schema.table`) is
/// quoted per segment.
pub fn quote_identifier(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Returns the declared SQL type for a column kind.
pub fn sql_type(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Byte => "UINT8",
        ColumnKind::Int16 => "INT16",
        ColumnKind::Int32 => "INT32",
        ColumnKind::Int64 => "BIGINT",
        ColumnKind::Float32 => "FLOAT32",
        ColumnKind::Float64 => "DOUBLE",
        ColumnKind::Decimal => "DECIMAL_TEXT",
        ColumnKind::Boolean => "BOOL_INT",
        ColumnKind::Text => "TEXT",
    }
}

fn create_table_sql(table: &TableDescriptor) -> String {
    let mut defs: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
            let not_null = if c.nullable { "" } else { " NOT NULL" };
            format!("    {} {}{not_null}", quote_identifier(&c.name), sql_type(c.kind))
        })
        .collect();
    let keys: Vec<String> = table.key_columns().map(|c| quote_identifier(&c.name)).collect();
    if !keys.is_empty() {
        defs.push(format!("    PRIMARY KEY ({})", keys.join(", ")));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);\n",
        quote_identifier(&table.name),
        defs.join(",\n")
    )
}

/// Generates `CREATE TABLE IF NOT EXISTS` statements for every table.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidIdentifier`] if a table or column name
/// contains characters other than alphanumerics and underscores.
pub fn generate_create_sql(catalog: &Catalog) -> Result<String> {
    validate_catalog(catalog)?;
    Ok(catalog.tables().iter().map(create_table_sql).collect())
}

/// Generates `DROP TABLE IF EXISTS` statements in reverse catalog order.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidIdentifier`] if a table name is invalid.
pub fn generate_drop_sql(catalog: &Catalog) -> Result<String> {
    validate_catalog(catalog)?;
    Ok(catalog
        .tables()
        .iter()
        .rev()
        .map(|t| format!("DROP TABLE IF EXISTS {};\n", quote_identifier(&t.name)))
        .collect())
}

/// Generates the insert statement for a table, one parameter per column in
/// the given order.
pub(crate) fn insert_sql<'a>(table: &str, columns: impl IntoIterator<Item = &'a str>) -> String {
    let columns: Vec<String> = columns.into_iter().map(quote_identifier).collect();
    let params: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        columns.join(", "),
        params.join(", ")
    )
}

/// Generates a full-table select.
pub(crate) fn select_all_sql(table: &str) -> String {
    format!("SELECT * FROM {}", quote_identifier(table))
}
