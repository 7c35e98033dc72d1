//! Conversion between SQLite values and engine values.
//!
//! Rows are read with the storage class SQLite reports for each cell
//! (INTEGER as `int64`, REAL as `float64`, TEXT as `text`); the restore side
//! coerces them into declared kinds. Values are written back with the
//! storage class of their declared SQL type, so booleans become 0/1 and
//! decimals keep their exact text.

use rusqlite::types::{Value as SqlValue, ValueRef};
use table_backup_core::{ColumnKind, Row, Value};

use crate::error::{Result, SqliteError};

/// Converts one cell read from a result set. NULL is `None`.
pub(crate) fn value_from_sql(column: &str, cell: ValueRef<'_>) -> Result<Option<Value>> {
    match cell {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(v) => Ok(Some(Value::Int64(v))),
        ValueRef::Real(v) => Ok(Some(Value::Float64(v))),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| Some(Value::Text(s.to_string())))
            .map_err(|e| SqliteError::UnsupportedValue {
                column: column.to_string(),
                reason: e.to_string(),
            }),
        ValueRef::Blob(_) => Err(SqliteError::UnsupportedValue {
            column: column.to_string(),
            reason: "BLOB values cannot be archived".to_string(),
        }),
    }
}

/// Converts a result-set row, skipping NULL cells.
pub(crate) fn row_from_sql(sql_row: &rusqlite::Row<'_>, columns: &[String]) -> Result<Row> {
    let mut row = Row::with_capacity(columns.len());
    for (index, name) in columns.iter().enumerate() {
        if let Some(value) = value_from_sql(name, sql_row.get_ref(index)?)? {
            row.insert(name.clone(), value);
        }
    }
    Ok(row)
}

/// Converts a value for binding as a statement parameter.
pub(crate) fn value_to_sql(value: Option<&Value>) -> SqlValue {
    match value {
        None => SqlValue::Null,
        Some(Value::Byte(v)) => SqlValue::Integer(i64::from(*v)),
        Some(Value::Int16(v)) => SqlValue::Integer(i64::from(*v)),
        Some(Value::Int32(v)) => SqlValue::Integer(i64::from(*v)),
        Some(Value::Int64(v)) => SqlValue::Integer(*v),
        Some(Value::Float32(v)) => SqlValue::Real(f64::from(*v)),
        Some(Value::Float64(v)) => SqlValue::Real(*v),
        Some(Value::Decimal(v)) => SqlValue::Text(v.to_string()),
        Some(Value::Bool(v)) => SqlValue::Integer(i64::from(*v)),
        Some(Value::Text(v)) => SqlValue::Text(v.clone()),
    }
}

/// Maps a declared column type onto a column kind.
///
/// The type names generated by [`sql_type`](crate::schema::sql_type) map
/// back to their original kinds. Any other declaration maps to the kind
/// that holds every value its SQLite affinity can store: INTEGER affinity
/// is `int64`, REAL affinity is `float64`, and everything else (including
/// NUMERIC affinity and missing types) is text.
pub fn kind_from_decl(decl: Option<&str>) -> ColumnKind {
    let decl = decl.unwrap_or_default().trim().to_ascii_uppercase();
    let base = decl.split('(').next().unwrap_or_default().trim();
    match base {
        "UINT8" => ColumnKind::Byte,
        "INT16" => ColumnKind::Int16,
        "INT32" => ColumnKind::Int32,
        "FLOAT32" => ColumnKind::Float32,
        "DECIMAL_TEXT" => ColumnKind::Decimal,
        "BOOL_INT" => ColumnKind::Boolean,
        _ if base.contains("INT") => ColumnKind::Int64,
        _ if base.contains("REAL") || base.contains("FLOA") || base.contains("DOUB") => {
            ColumnKind::Float64
        }
        _ => ColumnKind::Text,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::schema::sql_type;

    #[test]
    fn test_generated_types_introspect_to_their_kind() {
        for kind in ColumnKind::ALL {
            assert_eq!(kind_from_decl(Some(sql_type(kind))), kind, "{kind}");
        }
    }

    #[test]
    fn test_foreign_declared_types() {
        assert_eq!(kind_from_decl(Some("INTEGER")), ColumnKind::Int64);
        assert_eq!(kind_from_decl(Some("varchar(255)")), ColumnKind::Text);
        assert_eq!(kind_from_decl(Some("DECIMAL(18, 2)")), ColumnKind::Text);
        assert_eq!(kind_from_decl(Some("BOOLEAN")), ColumnKind::Text);
        assert_eq!(kind_from_decl(Some("REAL")), ColumnKind::Float64);
        assert_eq!(kind_from_decl(Some("CLOB")), ColumnKind::Text);
        assert_eq!(kind_from_decl(Some("BLOB")), ColumnKind::Text);
        assert_eq!(kind_from_decl(Some("")), ColumnKind::Text);
        assert_eq!(kind_from_decl(None), ColumnKind::Text);
    }

    #[test]
    fn test_generic_widths_are_not_narrowed() {
        for decl in ["INT", "TINYINT", "SMALLINT", "MEDIUMINT", "INT2", "INT8", "BIGINT"] {
            assert_eq!(kind_from_decl(Some(decl)), ColumnKind::Int64, "{decl}");
        }
        for decl in ["FLOAT", "DOUBLE PRECISION", "float(10)"] {
            assert_eq!(kind_from_decl(Some(decl)), ColumnKind::Float64, "{decl}");
        }
    }

    #[test]
    fn test_value_to_sql() {
        assert_eq!(value_to_sql(None), SqlValue::Null);
        assert_eq!(value_to_sql(Some(&Value::Bool(true))), SqlValue::Integer(1));
        assert_eq!(value_to_sql(Some(&Value::Byte(200))), SqlValue::Integer(200));
        assert_eq!(
            value_to_sql(Some(&Value::Decimal(Decimal::new(1050, 2)))),
            SqlValue::Text("10.50".to_string())
        );
    }

    #[test]
    fn test_value_from_sql() {
        assert_eq!(value_from_sql("c", ValueRef::Null).unwrap(), None);
        assert_eq!(
            value_from_sql("c", ValueRef::Integer(7)).unwrap(),
            Some(Value::Int64(7))
        );
        assert_eq!(
            value_from_sql("c", ValueRef::Text(b"abc")).unwrap(),
            Some(Value::from("abc"))
        );
        assert!(matches!(
            value_from_sql("c", ValueRef::Blob(&[1, 2])),
            Err(SqliteError::UnsupportedValue { .. })
        ));
    }
}
