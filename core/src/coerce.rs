//! Coercion of archived field values into declared column kinds.
//!
//! Archives store values as text (spreadsheet cells) or JSON scalars (d3b
//! lines). On restore each field is parsed into the [`ColumnKind`] the live
//! schema declares for it. Every kind has exactly one text parser, selected
//! by [`text_parser`]; JSON scalars are routed through the same parsers so
//! both archive formats accept and reject the same inputs.
//!
//! Failures are never papered over with a default: an unparseable value,
//! including an integer that overflows its declared width, yields a
//! [`CoerceError`] naming the value, the column, and the target kind.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{ColumnDescriptor, ColumnKind, TableDescriptor};
use crate::value::{Record, Value};

/// A field value could not be converted to its column's declared kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert '{value}' to {kind} for column '{column}': {reason}")]
pub struct CoerceError {
    /// Column being populated.
    pub column: String,
    /// Declared kind of the column.
    pub kind: ColumnKind,
    /// Offending source value, as text.
    pub value: String,
    /// Parser diagnostic.
    pub reason: String,
}

/// Parses a non-empty text value into one kind.
pub type TextParser = fn(&str) -> Result<Value, String>;

/// Returns the text parser for a kind.
pub fn text_parser(kind: ColumnKind) -> TextParser {
    match kind {
        ColumnKind::Byte => parse_byte,
        ColumnKind::Int16 => parse_int16,
        ColumnKind::Int32 => parse_int32,
        ColumnKind::Int64 => parse_int64,
        ColumnKind::Float32 => parse_float32,
        ColumnKind::Float64 => parse_float64,
        ColumnKind::Decimal => parse_decimal,
        ColumnKind::Boolean => parse_boolean,
        ColumnKind::Text => parse_text,
    }
}

fn parse_byte(s: &str) -> Result<Value, String> {
    s.trim().parse().map(Value::Byte).map_err(|e| e.to_string())
}

fn parse_int16(s: &str) -> Result<Value, String> {
    s.trim().parse().map(Value::Int16).map_err(|e| e.to_string())
}

fn parse_int32(s: &str) -> Result<Value, String> {
    s.trim().parse().map(Value::Int32).map_err(|e| e.to_string())
}

fn parse_int64(s: &str) -> Result<Value, String> {
    s.trim().parse().map(Value::Int64).map_err(|e| e.to_string())
}

fn parse_float32(s: &str) -> Result<Value, String> {
    s.trim().parse().map(Value::Float32).map_err(|e| e.to_string())
}

fn parse_float64(s: &str) -> Result<Value, String> {
    s.trim().parse().map(Value::Float64).map_err(|e| e.to_string())
}

fn parse_decimal(s: &str) -> Result<Value, String> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map(Value::Decimal)
        .map_err(|e| e.to_string())
}

fn parse_boolean(s: &str) -> Result<Value, String> {
    match s.trim() {
        "0" => Ok(Value::Bool(false)),
        "1" => Ok(Value::Bool(true)),
        other if other.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        other if other.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        _ => Err("expected 0, 1, true or false".to_string()),
    }
}

fn parse_text(s: &str) -> Result<Value, String> {
    Ok(Value::Text(s.to_string()))
}

/// Coerces a textual field (e.g. a spreadsheet cell).
///
/// Absent and empty text are NULL for every kind.
///
/// # Examples
///
/// ```
/// use table_backup_core::{coerce_text, ColumnDescriptor, ColumnKind, Value};
///
/// let flag = ColumnDescriptor::new("IsRead", ColumnKind::Boolean);
/// assert_eq!(coerce_text(&flag, Some("1")).unwrap(), Some(Value::Bool(true)));
/// assert_eq!(coerce_text(&flag, Some("False")).unwrap(), Some(Value::Bool(false)));
/// assert_eq!(coerce_text(&flag, Some("")).unwrap(), None);
/// assert!(coerce_text(&flag, Some("yes")).is_err());
/// ```
pub fn coerce_text(
    column: &ColumnDescriptor,
    text: Option<&str>,
) -> Result<Option<Value>, CoerceError> {
    match text {
        None | Some("") => Ok(None),
        Some(s) => text_parser(column.kind)(s)
            .map(Some)
            .map_err(|reason| CoerceError {
                column: column.name.clone(),
                kind: column.kind,
                value: s.to_string(),
                reason,
            }),
    }
}

/// Coerces a JSON scalar (a d3b field).
///
/// `null` is NULL. Strings destined for text columns are kept verbatim, so
/// an empty string survives; for other kinds strings, numbers and booleans
/// go through the kind's text parser. Arrays and objects are rejected.
pub fn coerce_json(
    column: &ColumnDescriptor,
    value: &serde_json::Value,
) -> Result<Option<Value>, CoerceError> {
    let text = match value {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::String(s) if column.kind == ColumnKind::Text => {
            return Ok(Some(Value::Text(s.clone())));
        }
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            return Err(CoerceError {
                column: column.name.clone(),
                kind: column.kind,
                value: value.to_string(),
                reason: "arrays and objects are not scalar values".to_string(),
            });
        }
    };
    coerce_text(column, Some(&text))
}

/// Builds a record from a parsed JSON object.
///
/// Keys are matched to columns by name; undeclared keys are ignored and
/// missing keys are NULL.
pub fn record_from_json(
    table: &TableDescriptor,
    object: &serde_json::Map<String, serde_json::Value>,
) -> Result<Record, CoerceError> {
    let mut record = Record::empty(table);
    for (index, column) in table.columns.iter().enumerate() {
        if let Some(value) = object.get(&column.name) {
            record.set(index, coerce_json(column, value)?);
        }
    }
    Ok(record)
}

/// Builds a record from `(column name, cell text)` pairs.
///
/// Cells whose column is not declared by `table` are ignored; declared
/// columns without a cell are NULL.
///
/// # Examples
///
/// ```
/// use table_backup_core::{record_from_text, ColumnDescriptor, ColumnKind, TableDescriptor, Value};
///
/// let books = TableDescriptor::new("Books", "demo.Book")
///     .with_column(ColumnDescriptor::new("Id", ColumnKind::Text).primary_key())
///     .with_column(ColumnDescriptor::new("ReadCount", ColumnKind::Int32));
///
/// let record = record_from_text(&books, [("Id", Some("B001")), ("ReadCount", Some("99"))]).unwrap();
/// assert_eq!(record.get("ReadCount"), Some(&Value::Int32(99)));
/// ```
pub fn record_from_text<'a, I>(table: &TableDescriptor, cells: I) -> Result<Record, CoerceError>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let mut record = Record::empty(table);
    for (name, text) in cells {
        if let Some(index) = table.column_index(name) {
            record.set(index, coerce_text(&table.columns[index], text)?);
        }
    }
    Ok(record)
}
