//! Scalar values, raw rows, and reconstructed records.
//!
//! A [`Row`] is what a backend hands to the backup engine: column name to
//! value, with NULLs left out. A [`Record`] is what a restore hands back to
//! the backend: one slot per declared column, already coerced to the
//! declared [`ColumnKind`](crate::ColumnKind).

use std::fmt;

use rust_decimal::Decimal;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::types::{ColumnKind, TableDescriptor};

/// A dynamically typed, non-null scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Byte(u8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Decimal(Decimal),
    Bool(bool),
    Text(String),
}

impl Value {
    /// Returns the kind this value naturally belongs to.
    pub fn kind(&self) -> ColumnKind {
        match self {
            Value::Byte(_) => ColumnKind::Byte,
            Value::Int16(_) => ColumnKind::Int16,
            Value::Int32(_) => ColumnKind::Int32,
            Value::Int64(_) => ColumnKind::Int64,
            Value::Float32(_) => ColumnKind::Float32,
            Value::Float64(_) => ColumnKind::Float64,
            Value::Decimal(_) => ColumnKind::Decimal,
            Value::Bool(_) => ColumnKind::Boolean,
            Value::Text(_) => ColumnKind::Text,
        }
    }

    /// Returns the value as an `i64` if it is an integer or boolean.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v)),
            Value::Int16(v) => Some(i64::from(*v)),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            Value::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Returns the text if this is a [`Value::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the value to its JSON-native form.
    ///
    /// Decimals are written as strings so no precision is lost; non-finite
    /// floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Byte(v) => serde_json::Value::from(*v),
            Value::Int16(v) => serde_json::Value::from(*v),
            Value::Int32(v) => serde_json::Value::from(*v),
            Value::Int64(v) => serde_json::Value::from(*v),
            Value::Float32(v) => serde_json::Number::from_f64(f64::from(*v))
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Float64(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Decimal(v) => serde_json::Value::String(v.to_string()),
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Text(v) => serde_json::Value::String(v.clone()),
        }
    }
}

/// Default string rendering, used for spreadsheet cells.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Byte(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Byte(v) => serializer.serialize_u8(*v),
            Value::Int16(v) => serializer.serialize_i16(*v),
            Value::Int32(v) => serializer.serialize_i32(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::Float32(v) if v.is_finite() => serializer.serialize_f32(*v),
            Value::Float64(v) if v.is_finite() => serializer.serialize_f64(*v),
            Value::Float32(_) | Value::Float64(_) => serializer.serialize_none(),
            Value::Decimal(v) => serializer.collect_str(v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Text(v) => serializer.serialize_str(v),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

/// One row as read from a table.
///
/// Fields keep the order in which they were inserted (the result-set column
/// order). NULL columns are simply absent.
///
/// # Examples
///
/// ```
/// use table_backup_core::{Row, Value};
///
/// let mut row = Row::new();
/// row.insert("Id", Value::from("U001"));
/// row.insert("Name", Value::from("User01"));
///
/// assert_eq!(row.get("Id"), Some(&Value::from("U001")));
/// assert_eq!(row.get("Missing"), None);
/// assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"Id":"U001","Name":"User01"}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Sets a field, replacing an earlier value for the same column.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A row reconstructed from an archive and coerced to its table's schema.
///
/// Every declared column has a slot, in declaration order; `None` is NULL.
/// Serializes as a JSON object with explicit nulls, which is also how
/// records are rendered in persistence error messages.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: Vec<(String, Option<Value>)>,
}

impl Record {
    /// Creates an all-NULL record shaped like `table`.
    pub fn empty(table: &TableDescriptor) -> Self {
        Self {
            type_name: table.type_name.clone(),
            fields: table.columns.iter().map(|c| (c.name.clone(), None)).collect(),
        }
    }

    /// Returns the record type name of the owning table.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Sets the slot at `index` (declaration order).
    pub(crate) fn set(&mut self, index: usize, value: Option<Value>) {
        if let Some(slot) = self.fields.get_mut(index) {
            slot.1 = value;
        }
    }

    /// Returns the value of a column, or `None` if it is NULL or undeclared.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    /// Returns every slot in declaration order.
    pub fn values(&self) -> impl Iterator<Item = Option<&Value>> {
        self.fields.iter().map(|(_, v)| v.as_ref())
    }

    /// Returns `(column, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders the record as indented JSON for diagnostics.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{self:?}"))
    }

    /// Converts the record back into a [`Row`], dropping NULLs.
    pub fn to_row(&self) -> Row {
        let mut row = Row::with_capacity(self.fields.len());
        for (name, value) in &self.fields {
            if let Some(value) = value {
                row.insert(name.clone(), value.clone());
            }
        }
        row
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
