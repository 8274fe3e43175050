//! Relational schema introspection: the curator's view of the live database.

use std::future::Future;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::{Decimal, prelude::ToPrimitive as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

// ─── Descriptors ─────────────────────────────────────────────────────────────

/// One column as reported by the relational store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
  pub name:        String,
  /// Declared type, verbatim (e.g. `VARCHAR(100)`, `INTEGER`).
  #[serde(rename = "type")]
  pub data_type:   String,
  pub nullable:    bool,
  pub primary_key: bool,
}

impl ColumnInfo {
  /// `name (TYPE[, NOT NULL][, PRIMARY KEY])`
  pub fn describe(&self) -> String {
    let mut desc = format!("{} ({}", self.name, self.data_type);
    if !self.nullable {
      desc.push_str(", NOT NULL");
    }
    if self.primary_key {
      desc.push_str(", PRIMARY KEY");
    }
    desc.push(')');
    desc
  }
}

/// A table and its columns in declaration order. Derived on demand; never
/// cached beyond a single curation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
  pub name:    String,
  pub columns: Vec<ColumnInfo>,
}

// ─── Values ──────────────────────────────────────────────────────────────────

/// A single cell read from the relational store.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
  Null,
  Bool(bool),
  Integer(i64),
  Real(f64),
  Decimal(Decimal),
  Text(String),
  Date(NaiveDate),
  Timestamp(NaiveDateTime),
  TimestampTz(DateTime<Utc>),
  Bytes(Vec<u8>),
}

impl SqlValue {
  /// JSON-safe form: temporal values as ISO-8601 strings, decimals as
  /// floats, bytes as lowercase hex.
  pub fn to_json(&self) -> Value {
    match self {
      SqlValue::Null => Value::Null,
      SqlValue::Bool(b) => Value::Bool(*b),
      SqlValue::Integer(i) => json!(i),
      SqlValue::Real(f) => json!(f),
      SqlValue::Decimal(d) => d.to_f64().map_or(Value::Null, |f| json!(f)),
      SqlValue::Text(s) => Value::String(s.clone()),
      SqlValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
      SqlValue::Timestamp(ts) => {
        Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
      }
      SqlValue::TimestampTz(ts) => Value::String(ts.to_rfc3339()),
      SqlValue::Bytes(b) => Value::String(hex::encode(b)),
    }
  }
}

/// A sampled row: `(column, value)` pairs in column order.
pub type SampleRow = Vec<(String, SqlValue)>;

/// Normalise a sampled row into a JSON object.
pub fn row_to_json(row: &SampleRow) -> Map<String, Value> {
  row
    .iter()
    .map(|(column, value)| (column.clone(), value.to_json()))
    .collect()
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Read-only introspection of the relational store.
pub trait SchemaSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// User tables, excluding the engine's internal ones.
  fn list_tables(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  fn columns<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<Vec<ColumnInfo>, Self::Error>> + Send + 'a;

  /// Up to `n` rows of `table`, in whatever order the store yields them.
  fn sample_rows<'a>(
    &'a self,
    table: &'a str,
    n: usize,
  ) -> impl Future<Output = Result<Vec<SampleRow>, Self::Error>> + Send + 'a;
}
