//! Encoding and decoding helpers between core types and SQLite columns.
//!
//! Embeddings are stored as little-endian `f32` blobs. Metadata is stored as
//! compact JSON after sanitisation, so it only ever holds scalars. Cell values
//! read from user tables are decoded according to the column's declared type.

use std::str::FromStr as _;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use nlsql_core::{
  document::{KnowledgeDocument, Metadata},
  schema::SqlValue,
};
use rusqlite::types::ValueRef;
use rust_decimal::Decimal;

use crate::{Error, Result};

// ─── Embeddings ──────────────────────────────────────────────────────────────

pub fn encode_embedding(v: &[f32]) -> Vec<u8> {
  v.iter().flat_map(|x| x.to_le_bytes()).collect()
}

pub fn decode_embedding(id: &str, blob: &[u8]) -> Result<Vec<f32>> {
  if blob.len() % 4 != 0 {
    return Err(Error::CorruptEmbedding(id.to_owned()));
  }
  Ok(
    blob
      .chunks_exact(4)
      .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
      .collect(),
  )
}

// ─── Metadata ────────────────────────────────────────────────────────────────

pub fn encode_metadata(m: &Metadata) -> Result<String> { Ok(serde_json::to_string(m)?) }

pub fn decode_metadata(s: &str) -> Result<Metadata> { Ok(serde_json::from_str(s)?) }

/// Raw columns read from a `knowledge_documents` row.
pub struct RawDocument {
  pub id:            String,
  pub content:       String,
  pub metadata_json: String,
}

impl RawDocument {
  pub fn into_document(self) -> Result<KnowledgeDocument> {
    Ok(KnowledgeDocument {
      metadata: decode_metadata(&self.metadata_json)?,
      id:       self.id,
      content:  self.content,
    })
  }
}

/// A `RawDocument` plus its stored embedding, as read for similarity scans.
pub struct RawScored {
  pub doc:       RawDocument,
  pub embedding: Vec<u8>,
}

// ─── Cell values ─────────────────────────────────────────────────────────────

/// The broad family of a declared column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
  Boolean,
  Date,
  Timestamp,
  Decimal,
  Other,
}

impl DeclaredType {
  pub fn parse(declared: &str) -> Self {
    let upper = declared.trim().to_ascii_uppercase();
    if upper.starts_with("BOOL") {
      DeclaredType::Boolean
    } else if upper.starts_with("DATETIME") || upper.starts_with("TIMESTAMP") {
      DeclaredType::Timestamp
    } else if upper.starts_with("DATE") {
      DeclaredType::Date
    } else if upper.starts_with("DECIMAL") || upper.starts_with("NUMERIC") {
      DeclaredType::Decimal
    } else {
      DeclaredType::Other
    }
  }
}

/// Decode one cell. Values that do not parse as their declared type are
/// returned as stored.
pub fn decode_value(value: ValueRef<'_>, declared: DeclaredType) -> SqlValue {
  match value {
    ValueRef::Null => SqlValue::Null,
    ValueRef::Integer(i) => match declared {
      DeclaredType::Boolean => SqlValue::Bool(i != 0),
      DeclaredType::Decimal => SqlValue::Decimal(Decimal::from(i)),
      _ => SqlValue::Integer(i),
    },
    ValueRef::Real(f) => match declared {
      DeclaredType::Decimal => Decimal::try_from(f).map_or(SqlValue::Real(f), SqlValue::Decimal),
      _ => SqlValue::Real(f),
    },
    ValueRef::Text(bytes) => {
      let text = String::from_utf8_lossy(bytes).into_owned();
      decode_text(&text, declared).unwrap_or(SqlValue::Text(text))
    }
    ValueRef::Blob(bytes) => SqlValue::Bytes(bytes.to_vec()),
  }
}

fn decode_text(text: &str, declared: DeclaredType) -> Option<SqlValue> {
  match declared {
    DeclaredType::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().map(SqlValue::Date),
    DeclaredType::Timestamp => decode_timestamp(text).ok(),
    DeclaredType::Decimal => Decimal::from_str(text).ok().map(SqlValue::Decimal),
    DeclaredType::Boolean => match text.to_ascii_lowercase().as_str() {
      "true" | "t" | "1" => Some(SqlValue::Bool(true)),
      "false" | "f" | "0" => Some(SqlValue::Bool(false)),
      _ => None,
    },
    DeclaredType::Other => None,
  }
}

/// SQLite's `CURRENT_TIMESTAMP` format, ISO 8601 with `T`, or RFC 3339.
pub fn decode_timestamp(text: &str) -> Result<SqlValue> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
    return Ok(SqlValue::TimestampTz(dt.with_timezone(&Utc)));
  }
  ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    .map(SqlValue::Timestamp)
    .ok_or_else(|| Error::DateParse(format!("unrecognised timestamp: {text:?}")))
}

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Quote a table name for interpolation into SQL text.
pub fn quote_table(name: &str) -> Result<String> {
  let valid = !name.is_empty()
    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    && !name.starts_with(|c: char| c.is_ascii_digit());
  if !valid {
    return Err(Error::InvalidTableName(name.to_owned()));
  }
  Ok(format!("\"{name}\""))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedding_blob_round_trips() {
    let v = vec![0.5_f32, -1.25, 0.0, 3.0];
    assert_eq!(decode_embedding("x", &encode_embedding(&v)).unwrap(), v);
    assert!(matches!(
      decode_embedding("x", &[0, 1, 2]),
      Err(Error::CorruptEmbedding(id)) if id == "x"
    ));
  }

  #[test]
  fn declared_types_are_classified() {
    assert_eq!(DeclaredType::parse("BOOLEAN"), DeclaredType::Boolean);
    assert_eq!(DeclaredType::parse("date"), DeclaredType::Date);
    assert_eq!(DeclaredType::parse("DATETIME"), DeclaredType::Timestamp);
    assert_eq!(DeclaredType::parse("TIMESTAMP"), DeclaredType::Timestamp);
    assert_eq!(DeclaredType::parse("DECIMAL(10,2)"), DeclaredType::Decimal);
    assert_eq!(DeclaredType::parse("VARCHAR(50)"), DeclaredType::Other);
  }

  #[test]
  fn cells_decode_by_declared_type() {
    assert_eq!(decode_value(ValueRef::Integer(1), DeclaredType::Boolean), SqlValue::Bool(true));
    assert_eq!(
      decode_value(ValueRef::Text(b"2024-01-15"), DeclaredType::Date),
      SqlValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
    );
    assert!(matches!(
      decode_value(ValueRef::Text(b"2024-01-15 10:30:00"), DeclaredType::Timestamp),
      SqlValue::Timestamp(_)
    ));
    assert!(matches!(
      decode_value(ValueRef::Real(29.99), DeclaredType::Decimal),
      SqlValue::Decimal(_)
    ));
    // unparseable text is kept as text
    assert_eq!(
      decode_value(ValueRef::Text(b"soon"), DeclaredType::Date),
      SqlValue::Text("soon".into())
    );
  }

  #[test]
  fn table_names_are_validated() {
    assert_eq!(quote_table("users").unwrap(), "\"users\"");
    assert!(quote_table("users; DROP TABLE x").is_err());
    assert!(quote_table("").is_err());
  }
}
