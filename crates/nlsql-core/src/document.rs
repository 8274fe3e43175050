//! Knowledge documents, the unit stored in and retrieved from the knowledge
//! store.
//!
//! Callers build a [`NewDocument`] whose metadata is arbitrary JSON. The store
//! flattens that metadata into scalars ([`sanitize_metadata`]) before anything
//! is persisted; what comes back out is a [`KnowledgeDocument`] whose metadata
//! can only hold [`MetadataValue`]s.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─── Metadata ────────────────────────────────────────────────────────────────

/// A scalar metadata value. Structured values are not representable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
  Null,
  Bool(bool),
  Integer(i64),
  Float(f64),
  Text(String),
}

impl MetadataValue {
  pub fn as_str(&self) -> Option<&str> {
    match self {
      MetadataValue::Text(s) => Some(s),
      _ => None,
    }
  }
}

impl From<&str> for MetadataValue {
  fn from(s: &str) -> Self { MetadataValue::Text(s.to_owned()) }
}

impl From<bool> for MetadataValue {
  fn from(b: bool) -> Self { MetadataValue::Bool(b) }
}

/// Sanitised, scalar-only metadata. Keys are kept sorted.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Flatten arbitrary JSON metadata into scalars.
///
/// - strings, numbers, booleans and `null` are kept as they are;
/// - arrays become the comma-joined string form of their elements;
/// - objects become their compact JSON text.
pub fn sanitize_metadata(raw: &Map<String, Value>) -> Metadata {
  raw
    .iter()
    .map(|(key, value)| (key.clone(), sanitize_value(value)))
    .collect()
}

fn sanitize_value(value: &Value) -> MetadataValue {
  match value {
    Value::Null => MetadataValue::Null,
    Value::Bool(b) => MetadataValue::Bool(*b),
    Value::Number(n) => match n.as_i64() {
      Some(i) => MetadataValue::Integer(i),
      None => n
        .as_f64()
        .map_or_else(|| MetadataValue::Text(n.to_string()), MetadataValue::Float),
    },
    Value::String(s) => MetadataValue::Text(s.clone()),
    Value::Array(items) => MetadataValue::Text(
      items.iter().map(scalar_string).collect::<Vec<_>>().join(","),
    ),
    Value::Object(_) => MetadataValue::Text(value.to_string()),
  }
}

/// String form of a single array element: bare text for strings, JSON text
/// for everything else.
fn scalar_string(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The category carried in `metadata.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
  Schema,
  SampleData,
  Relationship,
  Pattern,
  Example,
  Tip,
  LearnedExample,
}

impl DocumentKind {
  pub fn as_str(self) -> &'static str {
    match self {
      DocumentKind::Schema => "schema",
      DocumentKind::SampleData => "sample_data",
      DocumentKind::Relationship => "relationship",
      DocumentKind::Pattern => "pattern",
      DocumentKind::Example => "example",
      DocumentKind::Tip => "tip",
      DocumentKind::LearnedExample => "learned_example",
    }
  }
}

impl fmt::Display for DocumentKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// Input to [`KnowledgeStore::insert_batch`](crate::store::KnowledgeStore::insert_batch).
///
/// Metadata is unsanitised; the store flattens it on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
  pub id:       String,
  pub content:  String,
  pub metadata: Map<String, Value>,
}

impl NewDocument {
  /// A document tagged with `kind` in `metadata.type`.
  pub fn new(
    id: impl Into<String>,
    kind: DocumentKind,
    content: impl Into<String>,
  ) -> Self {
    let mut metadata = Map::new();
    metadata.insert("type".to_owned(), Value::from(kind.as_str()));
    Self { id: id.into(), content: content.into(), metadata }
  }

  /// Attach an additional metadata entry.
  pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
    self.metadata.insert(key.to_owned(), value.into());
    self
  }

  /// The document category, read back from `metadata.type`.
  pub fn kind(&self) -> Option<&str> {
    self.metadata.get("type").and_then(Value::as_str)
  }
}

/// A persisted document. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
  pub id:       String,
  pub content:  String,
  pub metadata: Metadata,
}

impl KnowledgeDocument {
  pub fn kind(&self) -> Option<&str> {
    self.metadata.get("type").and_then(MetadataValue::as_str)
  }
}

// ─── Retrieval ───────────────────────────────────────────────────────────────

/// One retrieved document. The similarity score is deliberately absent:
/// only the ordering of [`RetrievedContext`] carries meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
  pub content:  String,
  pub metadata: Metadata,
}

impl From<KnowledgeDocument> for ContextItem {
  fn from(doc: KnowledgeDocument) -> Self {
    Self { content: doc.content, metadata: doc.metadata }
  }
}

/// Retrieved documents, most relevant first.
pub type RetrievedContext = Vec<ContextItem>;

/// Document counts, overall and per `metadata.type`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeStats {
  pub total_items: usize,
  pub breakdown:   BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn raw(value: Value) -> Map<String, Value> {
    match value {
      Value::Object(map) => map,
      _ => panic!("expected an object"),
    }
  }

  #[test]
  fn scalars_pass_through() {
    let meta = sanitize_metadata(&raw(json!({
      "type": "tip",
      "count": 3,
      "ratio": 0.5,
      "success": true,
      "missing": null,
    })));
    assert_eq!(meta["type"], MetadataValue::Text("tip".into()));
    assert_eq!(meta["count"], MetadataValue::Integer(3));
    assert_eq!(meta["ratio"], MetadataValue::Float(0.5));
    assert_eq!(meta["success"], MetadataValue::Bool(true));
    assert_eq!(meta["missing"], MetadataValue::Null);
  }

  #[test]
  fn sequences_are_comma_joined() {
    let meta = sanitize_metadata(&raw(json!({ "tables": ["users", "orders", 3] })));
    assert_eq!(meta["tables"], MetadataValue::Text("users,orders,3".into()));
  }

  #[test]
  fn objects_become_json_text() {
    let meta = sanitize_metadata(&raw(json!({ "extra": { "a": 1 } })));
    assert_eq!(meta["extra"], MetadataValue::Text(r#"{"a":1}"#.into()));
  }

  #[test]
  fn new_document_is_tagged_with_kind() {
    let doc = NewDocument::new("x", DocumentKind::SampleData, "content")
      .with("table", "users");
    assert_eq!(doc.kind(), Some("sample_data"));
    assert_eq!(doc.metadata["table"], json!("users"));
  }
}
