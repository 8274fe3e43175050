//! In-memory test doubles for the core traits.

use std::{
  collections::HashSet,
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use thiserror::Error;

use crate::{
  document::{
    ContextItem, DocumentKind, KnowledgeDocument, KnowledgeStats, NewDocument,
    RetrievedContext, sanitize_metadata,
  },
  embed::{Embedder, HashingEmbedder, cosine_similarity},
  model::LanguageModel,
  schema::{ColumnInfo, SampleRow, SchemaSource, SqlValue, TableSchema},
  store::KnowledgeStore,
};

#[derive(Debug, Error)]
#[error("{0}")]
pub struct FakeError(pub String);

// ─── Stores ──────────────────────────────────────────────────────────────────

/// Brute-force cosine store over a `Vec`, insert-or-ignore on id.
#[derive(Default)]
pub struct MemoryStore {
  embedder: HashingEmbedder,
  docs:     Mutex<Vec<(KnowledgeDocument, Vec<f32>)>>,
  pub batch_calls: AtomicUsize,
}

impl MemoryStore {
  pub fn with_contents(contents: &[&str]) -> Self {
    let store = Self::default();
    for (i, content) in contents.iter().enumerate() {
      let doc = NewDocument::new(format!("doc_{i}"), DocumentKind::Example, *content);
      store.put(&doc).unwrap();
    }
    store
  }

  fn validate(doc: &NewDocument) -> Result<(), FakeError> {
    if doc.id.trim().is_empty() || doc.content.trim().is_empty() {
      return Err(FakeError(format!("malformed document {:?}", doc.id)));
    }
    Ok(())
  }

  fn put(&self, doc: &NewDocument) -> Result<bool, FakeError> {
    Self::validate(doc)?;
    let mut docs = self.docs.lock().unwrap();
    if docs.iter().any(|(d, _)| d.id == doc.id) {
      return Ok(false);
    }
    let embedding = self.embedder.embed(&doc.content);
    docs.push((
      KnowledgeDocument {
        id:       doc.id.clone(),
        content:  doc.content.clone(),
        metadata: sanitize_metadata(&doc.metadata),
      },
      embedding,
    ));
    Ok(true)
  }

  pub fn ids(&self) -> Vec<String> {
    self.docs.lock().unwrap().iter().map(|(d, _)| d.id.clone()).collect()
  }
}

impl KnowledgeStore for MemoryStore {
  type Error = FakeError;

  async fn insert_batch(&self, documents: &[NewDocument]) -> Result<usize, FakeError> {
    self.batch_calls.fetch_add(1, Ordering::SeqCst);
    for doc in documents {
      Self::validate(doc)?;
    }
    let mut inserted = 0;
    for doc in documents {
      if self.put(doc)? {
        inserted += 1;
      }
    }
    Ok(inserted)
  }

  async fn insert_one(&self, document: &NewDocument) -> Result<bool, FakeError> {
    self.put(document)
  }

  async fn query(&self, text: &str, top_k: usize) -> Result<RetrievedContext, FakeError> {
    let q = self.embedder.embed(text);
    let docs = self.docs.lock().unwrap();
    let mut scored: Vec<(f32, &KnowledgeDocument)> = docs
      .iter()
      .map(|(d, e)| (cosine_similarity(&q, e), d))
      .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
    Ok(
      scored
        .into_iter()
        .take(top_k)
        .map(|(_, d)| ContextItem::from(d.clone()))
        .collect(),
    )
  }

  async fn get(&self, id: &str) -> Result<Option<KnowledgeDocument>, FakeError> {
    let docs = self.docs.lock().unwrap();
    Ok(docs.iter().find(|(d, _)| d.id == id).map(|(d, _)| d.clone()))
  }

  async fn count(&self) -> Result<usize, FakeError> {
    Ok(self.docs.lock().unwrap().len())
  }

  async fn stats(&self) -> Result<KnowledgeStats, FakeError> {
    let docs = self.docs.lock().unwrap();
    let mut stats = KnowledgeStats { total_items: docs.len(), ..Default::default() };
    for (doc, _) in docs.iter() {
      let kind = doc.kind().unwrap_or("unknown").to_owned();
      *stats.breakdown.entry(kind).or_default() += 1;
    }
    Ok(stats)
  }
}

/// Every call fails.
pub struct FailingStore;

impl KnowledgeStore for FailingStore {
  type Error = FakeError;

  async fn insert_batch(&self, _: &[NewDocument]) -> Result<usize, FakeError> {
    Err(FakeError("store offline".into()))
  }

  async fn insert_one(&self, _: &NewDocument) -> Result<bool, FakeError> {
    Err(FakeError("store offline".into()))
  }

  async fn query(&self, _: &str, _: usize) -> Result<RetrievedContext, FakeError> {
    Err(FakeError("store offline".into()))
  }

  async fn get(&self, _: &str) -> Result<Option<KnowledgeDocument>, FakeError> {
    Err(FakeError("store offline".into()))
  }

  async fn count(&self) -> Result<usize, FakeError> {
    Err(FakeError("store offline".into()))
  }

  async fn stats(&self) -> Result<KnowledgeStats, FakeError> {
    Err(FakeError("store offline".into()))
  }
}

// ─── Schema ──────────────────────────────────────────────────────────────────

fn column(name: &str, data_type: &str, nullable: bool, primary_key: bool) -> ColumnInfo {
  ColumnInfo {
    name: name.into(),
    data_type: data_type.into(),
    nullable,
    primary_key,
  }
}

/// The sample `users` / `orders` schema with one row each.
#[derive(Default)]
pub struct FakeSchema {
  pub fail_listing:  bool,
  pub fail_columns:  HashSet<String>,
  pub fail_samples:  HashSet<String>,
  pub extra_tables:  Vec<TableSchema>,
}

impl FakeSchema {
  fn tables(&self) -> Vec<TableSchema> {
    let mut tables = vec![
      TableSchema {
        name:    "users".into(),
        columns: vec![
          column("id", "INTEGER", false, true),
          column("name", "VARCHAR(100)", true, false),
          column("city", "VARCHAR(50)", true, false),
        ],
      },
      TableSchema {
        name:    "orders".into(),
        columns: vec![
          column("id", "INTEGER", false, true),
          column("user_id", "INTEGER", true, false),
          column("amount", "DECIMAL(10,2)", true, false),
        ],
      },
    ];
    tables.extend(self.extra_tables.iter().cloned());
    tables
  }
}

impl SchemaSource for FakeSchema {
  type Error = FakeError;

  async fn list_tables(&self) -> Result<Vec<String>, FakeError> {
    if self.fail_listing {
      return Err(FakeError("connection refused".into()));
    }
    Ok(self.tables().into_iter().map(|t| t.name).collect())
  }

  async fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>, FakeError> {
    if self.fail_columns.contains(table) {
      return Err(FakeError(format!("cannot inspect {table}")));
    }
    self
      .tables()
      .into_iter()
      .find(|t| t.name == table)
      .map(|t| t.columns)
      .ok_or_else(|| FakeError(format!("no such table {table}")))
  }

  async fn sample_rows(&self, table: &str, _n: usize) -> Result<Vec<SampleRow>, FakeError> {
    if self.fail_samples.contains(table) {
      return Err(FakeError(format!("cannot sample {table}")));
    }
    Ok(match table {
      "users" => vec![vec![
        ("id".into(), SqlValue::Integer(1)),
        ("name".into(), SqlValue::Text("John Doe".into())),
        ("city".into(), SqlValue::Text("New York".into())),
      ]],
      "orders" => vec![vec![
        ("id".into(), SqlValue::Integer(1)),
        ("user_id".into(), SqlValue::Integer(1)),
        ("amount".into(), SqlValue::Real(999.99)),
      ]],
      _ => Vec::new(),
    })
  }
}

// ─── Model ───────────────────────────────────────────────────────────────────

/// Replies with a fixed response (or error), optionally after a delay, and
/// counts its calls.
pub struct FakeModel {
  pub reply: Result<String, String>,
  pub delay: Option<Duration>,
  pub calls: AtomicUsize,
}

impl FakeModel {
  pub fn replying(reply: &str) -> Self {
    Self { reply: Ok(reply.into()), delay: None, calls: AtomicUsize::new(0) }
  }

  pub fn failing(error: &str) -> Self {
    Self { reply: Err(error.into()), delay: None, calls: AtomicUsize::new(0) }
  }

  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl LanguageModel for FakeModel {
  type Error = FakeError;

  async fn generate(&self, _prompt: &str) -> Result<String, FakeError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    self.reply.clone().map_err(FakeError)
  }

  fn name(&self) -> &str { "fake-model" }
}
