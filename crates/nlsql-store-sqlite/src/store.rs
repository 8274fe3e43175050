//! [`SqliteKnowledgeStore`], the SQLite implementation of [`KnowledgeStore`].

use std::{cmp::Ordering, path::Path, sync::Arc};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::debug;

use nlsql_core::{
  document::{
    ContextItem, KnowledgeDocument, KnowledgeStats, NewDocument, RetrievedContext,
    sanitize_metadata,
  },
  embed::{Embedder, cosine_similarity},
  store::KnowledgeStore,
};

use crate::{
  Error, Result,
  encode::{RawDocument, RawScored, decode_embedding, encode_embedding, encode_metadata},
  schema::KNOWLEDGE_SCHEMA,
};

/// A row ready for insertion; everything already encoded.
struct EncodedDocument {
  id:            String,
  content:       String,
  metadata_json: String,
  kind:          Option<String>,
  embedding:     Vec<u8>,
  dimensions:    i64,
}

const INSERT_SQL: &str = "
  INSERT INTO knowledge_documents
    (id, content, metadata_json, kind, embedding, dimensions, embedder, created_at)
  VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
  ON CONFLICT(id) DO NOTHING";

// ─── Store ───────────────────────────────────────────────────────────────────

/// Knowledge documents and their embeddings in a single SQLite file.
///
/// Cloning is cheap; the connection and embedder are reference-counted.
#[derive(Clone)]
pub struct SqliteKnowledgeStore {
  conn:     tokio_rusqlite::Connection,
  embedder: Arc<dyn Embedder>,
}

impl SqliteKnowledgeStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, embedder: Arc<dyn Embedder>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, embedder };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory(embedder: Arc<dyn Embedder>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, embedder };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(KNOWLEDGE_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub fn embedder_name(&self) -> &str { self.embedder.name() }

  fn encode(&self, doc: &NewDocument) -> Result<EncodedDocument> {
    if doc.id.trim().is_empty() {
      return Err(Error::MalformedDocument { id: doc.id.clone(), reason: "empty id" });
    }
    if doc.content.trim().is_empty() {
      return Err(Error::MalformedDocument { id: doc.id.clone(), reason: "empty content" });
    }

    let metadata = sanitize_metadata(&doc.metadata);
    let kind = metadata.get("type").and_then(|v| v.as_str()).map(str::to_owned);
    let embedding = self.embedder.embed(&doc.content);

    Ok(EncodedDocument {
      id: doc.id.clone(),
      content: doc.content.clone(),
      metadata_json: encode_metadata(&metadata)?,
      kind,
      dimensions: embedding.len() as i64,
      embedding: encode_embedding(&embedding),
    })
  }

  /// Insert pre-encoded rows in one transaction; returns rows newly stored.
  async fn insert_encoded(&self, rows: Vec<EncodedDocument>) -> Result<usize> {
    let embedder = self.embedder.name().to_owned();
    let created_at = Utc::now().to_rfc3339();

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
          let mut stmt = tx.prepare(INSERT_SQL)?;
          for row in &rows {
            inserted += stmt.execute(rusqlite::params![
              row.id,
              row.content,
              row.metadata_json,
              row.kind,
              row.embedding,
              row.dimensions,
              embedder,
              created_at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;
    Ok(inserted)
  }
}

// ─── KnowledgeStore impl ─────────────────────────────────────────────────────

impl KnowledgeStore for SqliteKnowledgeStore {
  type Error = Error;

  async fn insert_batch(&self, documents: &[NewDocument]) -> Result<usize> {
    let rows = documents
      .iter()
      .map(|doc| self.encode(doc))
      .collect::<Result<Vec<_>>>()?;
    let inserted = self.insert_encoded(rows).await?;
    debug!(inserted, total = documents.len(), "inserted document batch");
    Ok(inserted)
  }

  async fn insert_one(&self, document: &NewDocument) -> Result<bool> {
    let row = self.encode(document)?;
    Ok(self.insert_encoded(vec![row]).await? == 1)
  }

  async fn query(&self, text: &str, top_k: usize) -> Result<RetrievedContext> {
    if top_k == 0 {
      return Ok(Vec::new());
    }
    let query = self.embedder.embed(text);
    let dims = query.len() as i64;

    let raws: Vec<RawScored> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, content, metadata_json, embedding
           FROM knowledge_documents
           WHERE dimensions = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![dims], |row| {
            Ok(RawScored {
              doc:       RawDocument {
                id:            row.get(0)?,
                content:       row.get(1)?,
                metadata_json: row.get(2)?,
              },
              embedding: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut scored = Vec::with_capacity(raws.len());
    for raw in raws {
      let embedding = decode_embedding(&raw.doc.id, &raw.embedding)?;
      scored.push((cosine_similarity(&query, &embedding), raw.doc));
    }

    scored.sort_by(|a, b| {
      b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal).then_with(|| a.1.id.cmp(&b.1.id))
    });
    scored.truncate(top_k);

    scored
      .into_iter()
      .map(|(_, raw)| raw.into_document().map(ContextItem::from))
      .collect()
  }

  async fn get(&self, id: &str) -> Result<Option<KnowledgeDocument>> {
    let id = id.to_owned();
    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, content, metadata_json FROM knowledge_documents WHERE id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawDocument {
                  id:            row.get(0)?,
                  content:       row.get(1)?,
                  metadata_json: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawDocument::into_document).transpose()
  }

  async fn count(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM knowledge_documents", [], |r| r.get(0))?)
      })
      .await?;
    Ok(n as usize)
  }

  async fn stats(&self) -> Result<KnowledgeStats> {
    let groups: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT COALESCE(kind, 'unknown'), COUNT(*)
           FROM knowledge_documents
           GROUP BY 1",
        )?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut stats = KnowledgeStats::default();
    for (kind, n) in groups {
      stats.total_items += n as usize;
      *stats.breakdown.entry(kind).or_default() += n as usize;
    }
    Ok(stats)
  }
}
