//! The `KnowledgeStore` trait and the two-phase insert strategy.
//!
//! The trait is implemented by storage backends (e.g. `nlsql-store-sqlite`).
//! The curator, retriever and feedback loop depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use serde::Serialize;
use tracing::{debug, warn};

use crate::document::{KnowledgeDocument, KnowledgeStats, NewDocument, RetrievedContext};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A persistent semantic index of short text documents.
///
/// Backends own the text → vector translation and must tolerate concurrent
/// calls from many in-flight requests. Insertion is insert-or-ignore on `id`:
/// re-inserting an existing id never duplicates and never overwrites.
pub trait KnowledgeStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert all `documents` atomically, sanitising their metadata.
  ///
  /// Rejects the whole batch if any document is malformed. Returns the number
  /// of documents newly stored (ids already present are skipped).
  fn insert_batch<'a>(
    &'a self,
    documents: &'a [NewDocument],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Insert a single document. Returns `false` if the id already existed.
  fn insert_one<'a>(
    &'a self,
    document: &'a NewDocument,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// At most `top_k` documents ordered by descending similarity to `text`.
  /// An empty store yields an empty sequence.
  fn query<'a>(
    &'a self,
    text: &'a str,
    top_k: usize,
  ) -> impl Future<Output = Result<RetrievedContext, Self::Error>> + Send + 'a;

  /// Retrieve a document by id. Returns `None` if not found.
  fn get<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<KnowledgeDocument>, Self::Error>> + Send + 'a;

  fn count(&self) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Document counts per `metadata.type`.
  fn stats(&self) -> impl Future<Output = Result<KnowledgeStats, Self::Error>> + Send + '_;
}

// ─── Two-phase insert ────────────────────────────────────────────────────────

/// Which phase of [`insert_all`] stored the documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertMode {
  Batch,
  Individual,
}

/// Outcome of [`insert_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertReport {
  pub mode:      InsertMode,
  /// Documents newly stored.
  pub inserted:  usize,
  /// Documents whose id was already present.
  pub skipped:   usize,
  /// `(id, error)` for each document that could not be stored.
  pub failed:    Vec<(String, String)>,
}

/// Insert `documents`, first as one batch, then one at a time if the batch is
/// rejected. A single bad document never blocks the rest.
pub async fn insert_all<S: KnowledgeStore>(
  store: &S,
  documents: &[NewDocument],
) -> InsertReport {
  match store.insert_batch(documents).await {
    Ok(inserted) => {
      debug!(inserted, total = documents.len(), "batch insert succeeded");
      InsertReport {
        mode: InsertMode::Batch,
        inserted,
        skipped: documents.len().saturating_sub(inserted),
        failed: Vec::new(),
      }
    }
    Err(e) => {
      warn!(error = %e, "batch insert failed; inserting documents individually");
      let mut report = InsertReport {
        mode:     InsertMode::Individual,
        inserted: 0,
        skipped:  0,
        failed:   Vec::new(),
      };
      for doc in documents {
        match store.insert_one(doc).await {
          Ok(true) => report.inserted += 1,
          Ok(false) => report.skipped += 1,
          Err(e) => {
            warn!(id = %doc.id, error = %e, "failed to insert document");
            report.failed.push((doc.id.clone(), e.to_string()));
          }
        }
      }
      debug!(inserted = report.inserted, failed = report.failed.len(), "individual insert finished");
      report
    }
  }
}
