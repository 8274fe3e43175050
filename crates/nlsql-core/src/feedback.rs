//! Learning from successful generations.

use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::{
  Error, Result,
  document::{DocumentKind, NewDocument},
  store::KnowledgeStore,
};

/// Stable identifier for a learned `(question, sql)` pair.
///
/// `learned_` followed by the first 16 bytes of SHA-256 over the question, a
/// NUL separator and the statement, hex-encoded.
pub fn learned_id(question: &str, sql: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(question.as_bytes());
  hasher.update([0u8]);
  hasher.update(sql.as_bytes());
  let digest = hasher.finalize();
  format!("learned_{}", hex::encode(&digest[..16]))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LearnOutcome {
  /// The caller reported a failed statement; nothing is stored.
  Ignored,
  AlreadyKnown { id: String },
  Learned { id: String },
}

pub struct FeedbackLoop<S> {
  store: Arc<S>,
}

impl<S: KnowledgeStore> FeedbackLoop<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn record(&self, question: &str, sql: &str, succeeded: bool) -> Result<LearnOutcome> {
    if !succeeded {
      debug!("ignoring feedback for failed statement");
      return Ok(LearnOutcome::Ignored);
    }

    let id = learned_id(question, sql);
    if self.store.get(&id).await.map_err(Error::store)?.is_some() {
      debug!(%id, "pair already learned");
      return Ok(LearnOutcome::AlreadyKnown { id });
    }

    let document = NewDocument::new(
      id.clone(),
      DocumentKind::LearnedExample,
      format!("Question: '{question}' generates SQL: {sql}"),
    )
    .with("success", true);

    // A concurrent writer may have won the race; insert-or-ignore absorbs it.
    if self.store.insert_one(&document).await.map_err(Error::store)? {
      info!(%id, "learned new example");
      Ok(LearnOutcome::Learned { id })
    } else {
      Ok(LearnOutcome::AlreadyKnown { id })
    }
  }
}
