//! Context retrieval over the knowledge store.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{document::RetrievedContext, store::KnowledgeStore};

/// Number of documents retrieved per question unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 3;

/// Thin pass-through to [`KnowledgeStore::query`] that never fails: a store
/// error is logged and turned into an empty context.
pub struct ContextRetriever<S> {
  store: Arc<S>,
}

impl<S: KnowledgeStore> ContextRetriever<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn retrieve(&self, question: &str, top_k: usize) -> RetrievedContext {
    match self.store.query(question, top_k).await {
      Ok(context) => {
        debug!(items = context.len(), top_k, "retrieved context");
        context
      }
      Err(e) => {
        warn!(error = %e, "knowledge retrieval failed; continuing without context");
        Vec::new()
      }
    }
  }
}
