//! The generation orchestrator.
//!
//! One question runs retrieve → compose → invoke → clean, in that order. When
//! no model is configured the pipeline short-circuits to a placeholder; when
//! the model fails, times out or answers with nothing usable, the keyword
//! [`fallback`](crate::fallback) cascade takes over. Callers always get a
//! statement back.

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  clean::{clean_sql, has_statement},
  dialect::Dialect,
  fallback::{self, FallbackRule, single_line},
  feedback::{FeedbackLoop, LearnOutcome},
  model::LanguageModel,
  prompt::compose,
  retriever::{ContextRetriever, DEFAULT_TOP_K},
  store::KnowledgeStore,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ─── Settings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct GeneratorSettings {
  pub dialect: Dialect,
  pub top_k:   usize,
  pub timeout: Duration,
}

impl Default for GeneratorSettings {
  fn default() -> Self {
    Self {
      dialect: Dialect::default(),
      top_k:   DEFAULT_TOP_K,
      timeout: DEFAULT_TIMEOUT,
    }
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// How a statement was produced.
#[derive(Debug)]
pub enum Generation {
  /// Cleaned model output.
  Generated { sql: String },
  /// The model was tried and failed; `reason` says how.
  Fallback {
    sql:    String,
    rule:   FallbackRule,
    reason: Error,
  },
  /// No model is configured.
  Placeholder { sql: String },
}

impl Generation {
  pub fn sql(&self) -> &str {
    match self {
      Generation::Generated { sql }
      | Generation::Fallback { sql, .. }
      | Generation::Placeholder { sql } => sql,
    }
  }

  pub fn into_sql(self) -> String {
    match self {
      Generation::Generated { sql }
      | Generation::Fallback { sql, .. }
      | Generation::Placeholder { sql } => sql,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
  Success,
  Error,
}

/// The wire shape of a generation answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
  pub sql:    String,
  pub status: GenerationStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:  Option<String>,
}

impl GenerationResult {
  pub fn success(sql: impl Into<String>) -> Self {
    Self { sql: sql.into(), status: GenerationStatus::Success, error: None }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self {
      sql:    String::new(),
      status: GenerationStatus::Error,
      error:  Some(message.into()),
    }
  }

  pub fn is_success(&self) -> bool { self.status == GenerationStatus::Success }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratorStatus {
  pub model_available:     bool,
  pub model:               Option<String>,
  pub retrieval_available: bool,
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

pub struct SqlGenerator<S, M> {
  store:     Arc<S>,
  model:     Option<M>,
  settings:  GeneratorSettings,
  retriever: ContextRetriever<S>,
  feedback:  FeedbackLoop<S>,
}

impl<S, M> SqlGenerator<S, M>
where
  S: KnowledgeStore,
  M: LanguageModel,
{
  pub fn new(store: Arc<S>, model: Option<M>, settings: GeneratorSettings) -> Self {
    Self {
      retriever: ContextRetriever::new(store.clone()),
      feedback: FeedbackLoop::new(store.clone()),
      store,
      model,
      settings,
    }
  }

  pub fn dialect(&self) -> Dialect { self.settings.dialect }

  pub fn model_name(&self) -> Option<&str> { self.model.as_ref().map(|m| m.name()) }

  /// Produce a statement for `question`. Never fails.
  pub async fn generate(&self, question: &str) -> Generation {
    let Some(model) = &self.model else {
      debug!("no model configured; answering with placeholder");
      return Generation::Placeholder { sql: placeholder_sql(question) };
    };

    match self.invoke(model, question).await {
      Ok(sql) => {
        debug!(%sql, "model generated statement");
        Generation::Generated { sql }
      }
      Err(reason) => {
        let fallback = fallback::synthesize(question, self.settings.dialect);
        warn!(error = %reason, rule = ?fallback.rule, "generation failed; using fallback");
        Generation::Fallback { sql: fallback.sql, rule: fallback.rule, reason }
      }
    }
  }

  pub async fn generate_sql(&self, question: &str) -> GenerationResult {
    GenerationResult::success(self.generate(question).await.into_sql())
  }

  async fn invoke(&self, model: &M, question: &str) -> Result<String> {
    let context = self.retriever.retrieve(question, self.settings.top_k).await;
    let prompt = compose(self.settings.dialect, question, &context);

    let timeout = self.settings.timeout;
    let raw = tokio::time::timeout(timeout, model.generate(&prompt))
      .await
      .map_err(|_| Error::ModelTimeout(timeout))?
      .map_err(|e| Error::ModelInvocation(e.to_string()))?;

    let sql = clean_sql(&raw);
    if !has_statement(&sql) {
      return Err(Error::MalformedResponse);
    }
    Ok(sql)
  }

  /// Record a caller-confirmed `(question, sql)` pair.
  pub async fn learn(&self, question: &str, sql: &str, succeeded: bool) -> Result<LearnOutcome> {
    let outcome = self.feedback.record(question, sql, succeeded).await?;
    if let LearnOutcome::Learned { id } = &outcome {
      info!(%id, "stored learned example");
    }
    Ok(outcome)
  }

  pub async fn status(&self) -> GeneratorStatus {
    let retrieval_available = match self.store.count().await {
      Ok(_) => true,
      Err(e) => {
        warn!(error = %e, "knowledge store unreachable");
        false
      }
    };
    GeneratorStatus {
      model_available: self.model.is_some(),
      model: self.model_name().map(str::to_owned),
      retrieval_available,
    }
  }
}

fn placeholder_sql(question: &str) -> String {
  format!(
    "-- No language model configured\n-- Generated from: {}\nSELECT * FROM users LIMIT 5;",
    single_line(question)
  )
}
