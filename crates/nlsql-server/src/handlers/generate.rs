//! Handlers for generation and learning.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/generate-sql` | Body: `{"natural_query": "..."}` |
//! | `POST` | `/api/learn` | Body: `{"natural_query": "...", "sql": "...", "success": true}` |

use axum::{Json, extract::State};
use nlsql_core::{feedback::LearnOutcome, generator::GenerationResult, model::LanguageModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{AppState, Error, Result};

// ─── Generate ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
  pub natural_query: String,
}

/// `POST /api/generate-sql`
///
/// Always answers 200; a blank question is reported in the body.
pub async fn generate_sql<M>(
  State(state): State<AppState<M>>,
  Json(body): Json<GenerateBody>,
) -> Json<GenerationResult>
where
  M: LanguageModel + 'static,
{
  let question = body.natural_query.trim();
  if question.is_empty() {
    return Json(GenerationResult::error("natural_query must not be empty"));
  }

  let result = state.generator.generate_sql(question).await;
  debug!(%question, sql = %result.sql, "generated");

  let status = if result.is_success() { "success" } else { "error" };
  if let Err(e) = state.database.record_history(question, &result.sql, status).await {
    warn!(error = %e, "failed to record query history");
  }
  Json(result)
}

// ─── Learn ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LearnBody {
  pub natural_query: String,
  pub sql:           String,
  #[serde(default = "default_success")]
  pub success:       bool,
}

fn default_success() -> bool { true }

#[derive(Debug, Serialize)]
pub struct LearnResponse {
  pub status:  &'static str,
  pub outcome: LearnOutcome,
}

/// `POST /api/learn`
pub async fn learn<M>(
  State(state): State<AppState<M>>,
  Json(body): Json<LearnBody>,
) -> Result<Json<LearnResponse>>
where
  M: LanguageModel + 'static,
{
  let (question, sql) = (body.natural_query.trim(), body.sql.trim());
  if question.is_empty() || sql.is_empty() {
    return Err(Error::BadRequest("natural_query and sql must not be empty".into()));
  }
  let outcome = state.generator.learn(question, sql, body.success).await?;
  Ok(Json(LearnResponse { status: "success", outcome }))
}
