//! Read-only service introspection.

use axum::{
  Json,
  extract::{Query, State},
};
use nlsql_core::{
  document::KnowledgeStats, generator::GeneratorStatus, model::LanguageModel,
  store::KnowledgeStore,
};
use nlsql_store_sqlite::HistoryRecord;
use serde::Deserialize;

use crate::{AppState, Result};

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// `GET /api/status`
pub async fn status<M>(State(state): State<AppState<M>>) -> Json<GeneratorStatus>
where
  M: LanguageModel + 'static,
{
  Json(state.generator.status().await)
}

/// `GET /api/knowledge/stats`
pub async fn knowledge_stats<M>(State(state): State<AppState<M>>) -> Result<Json<KnowledgeStats>>
where
  M: LanguageModel + 'static,
{
  Ok(Json(state.knowledge.stats().await?))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub limit: Option<usize>,
}

/// `GET /api/history[?limit=<n>]`, newest first.
pub async fn history<M>(
  State(state): State<AppState<M>>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<HistoryRecord>>>
where
  M: LanguageModel + 'static,
{
  let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
  Ok(Json(state.database.recent_history(limit).await?))
}
