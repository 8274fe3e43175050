//! Handlers for `/api/schema` and `/api/schema/reload`.

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use nlsql_core::{
  curator::{Curator, PopulateOutcome},
  model::LanguageModel,
  schema::{ColumnInfo, TableSchema},
};
use serde::Serialize;
use tracing::{info, warn};

use crate::{AppState, Result};

// ─── Schema ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
  pub schema: BTreeMap<String, Vec<ColumnInfo>>,
  pub status: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:  Option<String>,
}

/// `GET /api/schema`
pub async fn schema<M>(State(state): State<AppState<M>>) -> Json<SchemaResponse>
where
  M: LanguageModel + 'static,
{
  match state.database.tables().await {
    Ok(tables) => Json(SchemaResponse {
      schema: tables.into_iter().map(|t| (t.name, t.columns)).collect(),
      status: "success",
      error:  None,
    }),
    Err(e) => Json(SchemaResponse {
      schema: BTreeMap::new(),
      status: "error",
      error:  Some(e.to_string()),
    }),
  }
}

// ─── Reload ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
  pub success:   bool,
  pub message:   String,
  /// Documents added to the knowledge store by this reload.
  pub populated: usize,
  pub tables:    Vec<TableSchema>,
}

/// `GET|POST /api/schema/reload`
///
/// Re-runs the curator (a no-op once the store is populated) and returns the
/// current table list. A curation failure is logged, not returned.
pub async fn reload<M>(State(state): State<AppState<M>>) -> Result<Json<ReloadResponse>>
where
  M: LanguageModel + 'static,
{
  let curator = Curator::new(&*state.knowledge, &*state.database, state.generator.dialect());
  let populated = match curator.populate().await {
    Ok(PopulateOutcome::Populated(report)) => report.inserted,
    Ok(PopulateOutcome::Skipped { .. }) => 0,
    Err(e) => {
      warn!(error = %e, "could not refresh knowledge store");
      0
    }
  };

  let tables = state.database.tables().await?;
  info!(tables = tables.len(), populated, "schema reloaded");
  Ok(Json(ReloadResponse {
    success: true,
    message: format!("Schema reloaded successfully. Found {} tables.", tables.len()),
    populated,
    tables,
  }))
}
