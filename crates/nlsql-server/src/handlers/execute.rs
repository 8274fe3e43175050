//! `POST /api/execute-sql`: run a statement against the relational database.

use axum::{Json, extract::State};
use nlsql_core::model::LanguageModel;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ExecuteBody {
  pub sql: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ExecuteResponse {
  pub results:       Vec<Map<String, Value>>,
  pub columns:       Vec<String>,
  pub status:        &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rows_affected: Option<usize>,
}

/// Execution errors are reported in the body with `status: "error"`.
pub async fn execute_sql<M>(
  State(state): State<AppState<M>>,
  Json(body): Json<ExecuteBody>,
) -> Json<ExecuteResponse>
where
  M: LanguageModel + 'static,
{
  match state.database.execute(&body.sql).await {
    Ok(out) => Json(ExecuteResponse {
      results:       out.rows,
      columns:       out.columns,
      status:        "success",
      error:         None,
      rows_affected: out.rows_affected,
    }),
    Err(e) => {
      warn!(error = %e, "statement execution failed");
      Json(ExecuteResponse {
        status: "error",
        error: Some(e.to_string()),
        ..Default::default()
      })
    }
  }
}
