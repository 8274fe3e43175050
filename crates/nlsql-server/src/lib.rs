//! HTTP surface for nlsql.
//!
//! Exposes an axum [`Router`] over a [`SqlGenerator`], the knowledge store it
//! retrieves from and the relational database it generates SQL for. The
//! binary in `main.rs` wires these together; tests build the same state over
//! in-memory databases.
//!
//! # Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `GET` | `/` | liveness message |
//! | `POST` | `/api/generate-sql` | [`handlers::generate::generate_sql`] |
//! | `POST` | `/api/execute-sql` | [`handlers::execute::execute_sql`] |
//! | `POST` | `/api/learn` | [`handlers::generate::learn`] |
//! | `GET` | `/api/schema` | [`handlers::schema::schema`] |
//! | `GET`/`POST` | `/api/schema/reload` | [`handlers::schema::reload`] |
//! | `GET` | `/api/status` | [`handlers::status::status`] |
//! | `GET` | `/api/knowledge/stats` | [`handlers::status::knowledge_stats`] |
//! | `GET` | `/api/history` | [`handlers::status::history`] |

pub mod error;
pub mod gemini;
pub mod handlers;
pub mod settings;

pub use error::{Error, Result};
pub use gemini::{GeminiClient, GeminiError};
pub use settings::{ModelConfig, ServerConfig};

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use nlsql_core::{generator::SqlGenerator, model::LanguageModel};
use nlsql_store_sqlite::{SqliteDatabase, SqliteKnowledgeStore};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use handlers::{execute, generate, schema, status};

// ─── Application state ───────────────────────────────────────────────────────

pub type Generator<M> = SqlGenerator<SqliteKnowledgeStore, M>;

/// Shared state threaded through all axum handlers.
pub struct AppState<M> {
  pub generator: Arc<Generator<M>>,
  pub knowledge: Arc<SqliteKnowledgeStore>,
  pub database:  Arc<SqliteDatabase>,
}

impl<M> Clone for AppState<M> {
  fn clone(&self) -> Self {
    Self {
      generator: self.generator.clone(),
      knowledge: self.knowledge.clone(),
      database:  self.database.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the service router with permissive CORS and request tracing.
pub fn router<M>(state: AppState<M>) -> Router
where
  M: LanguageModel + 'static,
{
  let api = Router::new()
    .route("/generate-sql",    post(generate::generate_sql::<M>))
    .route("/execute-sql",     post(execute::execute_sql::<M>))
    .route("/learn",           post(generate::learn::<M>))
    .route("/schema",          get(schema::schema::<M>))
    .route("/schema/reload",   get(schema::reload::<M>).post(schema::reload::<M>))
    .route("/status",          get(status::status::<M>))
    .route("/knowledge/stats", get(status::knowledge_stats::<M>))
    .route("/history",         get(status::history::<M>));

  Router::new()
    .route("/", get(root))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
    .with_state(state)
}

/// `GET /`
async fn root() -> Json<Value> { Json(json!({ "message": "nlsql API is running" })) }
