//! Error type for `nlsql-server` and its [`IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("{0}")]
  Core(#[from] nlsql_core::Error),

  #[error("{0}")]
  Store(#[from] nlsql_store_sqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Core(nlsql_core::Error::SchemaUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
      Error::Core(_) | Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "status": "error", "error": self.to_string() }))).into_response()
  }
}
