//! Error types for `nlsql-core`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No model credentials or model name configured. Anticipated, not
  /// exceptional: the generator answers with a placeholder statement.
  #[error("no language model is configured")]
  ModelUnavailable,

  #[error("language model invocation failed: {0}")]
  ModelInvocation(String),

  #[error("language model did not answer within {0:?}")]
  ModelTimeout(Duration),

  /// The model answered, but nothing resembling a statement survived
  /// cleaning.
  #[error("model response did not contain a SQL statement")]
  MalformedResponse,

  #[error("knowledge retrieval failed: {0}")]
  Retrieval(String),

  /// Table listing failed, or column introspection failed for every table.
  #[error("relational schema is unavailable: {0}")]
  SchemaUnavailable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Error::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
