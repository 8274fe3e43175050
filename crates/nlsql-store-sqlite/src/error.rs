//! Error type for `nlsql-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] nlsql_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A document with an empty id or empty content.
  #[error("malformed document {id:?}: {reason}")]
  MalformedDocument { id: String, reason: &'static str },

  /// A stored embedding blob whose length is not a whole number of `f32`s.
  #[error("corrupt embedding for document {0}")]
  CorruptEmbedding(String),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown table: {0}")]
  UnknownTable(String),

  #[error("no SQL statement given")]
  EmptyStatement,

  #[error("command '{0}' is not allowed")]
  Forbidden(&'static str),

  /// Table names reach SQL text unparameterised; reject anything that is not
  /// a plain identifier.
  #[error("invalid table name: {0:?}")]
  InvalidTableName(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
