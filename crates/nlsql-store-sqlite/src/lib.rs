//! SQLite backends for nlsql.
//!
//! - [`SqliteKnowledgeStore`] persists knowledge documents with their
//!   embeddings and answers similarity queries by brute-force cosine scan.
//! - [`SqliteDatabase`] is the relational database the service generates SQL
//!   for: schema introspection, statement execution and the query-history log.
//!
//! Both wrap [`tokio_rusqlite`] so database access runs on a dedicated thread
//! without blocking the async runtime.

mod database;
mod encode;
mod schema;
mod store;

pub mod error;

pub use database::{ExecuteOutcome, HistoryRecord, SqliteDatabase};
pub use error::{Error, Result};
pub use store::SqliteKnowledgeStore;
