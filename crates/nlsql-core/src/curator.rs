//! Initial population of the knowledge store.
//!
//! The curator turns the live relational schema, a few sample rows per table,
//! and the static [`library`](crate::library) into documents, then bulk-inserts
//! them. It runs at most once per store: a non-empty store is left alone.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  dialect::Dialect,
  document::{DocumentKind, NewDocument},
  library::{static_documents, table_purpose},
  schema::{SampleRow, SchemaSource, TableSchema, row_to_json},
  store::{InsertReport, KnowledgeStore, insert_all},
};

/// Rows sampled per table.
pub const SAMPLE_ROWS: usize = 3;

/// What [`Curator::populate`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulateOutcome {
  /// The store already held documents; nothing was inserted.
  Skipped { existing: usize },
  Populated(InsertReport),
}

pub struct Curator<'a, K, D> {
  store:   &'a K,
  schema:  &'a D,
  dialect: Dialect,
}

impl<'a, K, D> Curator<'a, K, D>
where
  K: KnowledgeStore,
  D: SchemaSource,
{
  pub fn new(store: &'a K, schema: &'a D, dialect: Dialect) -> Self {
    Self { store, schema, dialect }
  }

  /// Populate the store unless it already holds documents.
  ///
  /// Fails with [`Error::SchemaUnavailable`] (inserting nothing) when the
  /// schema cannot be read at all, so a later run can retry.
  pub async fn populate(&self) -> Result<PopulateOutcome> {
    let existing = self.store.count().await.map_err(Error::store)?;
    if existing > 0 {
      info!(existing, "knowledge store already populated");
      return Ok(PopulateOutcome::Skipped { existing });
    }

    let documents = self.build_documents().await?;
    info!(documents = documents.len(), "populating knowledge store");
    let report = insert_all(self.store, &documents).await;
    info!(
      inserted = report.inserted,
      failed = report.failed.len(),
      mode = ?report.mode,
      "knowledge store populated"
    );
    Ok(PopulateOutcome::Populated(report))
  }

  /// Every document the curator would insert, schema-derived first.
  pub async fn build_documents(&self) -> Result<Vec<NewDocument>> {
    let tables = self.introspect().await?;

    let mut documents: Vec<NewDocument> = tables
      .iter()
      .map(|(table, _)| schema_document(table))
      .collect();

    for (table, samples) in &tables {
      if let Some(doc) = sample_document(&table.name, samples)? {
        documents.push(doc);
      }
    }

    documents.extend(static_documents(self.dialect));
    Ok(documents)
  }

  /// Tables with their columns and (best-effort) samples.
  async fn introspect(&self) -> Result<Vec<(TableSchema, Vec<SampleRow>)>> {
    let names = self
      .schema
      .list_tables()
      .await
      .map_err(|e| Error::SchemaUnavailable(e.to_string()))?;

    let mut tables = Vec::with_capacity(names.len());
    let mut last_error = None;

    for name in names {
      let columns = match self.schema.columns(&name).await {
        Ok(columns) => columns,
        Err(e) => {
          warn!(table = %name, error = %e, "skipping table: column introspection failed");
          last_error = Some(e.to_string());
          continue;
        }
      };

      let samples = match self.schema.sample_rows(&name, SAMPLE_ROWS).await {
        Ok(rows) => rows,
        Err(e) => {
          warn!(table = %name, error = %e, "could not sample table");
          Vec::new()
        }
      };

      debug!(table = %name, columns = columns.len(), samples = samples.len(), "introspected table");
      tables.push((TableSchema { name, columns }, samples));
    }

    match (tables.is_empty(), last_error) {
      (true, Some(e)) => Err(Error::SchemaUnavailable(e)),
      _ => Ok(tables),
    }
  }
}

fn schema_document(table: &TableSchema) -> NewDocument {
  let columns = table
    .columns
    .iter()
    .map(|c| c.describe())
    .collect::<Vec<_>>()
    .join(", ");

  NewDocument::new(
    format!("{}_schema", table.name),
    DocumentKind::Schema,
    format!(
      "{} table contains columns: {columns}. This table is used for storing {}.",
      table.name,
      table_purpose(&table.name)
    ),
  )
  .with("table", table.name.as_str())
}

fn sample_document(table: &str, samples: &[SampleRow]) -> Result<Option<NewDocument>> {
  if samples.is_empty() {
    return Ok(None);
  }

  let rows: Vec<Value> = samples
    .iter()
    .take(SAMPLE_ROWS)
    .map(|row| Value::Object(row_to_json(row)))
    .collect();

  Ok(Some(
    NewDocument::new(
      format!("{table}_samples"),
      DocumentKind::SampleData,
      format!("Sample data from {table} table: {}", serde_json::to_string(&rows)?),
    )
    .with("table", table),
  ))
}

#[cfg(test)]
mod tests {
  use crate::{
    schema::ColumnInfo,
    testing::{FakeSchema, MemoryStore},
  };

  use super::*;

  #[tokio::test]
  async fn populate_is_idempotent() {
    let store = MemoryStore::default();
    let schema = FakeSchema::default();
    let curator = Curator::new(&store, &schema, Dialect::Postgres);

    let first = curator.populate().await.unwrap();
    let count_once = store.count().await.unwrap();
    assert!(matches!(first, PopulateOutcome::Populated(_)));

    let second = curator.populate().await.unwrap();
    assert_eq!(second, PopulateOutcome::Skipped { existing: count_once });
    assert_eq!(store.count().await.unwrap(), count_once);
  }

  #[tokio::test]
  async fn corpus_has_schema_samples_and_library() {
    let store = MemoryStore::default();
    let schema = FakeSchema::default();
    Curator::new(&store, &schema, Dialect::Postgres).populate().await.unwrap();

    // 2 schema + 2 sample + 1 relationship + 6 patterns + 6 examples + 3 tips
    assert_eq!(store.count().await.unwrap(), 20);

    let users = store.get("users_schema").await.unwrap().unwrap();
    assert_eq!(
      users.content,
      "users table contains columns: id (INTEGER, NOT NULL, PRIMARY KEY), name (VARCHAR(100)), city (VARCHAR(50)). \
       This table is used for storing customer information including personal details and location."
    );

    let samples = store.get("orders_samples").await.unwrap().unwrap();
    assert!(samples.content.starts_with("Sample data from orders table: ["));
    assert!(samples.content.contains("999.99"));

    let rel = store.get("users_orders_relationship").await.unwrap().unwrap();
    assert_eq!(rel.metadata["tables"].as_str(), Some("users,orders"));
  }

  #[tokio::test]
  async fn failed_sampling_only_drops_that_table_samples() {
    let store = MemoryStore::default();
    let schema = FakeSchema {
      fail_samples: ["users".to_string()].into(),
      ..Default::default()
    };
    Curator::new(&store, &schema, Dialect::Sqlite).populate().await.unwrap();

    assert!(store.get("users_schema").await.unwrap().is_some());
    assert!(store.get("users_samples").await.unwrap().is_none());
    assert!(store.get("orders_samples").await.unwrap().is_some());
  }

  #[tokio::test]
  async fn failed_columns_skip_only_that_table() {
    let store = MemoryStore::default();
    let schema = FakeSchema {
      fail_columns: ["orders".to_string()].into(),
      ..Default::default()
    };
    Curator::new(&store, &schema, Dialect::Sqlite).populate().await.unwrap();

    assert!(store.get("users_schema").await.unwrap().is_some());
    assert!(store.get("orders_schema").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn unreadable_schema_inserts_nothing() {
    let store = MemoryStore::default();
    let schema = FakeSchema { fail_listing: true, ..Default::default() };
    let err = Curator::new(&store, &schema, Dialect::Sqlite).populate().await.unwrap_err();
    assert!(matches!(err, Error::SchemaUnavailable(_)));
    assert_eq!(store.count().await.unwrap(), 0);

    let schema = FakeSchema {
      fail_columns: ["users".to_string(), "orders".to_string()].into(),
      ..Default::default()
    };
    let err = Curator::new(&store, &schema, Dialect::Sqlite).populate().await.unwrap_err();
    assert!(matches!(err, Error::SchemaUnavailable(_)));
    assert_eq!(store.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn unknown_table_gets_generic_description() {
    let store = MemoryStore::default();
    let schema = FakeSchema {
      extra_tables: vec![TableSchema {
        name:    "invoices".into(),
        columns: vec![ColumnInfo {
          name:        "id".into(),
          data_type:   "INTEGER".into(),
          nullable:    false,
          primary_key: true,
        }],
      }],
      ..Default::default()
    };
    Curator::new(&store, &schema, Dialect::Sqlite).populate().await.unwrap();

    let doc = store.get("invoices_schema").await.unwrap().unwrap();
    assert!(doc.content.ends_with("This table is used for storing data records."));
    // no sample rows for the extra table
    assert!(store.get("invoices_samples").await.unwrap().is_none());
  }
}
