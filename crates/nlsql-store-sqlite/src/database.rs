//! [`SqliteDatabase`], the relational database queries are generated for.

use std::path::Path;

use rusqlite::{Batch, Connection};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use nlsql_core::schema::{ColumnInfo, SampleRow, SchemaSource, SqlValue, TableSchema};

use crate::{
  Error, Result,
  encode::{DeclaredType, decode_value, quote_table},
  schema::{HISTORY_SCHEMA, SAMPLE_ROWS, SAMPLE_SCHEMA},
};

/// Administrative commands refused by [`SqliteDatabase::execute`].
const FORBIDDEN: [&str; 4] = ["ATTACH DATABASE", "DETACH DATABASE", "DROP DATABASE", "CREATE DATABASE"];

// ─── Results ─────────────────────────────────────────────────────────────────

/// What a statement (or script) produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecuteOutcome {
  /// Columns of the last row-returning statement.
  pub columns:       Vec<String>,
  pub rows:          Vec<Map<String, Value>>,
  /// Rows changed by the script; `None` when it only read.
  pub rows_affected: Option<usize>,
  pub statements:    usize,
}

/// One `query_history` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
  pub id:            i64,
  pub natural_query: String,
  pub generated_sql: String,
  pub status:        String,
  pub created_at:    String,
}

// ─── Database ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct SqliteDatabase {
  conn: tokio_rusqlite::Connection,
}

impl SqliteDatabase {
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Ok(Self { conn })
  }

  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Ok(Self { conn })
  }

  /// Create the service's own tables.
  pub async fn bootstrap(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(HISTORY_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Create `users` / `orders` and fill them if `users` is empty. Returns
  /// whether rows were inserted.
  pub async fn seed_sample_data(&self) -> Result<bool> {
    let seeded = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(SAMPLE_SCHEMA)?;
        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
        if existing > 0 {
          return Ok(false);
        }
        tx.execute_batch(SAMPLE_ROWS)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;
    if seeded {
      info!("seeded sample users and orders");
    }
    Ok(seeded)
  }

  /// Run `sql`, which may hold several statements.
  ///
  /// Row-returning statements contribute their rows (the last one wins);
  /// everything else contributes to `rows_affected`.
  pub async fn execute(&self, sql: &str) -> Result<ExecuteOutcome> {
    let sql = sql.trim().to_owned();
    if sql.is_empty() {
      return Err(Error::EmptyStatement);
    }
    let upper = sql.to_ascii_uppercase();
    if let Some(keyword) = FORBIDDEN.into_iter().find(|k| upper.contains(k)) {
      return Err(Error::Forbidden(keyword));
    }

    let (statements, result, changed) = self
      .conn
      .call(move |conn| {
        let before = total_changes(conn)?;
        let mut batch = Batch::new(conn, &sql);
        let mut statements = 0;
        let mut result: Option<(Vec<String>, Vec<Vec<SqlValue>>)> = None;

        while let Some(mut stmt) = batch.next()? {
          statements += 1;
          if stmt.column_count() == 0 {
            stmt.raw_execute()?;
            continue;
          }
          let columns: Vec<String> =
            stmt.column_names().into_iter().map(str::to_owned).collect();
          let mut rows = stmt.query([])?;
          let mut cells = Vec::new();
          while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
              values.push(decode_value(row.get_ref(i)?, DeclaredType::Other));
            }
            cells.push(values);
          }
          result = Some((columns, cells));
        }

        let changed = total_changes(conn)? - before;
        Ok((statements, result, changed))
      })
      .await?;

    if statements == 0 {
      return Err(Error::EmptyStatement);
    }

    let read_rows = result.is_some();
    let (columns, cells) = result.unwrap_or_default();
    let rows = cells
      .into_iter()
      .map(|values| {
        columns
          .iter()
          .cloned()
          .zip(values.iter().map(SqlValue::to_json))
          .collect::<Map<_, _>>()
      })
      .collect::<Vec<_>>();

    debug!(statements, rows = rows.len(), changed, "executed statement");
    Ok(ExecuteOutcome {
      columns,
      rows,
      rows_affected: (!read_rows || changed > 0).then_some(changed as usize),
      statements,
    })
  }

  /// Append a `query_history` record; returns its id.
  pub async fn record_history(&self, question: &str, sql: &str, status: &str) -> Result<i64> {
    let (question, sql, status) = (question.to_owned(), sql.to_owned(), status.to_owned());
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO query_history (natural_query, generated_sql, status) VALUES (?1, ?2, ?3)",
          rusqlite::params![question, sql, status],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  /// The most recent `limit` history records, newest first.
  pub async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let records = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, natural_query, generated_sql, status, created_at
           FROM query_history
           ORDER BY id DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| {
            Ok(HistoryRecord {
              id:            row.get(0)?,
              natural_query: row.get(1)?,
              generated_sql: row.get(2)?,
              status:        row.get(3)?,
              created_at:    row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(records)
  }

  /// Every table with its columns.
  pub async fn tables(&self) -> Result<Vec<TableSchema>> {
    let mut tables = Vec::new();
    for name in self.list_tables().await? {
      let columns = self.columns(&name).await?;
      tables.push(TableSchema { name, columns });
    }
    Ok(tables)
  }
}

fn total_changes(conn: &Connection) -> rusqlite::Result<i64> {
  conn.query_row("SELECT total_changes()", [], |r| r.get(0))
}

fn table_info(conn: &Connection, quoted: &str) -> rusqlite::Result<Vec<ColumnInfo>> {
  let mut stmt = conn.prepare(&format!("PRAGMA table_info({quoted})"))?;
  stmt
    .query_map([], |row| {
      let notnull: i64 = row.get(3)?;
      let pk: i64 = row.get(5)?;
      Ok(ColumnInfo {
        name:        row.get(1)?,
        data_type:   row.get(2)?,
        nullable:    notnull == 0 && pk == 0,
        primary_key: pk > 0,
      })
    })?
    .collect()
}

// ─── SchemaSource impl ───────────────────────────────────────────────────────

impl SchemaSource for SqliteDatabase {
  type Error = Error;

  async fn list_tables(&self) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT name FROM sqlite_master
           WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
           ORDER BY name",
        )?;
        let names = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
      })
      .await?;
    Ok(names)
  }

  async fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
    let quoted = quote_table(table)?;
    let columns = self.conn.call(move |conn| Ok(table_info(conn, &quoted)?)).await?;
    if columns.is_empty() {
      return Err(Error::UnknownTable(table.to_owned()));
    }
    Ok(columns)
  }

  async fn sample_rows(&self, table: &str, n: usize) -> Result<Vec<SampleRow>> {
    let quoted = quote_table(table)?;
    let limit = n as i64;
    let rows = self
      .conn
      .call(move |conn| {
        let declared: Vec<(String, DeclaredType)> = table_info(conn, &quoted)?
          .into_iter()
          .map(|c| {
            let ty = DeclaredType::parse(&c.data_type);
            (c.name, ty)
          })
          .collect();

        let mut stmt = conn.prepare(&format!("SELECT * FROM {quoted} LIMIT ?1"))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
        let mut rows = stmt.query(rusqlite::params![limit])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
          let mut sample = Vec::with_capacity(names.len());
          for (i, name) in names.iter().enumerate() {
            let ty = declared
              .iter()
              .find(|(col, _)| col == name)
              .map_or(DeclaredType::Other, |(_, ty)| *ty);
            sample.push((name.clone(), decode_value(row.get_ref(i)?, ty)));
          }
          out.push(sample);
        }
        Ok(out)
      })
      .await?;
    Ok(rows)
  }
}
