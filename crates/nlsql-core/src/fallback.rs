//! Keyword-driven SQL synthesis used when model generation is unavailable or
//! fails.
//!
//! Rules are tested top to bottom against the lower-cased question and the
//! first match wins. The order is load-bearing: a question mentioning both
//! `count` and `users` + `orders` gets the count query, not the join.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::dialect::Dialect;

/// Tables dropped, in dependency order, by the "drop all tables" rule.
pub const KNOWN_TABLES: [&str; 3] = ["orders", "users", "query_history"];

/// Cities present in the sample data, with their canonical spelling.
const KNOWN_CITIES: [(&str, &str); 3] = [
  ("new york", "New York"),
  ("los angeles", "Los Angeles"),
  ("chicago", "Chicago"),
];

const DEFAULT_CITY: &str = "New York";
const DEFAULT_AGE_THRESHOLD: u32 = 25;

static UNDER_NUMBER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"under\s+(\d+)").expect("static regex"));

/// Which rule of the cascade produced a fallback statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackRule {
  DropAllTables,
  DropTableHint,
  CityFilter,
  OrderAmount,
  CountUsers,
  UsersOrdersJoin,
  AgeFilter,
  Generic,
}

/// A synthesised statement and the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallback {
  pub rule: FallbackRule,
  pub sql:  String,
}

/// Run the keyword cascade over `question`.
pub fn synthesize(question: &str, dialect: Dialect) -> Fallback {
  let q = question.to_lowercase();
  let has = |needle: &str| q.contains(needle);

  let (rule, sql) = if (has("delete") || has("drop")) && has("table") {
    if has("all") {
      (FallbackRule::DropAllTables, drop_all_sql(dialect))
    } else {
      (
        FallbackRule::DropTableHint,
        format!(
          "-- Example: DROP TABLE table_name{};\nSELECT 'Specify which table to drop' as message;",
          dialect.drop_cascade()
        ),
      )
    }
  } else if has("users") && (has("city") || mentioned_city(&q).is_some()) {
    let city = mentioned_city(&q).unwrap_or(DEFAULT_CITY);
    (
      FallbackRule::CityFilter,
      format!("SELECT * FROM users WHERE city = '{city}' LIMIT 10;"),
    )
  } else if has("orders") && (has("amount") || has("price")) {
    (
      FallbackRule::OrderAmount,
      "SELECT * FROM orders WHERE amount > 100 ORDER BY amount DESC LIMIT 10;".to_owned(),
    )
  } else if has("count") && has("users") {
    (
      FallbackRule::CountUsers,
      "SELECT COUNT(*) as user_count FROM users;".to_owned(),
    )
  } else if has("join") || (has("users") && has("orders")) {
    (
      FallbackRule::UsersOrdersJoin,
      "SELECT u.name, o.product, o.amount FROM users u JOIN orders o ON u.id = o.user_id LIMIT 10;"
        .to_owned(),
    )
  } else if has("under") && (has("age") || (has("users") && under_threshold(&q).is_some())) {
    let age = under_threshold(&q).unwrap_or(DEFAULT_AGE_THRESHOLD);
    (
      FallbackRule::AgeFilter,
      format!("SELECT * FROM users WHERE age < {age} LIMIT 10;"),
    )
  } else {
    (FallbackRule::Generic, generic_sql(question))
  };

  Fallback { rule, sql }
}

/// The catch-all template: the question as a comment, then a bounded select.
pub fn generic_sql(question: &str) -> String {
  format!(
    "-- Fallback query for: {}\nSELECT * FROM users LIMIT 10;",
    single_line(question)
  )
}

/// Flatten line breaks so text can sit inside a `--` comment.
pub(crate) fn single_line(text: &str) -> String {
  text.split(['\n', '\r']).map(str::trim).filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ")
}

fn drop_all_sql(dialect: Dialect) -> String {
  let mut sql = format!(
    "-- Drop all tables{}",
    if dialect == Dialect::Postgres { " (CASCADE handles dependencies)" } else { "" }
  );
  for table in KNOWN_TABLES {
    sql.push_str(&format!("\nDROP TABLE IF EXISTS {table}{};", dialect.drop_cascade()));
  }
  sql
}

fn mentioned_city(q: &str) -> Option<&'static str> {
  KNOWN_CITIES
    .iter()
    .find(|(needle, _)| q.contains(needle))
    .map(|(_, canonical)| *canonical)
}

fn under_threshold(q: &str) -> Option<u32> {
  UNDER_NUMBER
    .captures(q)
    .and_then(|caps| caps.get(1))
    .and_then(|m| m.as_str().parse().ok())
}
