//! Target SQL dialect.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The SQL dialect the generated statements must be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
  Postgres,
  #[default]
  Sqlite,
}

impl Dialect {
  /// Human-readable product name used in prompts and tips.
  pub fn display_name(self) -> &'static str {
    match self {
      Dialect::Postgres => "PostgreSQL",
      Dialect::Sqlite => "SQLite",
    }
  }

  /// Suffix appended to `DROP TABLE` so dependent objects go too.
  pub fn drop_cascade(self) -> &'static str {
    match self {
      Dialect::Postgres => " CASCADE",
      Dialect::Sqlite => "",
    }
  }
}

impl fmt::Display for Dialect {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.display_name())
  }
}
