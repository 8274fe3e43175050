//! Runtime configuration: an optional TOML file layered under `NLSQL_`
//! environment variables. Every key has a default.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use nlsql_core::{dialect::Dialect, generator::GeneratorSettings, retriever::DEFAULT_TOP_K};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "NLSQL";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  /// Relational database queries are generated for.
  pub database_path:    PathBuf,
  /// Knowledge store file.
  pub knowledge_path:   PathBuf,
  pub dialect:          Dialect,
  pub retrieval_top_k:  usize,
  /// Create and fill the sample `users` / `orders` tables at startup.
  pub seed_sample_data: bool,
  pub model:            ModelConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
  pub api_key:      String,
  /// Candidate model names, tried in order at startup.
  pub models:       Vec<String>,
  pub endpoint:     String,
  pub timeout_secs: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "0.0.0.0".into(),
      port:             8000,
      database_path:    PathBuf::from("nlsql.db"),
      knowledge_path:   PathBuf::from("knowledge.db"),
      dialect:          Dialect::default(),
      retrieval_top_k:  DEFAULT_TOP_K,
      seed_sample_data: false,
      model:            ModelConfig::default(),
    }
  }
}

impl Default for ModelConfig {
  fn default() -> Self {
    Self {
      api_key:      String::new(),
      models:       ["gemini-1.5-flash", "gemini-1.5-pro", "gemini-pro-latest"]
        .map(String::from)
        .to_vec(),
      endpoint:     "https://generativelanguage.googleapis.com".into(),
      timeout_secs: 30,
    }
  }
}

impl ServerConfig {
  /// Read `path` (if it exists) and the environment.
  ///
  /// Nested keys use `__` in variable names, e.g. `NLSQL_MODEL__API_KEY`.
  /// `GOOGLE_API_KEY` is honoured when no key is configured otherwise.
  pub fn load(path: &Path) -> Result<Self, ::config::ConfigError> {
    let mut builder = ::config::Config::builder();
    if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
      builder = builder.set_default("model.api_key", key)?;
    }
    builder
      .add_source(::config::File::from(path).required(false))
      .add_source(
        ::config::Environment::with_prefix(ENV_PREFIX)
          .prefix_separator("_")
          .separator("__")
          .list_separator(",")
          .with_list_parse_key("model.models")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  pub fn generator_settings(&self) -> GeneratorSettings {
    GeneratorSettings {
      dialect: self.dialect,
      top_k:   self.retrieval_top_k,
      timeout: Duration::from_secs(self.model.timeout_secs),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/nlsql.toml")).unwrap();
    assert_eq!(cfg.port, 8000);
    assert_eq!(cfg.retrieval_top_k, 3);
    assert_eq!(cfg.dialect, Dialect::Sqlite);
    assert_eq!(cfg.model.models[0], "gemini-1.5-flash");
    assert_eq!(cfg.generator_settings().timeout, Duration::from_secs(30));
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = std::env::temp_dir().join(format!("nlsql-settings-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(
      f,
      "port = 9100\ndialect = \"postgres\"\nretrieval_top_k = 5\n\n[model]\nmodels = [\"gemini-pro-latest\"]\ntimeout_secs = 7"
    )
    .unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.port, 9100);
    assert_eq!(cfg.dialect, Dialect::Postgres);
    assert_eq!(cfg.model.models, ["gemini-pro-latest"]);
    // unspecified keys keep their defaults
    assert_eq!(cfg.host, "0.0.0.0");
    assert_eq!(cfg.model.endpoint, "https://generativelanguage.googleapis.com");

    let settings = cfg.generator_settings();
    assert_eq!(settings.top_k, 5);
    assert_eq!(settings.timeout, Duration::from_secs(7));
    std::fs::remove_dir_all(dir).ok();
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/x.db")), PathBuf::from(home).join("x.db"));
    assert_eq!(expand_tilde(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
  }
}
