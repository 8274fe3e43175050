//! nlsql server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) and `NLSQL_*`
//! environment variables, opens the relational database and the knowledge
//! store, populates the store on first run, connects to the language model if
//! one is configured, and serves the JSON API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use nlsql_core::{
  curator::{Curator, PopulateOutcome},
  embed::HashingEmbedder,
  generator::SqlGenerator,
};
use nlsql_server::{AppState, GeminiClient, GeminiError, ServerConfig, settings::expand_tilde};
use nlsql_store_sqlite::{SqliteDatabase, SqliteKnowledgeStore};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Natural-language to SQL server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create and fill the sample `users` and `orders` tables.
  #[arg(long)]
  seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  // Relational database.
  let database_path = expand_tilde(&cfg.database_path);
  let database = SqliteDatabase::open(&database_path)
    .await
    .with_context(|| format!("failed to open database at {database_path:?}"))?;
  database.bootstrap().await.context("failed to create service tables")?;
  if cli.seed || cfg.seed_sample_data {
    database.seed_sample_data().await.context("failed to seed sample data")?;
  }

  // Knowledge store, populated once.
  let knowledge_path = expand_tilde(&cfg.knowledge_path);
  let knowledge = SqliteKnowledgeStore::open(&knowledge_path, Arc::new(HashingEmbedder::default()))
    .await
    .with_context(|| format!("failed to open knowledge store at {knowledge_path:?}"))?;

  match Curator::new(&knowledge, &database, cfg.dialect).populate().await {
    Ok(PopulateOutcome::Populated(report)) => {
      tracing::info!(inserted = report.inserted, failed = report.failed.len(), "knowledge store ready");
    }
    Ok(PopulateOutcome::Skipped { existing }) => {
      tracing::info!(existing, "knowledge store ready");
    }
    Err(e) => tracing::error!(error = %e, "knowledge store population failed; will retry on next start"),
  }

  // Language model.
  let model = match GeminiClient::connect(&cfg.model).await {
    Ok(client) => Some(client),
    Err(GeminiError::MissingKey) => {
      tracing::info!("no API key configured; running without a language model");
      None
    }
    Err(e) => {
      tracing::warn!(error = %e, "running without a language model");
      None
    }
  };

  let knowledge = Arc::new(knowledge);
  let state = AppState {
    generator: Arc::new(SqlGenerator::new(knowledge.clone(), model, cfg.generator_settings())),
    knowledge,
    database: Arc::new(database),
  };

  let app = nlsql_server::router(state);
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
