//! [`GeminiClient`], the Google Generative Language API as a [`LanguageModel`].

use std::time::Duration;

use nlsql_core::model::LanguageModel;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::settings::ModelConfig;

/// Key value shipped in example configs; treated as "no key".
pub const PLACEHOLDER_KEY: &str = "dummy-key-for-now";

const PROBE_PROMPT: &str = "Say hello";

#[derive(Debug, Error)]
pub enum GeminiError {
  #[error("no API key configured")]
  MissingKey,

  #[error("none of the configured models answered: {0:?}")]
  NoModelAvailable(Vec<String>),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("model {model} returned {status}: {body}")]
  Status {
    model:  String,
    status: u16,
    body:   String,
  },

  #[error("response contained no text")]
  EmptyResponse,
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
  contents:          [Content<'a>; 1],
  generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
  parts: [OutPart<'a>; 1],
}

#[derive(Serialize)]
struct OutPart<'a> {
  text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
  temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<InPart>,
}

#[derive(Debug, Deserialize)]
struct InPart {
  text: Option<String>,
}

impl GenerateResponse {
  /// Concatenated text parts of the first candidate.
  fn into_text(self) -> Option<String> {
    let content = self.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    (!text.trim().is_empty()).then_some(text)
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// A client bound to one model name.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct GeminiClient {
  client:   Client,
  endpoint: String,
  api_key:  String,
  model:    String,
}

impl GeminiClient {
  pub fn new(config: &ModelConfig, model: impl Into<String>) -> Result<Self, GeminiError> {
    if !has_usable_key(&config.api_key) {
      return Err(GeminiError::MissingKey);
    }
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self {
      client,
      endpoint: config.endpoint.trim_end_matches('/').to_owned(),
      api_key: config.api_key.clone(),
      model: model.into(),
    })
  }

  /// Try each configured model in order with a short probe prompt and keep
  /// the first that answers.
  pub async fn connect(config: &ModelConfig) -> Result<Self, GeminiError> {
    if !has_usable_key(&config.api_key) {
      return Err(GeminiError::MissingKey);
    }
    for name in &config.models {
      let client = Self::new(config, name.as_str())?;
      match client.generate(PROBE_PROMPT).await {
        Ok(_) => {
          info!(model = %name, "connected to language model");
          return Ok(client);
        }
        Err(e) => warn!(model = %name, error = %e, "model probe failed"),
      }
    }
    Err(GeminiError::NoModelAvailable(config.models.clone()))
  }

  fn url(&self) -> String {
    format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
  }
}

fn has_usable_key(key: &str) -> bool {
  let key = key.trim();
  !key.is_empty() && key != PLACEHOLDER_KEY
}

impl LanguageModel for GeminiClient {
  type Error = GeminiError;

  async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
    let body = GenerateRequest {
      contents:          [Content { parts: [OutPart { text: prompt }] }],
      generation_config: GenerationConfig { temperature: 0.0 },
    };

    let resp = self
      .client
      .post(self.url())
      .query(&[("key", self.api_key.as_str())])
      .json(&body)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(GeminiError::Status {
        model:  self.model.clone(),
        status: status.as_u16(),
        body:   resp.text().await.unwrap_or_default(),
      });
    }

    let parsed: GenerateResponse = resp.json().await?;
    parsed.into_text().ok_or(GeminiError::EmptyResponse)
  }

  fn name(&self) -> &str { &self.model }
}

#[cfg(test)]
mod tests {
  use axum::{
    Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
  };
  use serde_json::{Value, json};
  use tokio::net::TcpListener;

  use super::*;

  /// A stand-in for the API: only `good-model` answers, and it echoes
  /// whether the request was made with temperature 0.
  async fn fake_api(
    Path(rest): Path<String>,
    Query(params): Query<std::collections::HashMap<String, String>>,
    Json(body): Json<Value>,
  ) -> impl IntoResponse {
    if params.get("key").map(String::as_str) != Some("secret") {
      return (StatusCode::FORBIDDEN, Json(json!({ "error": "bad key" })));
    }
    if rest != "good-model:generateContent" {
      return (StatusCode::NOT_FOUND, Json(json!({ "error": "no such model" })));
    }
    let temperature = &body["generationConfig"]["temperature"];
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
    let text = format!("```sql\nSELECT '{prompt}', {temperature};\n```");
    (
      StatusCode::OK,
      Json(json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })),
    )
  }

  async fn serve_fake() -> String {
    let app = Router::new().route("/v1beta/models/{*rest}", post(fake_api));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
  }

  fn config(endpoint: &str, key: &str, models: &[&str]) -> ModelConfig {
    ModelConfig {
      api_key:      key.into(),
      models:       models.iter().map(|m| m.to_string()).collect(),
      endpoint:     endpoint.into(),
      timeout_secs: 5,
    }
  }

  #[tokio::test]
  async fn placeholder_or_empty_key_means_no_model() {
    for key in ["", "  ", PLACEHOLDER_KEY] {
      let err = GeminiClient::connect(&config("http://unused", key, &["m"])).await.err().unwrap();
      assert!(matches!(err, GeminiError::MissingKey));
    }
  }

  #[tokio::test]
  async fn connect_keeps_first_model_that_answers() {
    let endpoint = serve_fake().await;
    let client = GeminiClient::connect(&config(&endpoint, "secret", &["bad-model", "good-model"]))
      .await
      .unwrap();
    assert_eq!(client.name(), "good-model");

    let text = client.generate("hi").await.unwrap();
    assert_eq!(text, "```sql\nSELECT 'hi', 0.0;\n```");
  }

  #[tokio::test]
  async fn connect_fails_when_no_model_answers() {
    let endpoint = serve_fake().await;
    let err = GeminiClient::connect(&config(&endpoint, "secret", &["a", "b"])).await.err().unwrap();
    assert!(matches!(err, GeminiError::NoModelAvailable(models) if models == ["a", "b"]));
  }

  #[tokio::test]
  async fn http_errors_carry_status() {
    let endpoint = serve_fake().await;
    let client = GeminiClient::new(&config(&endpoint, "wrong", &[]), "good-model").unwrap();
    let err = client.generate("hi").await.unwrap_err();
    assert!(matches!(err, GeminiError::Status { status: 403, .. }));
  }

  #[test]
  fn empty_candidates_have_no_text() {
    let resp: GenerateResponse = serde_json::from_value(json!({ "candidates": [] })).unwrap();
    assert!(resp.into_text().is_none());
    let resp: GenerateResponse =
      serde_json::from_value(json!({ "candidates": [{ "content": { "parts": [{ "text": "a" }, { "text": "b" }] } }] }))
        .unwrap();
    assert_eq!(resp.into_text().as_deref(), Some("ab"));
  }
}
