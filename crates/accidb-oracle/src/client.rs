//! Async client for an OpenAI-compatible chat-completions endpoint.

use std::{path::PathBuf, time::Duration};

use accidb_core::ExtractionError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

fn default_timeout_secs() -> u64 { 60 }

/// Connection settings for the model endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
  /// e.g. `https://api.openai.com/v1`; `/chat/completions` is appended.
  pub base_url:     String,
  pub model:        String,
  #[serde(default)]
  pub api_key:      Option<String>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Where the extraction cache is persisted between runs.
  #[serde(default)]
  pub cache_path:   Option<PathBuf>,
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
  model:           &'a str,
  temperature:     f32,
  messages:        [Message<'a>; 2],
  response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct Message<'a> {
  role:    &'static str,
  content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
  #[serde(rename = "type")]
  kind:        &'static str,
  json_schema: NamedSchema<'a>,
}

#[derive(Serialize)]
struct NamedSchema<'a> {
  name:   &'static str,
  strict: bool,
  schema: &'a Value,
}

#[derive(Deserialize)]
struct ChatResponse {
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
  content: Option<String>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ChatClient {
  client: Client,
  config: OracleConfig,
}

impl ChatClient {
  pub fn new(config: OracleConfig) -> Result<Self> {
    if config.base_url.trim().is_empty() {
      return Err(Error::MissingBaseUrl);
    }
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &OracleConfig { &self.config }

  fn url(&self) -> String {
    format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match self.config.api_key.as_deref() {
      Some(key) if !key.is_empty() => req.bearer_auth(key),
      _ => req,
    }
  }

  /// `POST /chat/completions`, constrained to `schema`. Returns the raw
  /// message content.
  pub async fn complete(
    &self,
    system: &str,
    prompt: &str,
    schema: &Value,
  ) -> Result<String, ExtractionError> {
    let body = ChatRequest {
      model:           &self.config.model,
      temperature:     0.0,
      messages:        [
        Message { role: "system", content: system },
        Message { role: "user", content: prompt },
      ],
      response_format: ResponseFormat {
        kind:        "json_schema",
        json_schema: NamedSchema { name: "extraction", strict: true, schema },
      },
    };

    let resp = self
      .auth(self.client.post(self.url()))
      .json(&body)
      .send()
      .await
      .map_err(|e| transport(format!("POST /chat/completions failed: {e}")))?;

    if !resp.status().is_success() {
      return Err(transport(format!("POST /chat/completions → {}", resp.status())));
    }

    let reply: ChatResponse = resp
      .json()
      .await
      .map_err(|e| transport(format!("deserialising completion: {e}")))?;

    reply
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .ok_or_else(|| transport("completion has no content".to_owned()))
  }
}

fn transport(message: String) -> ExtractionError { ExtractionError::Transport(message) }
