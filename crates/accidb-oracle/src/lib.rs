//! Model-assisted field extraction.
//!
//! [`OracleExtractor`] asks a chat-completions model one question per field
//! and forces the answer into a `{"response": ...}` JSON object. It honours
//! the same [`FieldExtractor`] contract as the rule-based extractor; wrap it
//! in a [`CachedExtractor`](accidb_core::cache::CachedExtractor) so repeated
//! contexts are not re-asked.

pub mod client;
pub mod decode;
pub mod error;
pub mod prompts;

use accidb_core::{
  ExtractionError,
  extract::{Extracted, FieldExtractor},
};
use tracing::debug;

pub use client::{ChatClient, OracleConfig};
pub use decode::decode_response;
pub use error::{Error, Result};
pub use prompts::{Prompt, PromptSet, json_schema};

#[derive(Clone)]
pub struct OracleExtractor {
  client:  ChatClient,
  prompts: PromptSet,
}

impl OracleExtractor {
  pub fn new(config: OracleConfig, prompts: PromptSet) -> Result<Self> {
    Ok(Self { client: ChatClient::new(config)?, prompts })
  }
}

impl FieldExtractor for OracleExtractor {
  async fn extract(
    &self,
    field: &str,
    context: &str,
  ) -> Result<Extracted, ExtractionError> {
    let prompt = self
      .prompts
      .get(field)
      .ok_or_else(|| ExtractionError::UnknownField(field.to_owned()))?;

    debug!(field, model = %self.client.config().model, "asking oracle");
    let content = self
      .client
      .complete(&self.prompts.system, &prompt.render(context), &json_schema(prompt.schema))
      .await?;

    decode_response(field, prompt.schema, &content)
  }
}

#[cfg(test)]
mod tests {
  use accidb_core::extract::FieldSchema;
  use serde_json::json;
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
  };

  use super::*;

  fn config(base_url: String) -> OracleConfig {
    OracleConfig {
      base_url,
      model: "test-model".into(),
      api_key: Some("secret".into()),
      timeout_secs: 5,
      cache_path: None,
    }
  }

  fn completion(content: &str) -> serde_json::Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
  }

  #[tokio::test]
  async fn asks_the_model_and_decodes_the_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/v1/chat/completions"))
      .and(header("authorization", "Bearer secret"))
      .and(body_partial_json(json!({
        "model": "test-model",
        "response_format": { "type": "json_schema" },
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"response": 2}"#)))
      .expect(1)
      .mount(&server)
      .await;

    let prompts = PromptSet::new("sys").with("injuries", "Blessés ? {context}", FieldSchema::Number);
    let oracle = OracleExtractor::new(config(format!("{}/v1/", server.uri())), prompts).unwrap();

    assert_eq!(
      oracle.extract("injuries", "Deux blessés.").await,
      Ok(Extracted::Number(2))
    );
  }

  #[tokio::test]
  async fn http_errors_are_transport_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(503))
      .mount(&server)
      .await;

    let oracle = OracleExtractor::new(config(server.uri()), PromptSet::epicea()).unwrap();
    assert!(matches!(
      oracle.extract("title", "…").await,
      Err(ExtractionError::Transport(_))
    ));
  }

  #[tokio::test]
  async fn off_schema_answers_are_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(completion("trois")))
      .mount(&server)
      .await;

    let oracle = OracleExtractor::new(config(server.uri()), PromptSet::epicea()).unwrap();
    assert!(matches!(
      oracle.extract("fatalities", "…").await,
      Err(ExtractionError::Malformed { .. })
    ));
  }

  #[tokio::test]
  async fn unknown_fields_never_reach_the_network() {
    let oracle =
      OracleExtractor::new(config("http://127.0.0.1:9".into()), PromptSet::epicea()).unwrap();
    assert_eq!(
      oracle.extract("plant_name", "…").await,
      Err(ExtractionError::UnknownField("plant_name".into()))
    );
  }

  #[test]
  fn empty_base_url_is_rejected() {
    assert!(matches!(
      OracleExtractor::new(config(" ".into()), PromptSet::epicea()),
      Err(Error::MissingBaseUrl)
    ));
  }
}
