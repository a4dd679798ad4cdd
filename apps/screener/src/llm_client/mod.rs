//! Anthropic Messages client, the production `InferenceAdapter`.
//!
//! Stages never call the API directly; every model request goes through
//! `InferenceAdapter::infer`, which this client implements.
//!
//! Model: claude-sonnet-4-5 (hardcoded, not configurable)

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::inference::{InferenceAdapter, InferenceFailure, OutputContract};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for every stage.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 8192;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Required environment variable 'ANTHROPIC_API_KEY' is not set")]
    MissingApiKey,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Wraps the Anthropic Messages API. One request per call, no retries: a
/// failed invocation is re-run by whoever scheduled it.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, api_key })
    }

    /// Makes a single call to the Claude API, returning the full response object.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let llm_response: LlmResponse = response.json().await?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }

    /// Calls the LLM and deserializes the text response as JSON.
    /// The system prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let response = self.call(prompt, system).await?;

        let text = response.text().ok_or(LlmError::EmptyContent)?;

        // Strip markdown code fences if the model wraps JSON in them
        let text = strip_json_fences(text);

        serde_json::from_str(text).map_err(LlmError::Parse)
    }
}

#[async_trait]
impl InferenceAdapter for LlmClient {
    async fn infer(
        &self,
        request: &str,
        contract: &OutputContract,
    ) -> Result<Value, InferenceFailure> {
        let system = prompts::structured_output_system(contract);
        self.call_json::<Value>(request, &system)
            .await
            .map_err(|e| InferenceFailure(e.to_string()))
    }
}

/// Builds the [`LlmClient`] on the first inference request. A stage whose
/// output already exists never reaches the adapter, so it completes without
/// an API key.
pub struct LazyLlmClient {
    api_key: Option<String>,
    client: OnceCell<LlmClient>,
}

impl LazyLlmClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&LlmClient, LlmError> {
        self.client
            .get_or_try_init(|| async {
                let api_key = self.api_key.clone().ok_or(LlmError::MissingApiKey)?;
                LlmClient::new(api_key)
            })
            .await
    }
}

#[async_trait]
impl InferenceAdapter for LazyLlmClient {
    async fn infer(
        &self,
        request: &str,
        contract: &OutputContract,
    ) -> Result<Value, InferenceFailure> {
        let client = self
            .client()
            .await
            .map_err(|e| InferenceFailure(e.to_string()))?;
        client.infer(request, contract).await
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::memory::MemoryArtifactStore;
    use crate::artifacts::{ArtifactStore, PathResolver, Target};
    use crate::errors::StageError;
    use crate::pipeline::runner::{SkipReason, StageOutcome};
    use crate::pipeline::StageRunner;
    use crate::stages::{self, screening::ScreeningStage};
    use std::path::Path;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n[{\"answer\": \"Yes\"}]\n```";
        assert_eq!(strip_json_fences(input), "[{\"answer\": \"Yes\"}]");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"verdict\": \"GO\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"verdict\": \"GO\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"verdict\": \"GO\"}\n";
        assert_eq!(strip_json_fences(input), "{\"verdict\": \"GO\"}");
    }

    #[test]
    fn test_response_text_picks_first_text_block() {
        let response: LlmResponse = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "thinking", "text": null},
                {"type": "text", "text": "[]"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 2}
        }))
        .unwrap();
        assert_eq!(response.text(), Some("[]"));
    }

    #[test]
    fn test_api_error_display_includes_status() {
        let err = LlmError::Api {
            status: 529,
            message: "Overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "API error (status 529): Overloaded");
    }

    fn screening_setup() -> (PathResolver, Target) {
        let paths = PathResolver::new("/work", Some(Path::new("/work")), Path::new("prompts"));
        let target = paths.target(Path::new("postings/acme"), None);
        (paths, target)
    }

    #[tokio::test]
    async fn test_existing_output_skips_without_api_key() {
        let (paths, target) = screening_setup();
        let store = MemoryArtifactStore::new();
        store
            .seed(&paths.screening_report(&target), "{\"answers\": []}")
            .await;

        let llm = LazyLlmClient::new(None);
        let outcome = StageRunner::new(&store, &llm, &paths)
            .run(&ScreeningStage, &target)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            StageOutcome::Skipped {
                key: paths.screening_report(&target),
                reason: SkipReason::AlreadyPresent,
            }
        );
        assert!(llm.client.get().is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_only_when_inference_is_needed() {
        let (paths, target) = screening_setup();
        let store = MemoryArtifactStore::new();
        store
            .seed(&paths.asset(stages::SCREENING_TEMPLATE), "Screen this posting.")
            .await;
        store.seed(&paths.asset(stages::MASTER_QUESTIONS), "[]").await;
        store
            .seed(&paths.posting_text(&target), "Rust engineer at Acme.")
            .await;

        let llm = LazyLlmClient::new(None);
        let err = StageRunner::new(&store, &llm, &paths)
            .run(&ScreeningStage, &target)
            .await
            .unwrap_err();

        assert!(matches!(err, StageError::InferenceFailure(_)));
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
        assert!(!store.exists(&paths.screening_report(&target)).await.unwrap());
    }
}
