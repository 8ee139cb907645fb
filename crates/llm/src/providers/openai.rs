//! OpenAI provider implementation.
//!
//! Covers the two OpenAI endpoints the answering service talks to:
//! chat completions and moderation.
//! OpenAI API: https://platform.openai.com/docs/api-reference

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::moderation::{ModerationClient, ModerationVerdict};
use crate::types::ChatMessage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use yaseen_core::{AppError, AppResult};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const CHAT_ENDPOINT: &str = "/v1/chat/completions";
const MODERATION_ENDPOINT: &str = "/v1/moderations";
const DEFAULT_MODERATION_MODEL: &str = "text-moderation-latest";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// OpenAI chat completion request format.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// OpenAI chat completion response format.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ModerationRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationResult>,
}

#[derive(Debug, Deserialize)]
struct ModerationResult {
    flagged: bool,
    #[serde(default)]
    categories: BTreeMap<String, bool>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// OpenAI client for chat completions and moderation.
pub struct OpenAiClient {
    /// Base URL for the API (no trailing slash)
    base_url: String,

    /// Bearer credential
    api_key: String,

    /// Moderation model identifier
    moderation_model: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client against the public API with the default timeout.
    pub fn new(api_key: impl Into<String>) -> AppResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client against a custom base URL.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::Llm("OpenAI provider requires API key".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to create HTTP client for OpenAI: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            moderation_model: DEFAULT_MODERATION_MODEL.to_string(),
            client,
        })
    }

    /// Set the moderation model.
    pub fn with_moderation_model(mut self, model: impl Into<String>) -> Self {
        self.moderation_model = model.into();
        self
    }

    fn to_chat_request<'a>(&self, request: &'a LlmRequest) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn convert_response(&self, response: ChatCompletionResponse) -> AppResult<LlmResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Llm("OpenAI returned no choices".to_string()))?;

        let content = choice
            .message
            .content
            .ok_or_else(|| AppError::Llm("OpenAI returned an empty message".to_string()))?;

        let usage = response
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: response.model,
            usage,
            finish_reason: choice.finish_reason,
        })
    }

    /// POST a JSON body and decode the JSON reply, mapping HTTP errors.
    async fn post_json<B, R>(&self, endpoint: &str, body: &B) -> AppResult<R>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to OpenAI: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!(
                "OpenAI API error ({}): {}",
                status,
                extract_error_message(&body)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse OpenAI response: {}", e)))
    }
}

/// Pull the human-readable message out of an OpenAI error body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

fn convert_moderation(response: ModerationResponse) -> AppResult<ModerationVerdict> {
    let result = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Moderation("Moderation returned no results".to_string()))?;

    let categories = result
        .categories
        .into_iter()
        .filter_map(|(name, hit)| hit.then_some(name))
        .collect();

    Ok(ModerationVerdict {
        flagged: result.flagged,
        categories,
    })
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(model = %request.model, "Sending completion request to OpenAI");
        tracing::debug!("Request: {:?}", request);

        let body = self.to_chat_request(request);
        let response: ChatCompletionResponse = self.post_json(CHAT_ENDPOINT, &body).await?;

        let response = self.convert_response(response)?;
        tracing::info!(
            completion_tokens = response.usage.completion_tokens,
            "Received completion from OpenAI"
        );

        Ok(response)
    }
}

#[async_trait::async_trait]
impl ModerationClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn classify(&self, text: &str) -> AppResult<ModerationVerdict> {
        tracing::debug!(model = %self.moderation_model, "Sending moderation request to OpenAI");

        let body = ModerationRequest {
            model: &self.moderation_model,
            input: text,
        };

        let response: ModerationResponse = self
            .post_json(MODERATION_ENDPOINT, &body)
            .await
            .map_err(|e| AppError::Moderation(e.to_string()))?;

        convert_moderation(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAiClient {
        OpenAiClient::with_base_url("http://localhost:9999/", "sk-test", Duration::from_secs(1))
            .unwrap()
    }

    #[test]
    fn test_requires_api_key() {
        assert!(OpenAiClient::new("").is_err());
        assert!(OpenAiClient::new("  ").is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(client().base_url, "http://localhost:9999");
    }

    #[test]
    fn test_chat_request_serialization() {
        let request = LlmRequest::new(
            vec![
                ChatMessage::system("persona"),
                ChatMessage::system("context"),
                ChatMessage::user("question"),
            ],
            "gpt-4o-mini",
        )
        .with_temperature(0.2)
        .with_max_tokens(512);

        let client = client();
        let json = serde_json::to_value(client.to_chat_request(&request)).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 512);
        assert_eq!(json["messages"].as_array().unwrap().len(), 3);
        assert_eq!(json["messages"][2]["role"], "user");
    }

    #[test]
    fn test_convert_response() {
        let raw = r#"{
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": "Answer [[Q 2:255]]"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 100, "completion_tokens": 8, "total_tokens": 108}
        }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let response = client().convert_response(parsed).unwrap();

        assert_eq!(response.content, "Answer [[Q 2:255]]");
        assert_eq!(response.usage.total_tokens, 108);
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_convert_response_without_choices() {
        let parsed: ChatCompletionResponse =
            serde_json::from_str(r#"{"model": "gpt-4o-mini", "choices": []}"#).unwrap();
        assert!(client().convert_response(parsed).is_err());
    }

    #[test]
    fn test_convert_moderation_collects_categories() {
        let raw = r#"{"results": [{"flagged": true, "categories": {"hate": true, "violence": false, "harassment": true}}]}"#;
        let parsed: ModerationResponse = serde_json::from_str(raw).unwrap();
        let verdict = convert_moderation(parsed).unwrap();

        assert!(verdict.flagged);
        assert_eq!(verdict.categories, vec!["harassment", "hate"]);
    }

    #[test]
    fn test_convert_moderation_empty_results_is_error() {
        let parsed: ModerationResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(matches!(
            convert_moderation(parsed),
            Err(AppError::Moderation(_))
        ));
    }

    #[test]
    fn test_extract_error_message() {
        let body = r#"{"error": {"message": "Invalid API key", "type": "invalid_request_error"}}"#;
        assert_eq!(extract_error_message(body), "Invalid API key");
        assert_eq!(extract_error_message("bad gateway"), "bad gateway");
    }
}
