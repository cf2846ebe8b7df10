//! OpenAIApiBackend - direct REST implementation against the OpenAI Chat
//! Completions API.
//!
//! Model names resolve per tier: high-volume participant turns go to the
//! fast model, moderator and analysis turns to the capable model.
//! Configuration comes from environment variables.

use crate::{ChatMessage, ChatRole, GenerationBackend, GenerationError, GenerationRequest, ModelTier};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

const DEFAULT_FAST_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_CAPABLE_MODEL: &str = "gpt-4o";
const BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Backend implementation that talks to the OpenAI HTTP API.
#[derive(Clone)]
pub struct OpenAIApiBackend {
    client: Client,
    api_key: String,
    fast_model: String,
    capable_model: String,
    max_tokens: Option<u32>,
}

impl OpenAIApiBackend {
    /// Creates a new backend with the provided API key and default models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            fast_model: DEFAULT_FAST_MODEL.to_string(),
            capable_model: DEFAULT_CAPABLE_MODEL.to_string(),
            max_tokens: None,
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// Reads `OPENAI_API_KEY` (required), `FGI_FAST_MODEL` and
    /// `FGI_CAPABLE_MODEL` (optional model overrides).
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::ExecutionFailed` when the API key is not
    /// set.
    pub fn try_from_env() -> Result<Self, GenerationError> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            GenerationError::ExecutionFailed(
                "OPENAI_API_KEY not found in environment variables".into(),
            )
        })?;

        let mut backend = Self::new(api_key);
        if let Ok(model) = env::var("FGI_FAST_MODEL") {
            backend.fast_model = model;
        }
        if let Ok(model) = env::var("FGI_CAPABLE_MODEL") {
            backend.capable_model = model;
        }
        Ok(backend)
    }

    /// Overrides the fast-tier model after construction.
    pub fn with_fast_model(mut self, model: impl Into<String>) -> Self {
        self.fast_model = model.into();
        self
    }

    /// Overrides the capable-tier model after construction.
    pub fn with_capable_model(mut self, model: impl Into<String>) -> Self {
        self.capable_model = model.into();
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Capable => &self.capable_model,
        }
    }

    fn build_messages(request: &GenerationRequest) -> Result<Vec<ApiMessage>, GenerationError> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if !request.instruction.trim().is_empty() {
            messages.push(ApiMessage {
                role: "system",
                content: request.instruction.clone(),
            });
        }

        for message in &request.messages {
            messages.push(ApiMessage {
                role: role_name(message.role),
                content: message.content.clone(),
            });
        }

        if messages.is_empty() {
            return Err(GenerationError::ExecutionFailed(
                "generation request must include an instruction or messages".into(),
            ));
        }

        Ok(messages)
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(BASE_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| GenerationError::ProcessError {
                status_code: None,
                message: format!("OpenAI API request failed: {err}"),
                is_retryable: err.is_connect() || err.is_timeout(),
                retry_after: None,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read OpenAI error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            GenerationError::Other(format!("Failed to parse OpenAI response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl GenerationBackend for OpenAIApiBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let model = self.model_for(request.tier).to_string();
        let messages = Self::build_messages(&request)?;

        tracing::debug!(
            target: "fgi::openai",
            model = %model,
            messages = messages.len(),
            "dispatching chat completion"
        );

        let body = ChatCompletionRequest {
            model,
            messages,
            temperature: request.temperature,
            max_tokens: self.max_tokens,
        };

        self.send_request(&body).await
    }
}

fn role_name(role: ChatRole) -> &'static str {
    match role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ApiMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String, GenerationError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            GenerationError::ExecutionFailed("OpenAI API returned no content in the response".into())
        })
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> GenerationError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    GenerationError::ProcessError {
        status_code: Some(status.as_u16()),
        message,
        is_retryable,
        retry_after,
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    // Retry-After HTTP-date parsing is omitted for simplicity
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_messages_prepends_instruction_as_system() {
        let request = GenerationRequest::new(
            "You are a moderator.",
            vec![ChatMessage::user("history"), ChatMessage::assistant("reply")],
            ModelTier::Capable,
        );

        let messages = OpenAIApiBackend::build_messages(&request).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
    }

    #[test]
    fn test_build_messages_rejects_empty_payload() {
        let request = GenerationRequest::new("   ", vec![], ModelTier::Fast);
        assert!(OpenAIApiBackend::build_messages(&request).is_err());
    }

    #[test]
    fn test_model_selection_per_tier() {
        let backend = OpenAIApiBackend::new("key")
            .with_fast_model("fast-model")
            .with_capable_model("capable-model");

        assert_eq!(backend.model_for(ModelTier::Fast), "fast-model");
        assert_eq!(backend.model_for(ModelTier::Capable), "capable-model");
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatCompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![ApiMessage {
                role: "system",
                content: "inst".to_string(),
            }],
            temperature: 0.7,
            max_tokens: None,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        let temperature = json["temperature"].as_f64().unwrap();
        assert!((temperature - 0.7).abs() < 1e-6);
        assert_eq!(json["messages"][0]["role"], "system");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_map_http_error_rate_limit_is_retryable() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"slow down"}}"#.to_string(),
            Some(Duration::from_secs(3)),
        );

        match err {
            GenerationError::ProcessError {
                status_code,
                message,
                is_retryable,
                retry_after,
            } => {
                assert_eq!(status_code, Some(429));
                assert_eq!(message, "slow down");
                assert!(is_retryable);
                assert_eq!(retry_after, Some(Duration::from_secs(3)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_map_http_error_bad_request_is_not_retryable() {
        let err = map_http_error(StatusCode::BAD_REQUEST, "nope".to_string(), None);
        assert!(!err.is_retryable());
    }
}
