//! Generation backend seam.
//!
//! The simulator treats text generation as an external capability: a role
//! instruction plus an ordered message sequence goes in, generated text (or
//! a failure signal) comes out. This crate defines that contract and ships
//! a reqwest-based OpenAI Chat Completions implementation.

pub mod openai_api;

pub use openai_api::OpenAIApiBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default sampling temperature for generation calls.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Role of one message in the sequence handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message of the generation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Cost/quality model selection policy.
///
/// Participant turns are high-volume and run on the fast tier; moderator
/// and analysis turns run on the capable tier. Tiering is a cost policy,
/// not a correctness requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelTier {
    Fast,
    Capable,
}

/// One generation call: role framing, message sequence and sampling policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Role framing / behavioral directives (the system instruction).
    pub instruction: String,
    /// Ordered conversation context following the instruction.
    pub messages: Vec<ChatMessage>,
    pub tier: ModelTier,
    /// Creativity parameter, observed range 0.7 to 0.8.
    pub temperature: f32,
}

impl GenerationRequest {
    /// Creates a request with the default temperature.
    pub fn new(instruction: impl Into<String>, messages: Vec<ChatMessage>, tier: ModelTier) -> Self {
        Self {
            instruction: instruction.into(),
            messages,
            tier,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Overrides the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Errors surfaced by a generation backend.
///
/// Failures are signals, never fatal conditions: the orchestration layer
/// skips the failed step and continues.
#[derive(Error, Debug, Clone)]
pub enum GenerationError {
    /// The call could not be executed (missing credentials, empty payload,
    /// unusable response).
    #[error("Generation failed: {0}")]
    ExecutionFailed(String),

    /// The backend process/endpoint answered with an error.
    #[error("Backend error{}: {message}", .status_code.map(|c| format!(" (status {c})")).unwrap_or_default())]
    ProcessError {
        status_code: Option<u16>,
        message: String,
        is_retryable: bool,
        retry_after: Option<Duration>,
    },

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl GenerationError {
    /// Whether retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ProcessError { is_retryable, .. } => *is_retryable,
            _ => false,
        }
    }
}

/// The external text-generation capability.
///
/// Implementations must be usable behind `Arc<dyn GenerationBackend>`;
/// the simulator performs strictly sequential blocking calls and supplies
/// its own pacing between them.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generates one contribution for the given instruction and context.
    ///
    /// # Errors
    ///
    /// Returns a `GenerationError` when the call fails or the backend
    /// returns nothing usable. Callers treat this as a per-step signal.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_role_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ChatRole::Assistant).unwrap(),
            "\"assistant\""
        );
        assert_eq!(serde_json::to_string(&ChatRole::System).unwrap(), "\"system\"");
    }

    #[test]
    fn test_request_defaults_and_override() {
        let request = GenerationRequest::new("inst", vec![ChatMessage::user("hi")], ModelTier::Fast);
        assert_eq!(request.temperature, DEFAULT_TEMPERATURE);

        let warmer = request.with_temperature(0.8);
        assert_eq!(warmer.temperature, 0.8);
    }

    #[test]
    fn test_retryable_flag() {
        let err = GenerationError::ProcessError {
            status_code: Some(429),
            message: "rate limited".to_string(),
            is_retryable: true,
            retry_after: Some(Duration::from_secs(2)),
        };
        assert!(err.is_retryable());
        assert!(!GenerationError::ExecutionFailed("x".into()).is_retryable());
    }
}
