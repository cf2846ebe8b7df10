//! Test doubles shared by the application-layer tests.

use async_trait::async_trait;
use fgi_interaction::{GenerationBackend, GenerationError, GenerationRequest};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A backend that replays a fixed script of successes and failures.
///
/// Commands are processed strictly sequentially, so a plain queue matches
/// the call order deterministically. Every request is recorded for
/// context-window assertions.
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedBackend {
    pub fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A script of nothing but successful generations.
    pub fn ok(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    /// All requests seen so far, in call order.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(request);
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(GenerationError::ExecutionFailed(message)),
            None => Err(GenerationError::ExecutionFailed(
                "script exhausted".to_string(),
            )),
        }
    }
}
