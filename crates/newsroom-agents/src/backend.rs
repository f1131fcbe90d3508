//! Generation backend capability.
//!
//! The whole pipeline talks to its language model through one trait: an
//! ordered list of role-tagged messages in, generated text out. Any backend
//! that can answer a chat-completion request fits behind it; the reference
//! implementation speaks the OpenAI-compatible `/chat/completions` protocol.
//!
//! No retries happen at this layer or above: every invocation is attempted
//! at most once, and latency is unbounded by design.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Endpoint;

/// Role tag on a backend message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

/// One role-tagged message in a backend invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    #[serde(rename = "content")]
    pub text: String,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }
}

/// Error from a generation backend invocation.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("backend response had no choices")]
    EmptyResponse,
}

/// Capability interface for text generation.
///
/// Implementations must be safe to invoke concurrently; independent
/// invocations carry no ordering guarantees.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, BackendError>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// OpenAI-compatible chat-completions backend.
pub struct OpenAiBackend {
    client: reqwest::Client,
    endpoint: Endpoint,
    temperature: f64,
}

impl OpenAiBackend {
    pub fn new(endpoint: Endpoint, temperature: f64) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            temperature,
        }
    }
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.endpoint.url.trim_end_matches('/'));
        let request = CompletionRequest {
            model: &self.endpoint.model,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.endpoint.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(BackendError::EmptyResponse)
    }
}
