//! LLM backends that turn a rendered prompt into a predicted label.
//!
//! Both backends speak a chat protocol: an optional system message followed by
//! one user message. They differ in sampling options and in what a failed call
//! means for the run:
//!
//! - [`OllamaBackend`] treats every failure as fatal and returns `Err`.
//! - [`OpenAiBackend`] logs the failure and returns `Ok(None)` so the caller
//!   can drop the record and carry on.

mod ollama;
mod openai;

use serde::{Deserialize, Serialize};

use crate::config::SamplingConfig;

pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Backend returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Client setup failed: {0}")]
    ClientError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Builds the message list sent for one record: the system prompt first
    /// when it is non-empty, then the rendered prompt as the user turn.
    pub fn conversation(prompt: &str, system_prompt: Option<&str>) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt.filter(|s| !s.is_empty()) {
            messages.push(ChatMessage::new(Role::System, system));
        }
        messages.push(ChatMessage::new(Role::User, prompt));
        messages
    }
}

/// A chat model that classifies one rendered prompt per call.
///
/// `Ok(Some(label))` is a trimmed prediction, `Ok(None)` a failure the backend
/// has already logged and deems recoverable, and `Err` a failure that must
/// end the run.
pub trait InferenceBackend {
    type Sampling: SamplingConfig;

    /// Short name used in log lines
    fn name(&self) -> &str;

    fn classify(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        sampling: &Self::Sampling,
    ) -> Result<Option<String>, BackendError>;
}

impl<B: InferenceBackend + ?Sized> InferenceBackend for &B {
    type Sampling = B::Sampling;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn classify(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        sampling: &Self::Sampling,
    ) -> Result<Option<String>, BackendError> {
        (**self).classify(prompt, system_prompt, sampling)
    }
}

fn build_client(timeout: Option<std::time::Duration>) -> Result<reqwest::blocking::Client, BackendError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BackendError::ClientError(e.to_string()))
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
