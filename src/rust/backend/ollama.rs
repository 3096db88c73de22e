use log::debug;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{build_client, join_url, BackendError, ChatMessage, InferenceBackend};
use crate::config::{LocalSampling, OllamaConfig};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: &'a LocalSampling,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Chat backend for a local Ollama server (`POST /api/chat`).
///
/// Every failure is returned as `Err`: a local model that cannot answer is an
/// infrastructure problem and ends the run.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(config: OllamaConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_client(config.timeout)?,
            endpoint: join_url(&config.host, "api/chat"),
            model: config.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl InferenceBackend for OllamaBackend {
    type Sampling = LocalSampling;

    fn name(&self) -> &str {
        "ollama"
    }

    fn classify(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        sampling: &LocalSampling,
    ) -> Result<Option<String>, BackendError> {
        let messages = ChatMessage::conversation(prompt, system_prompt);
        let request = ChatRequest {
            model: &self.model,
            messages: &messages,
            stream: false,
            options: sampling,
        };

        debug!("POST {} (model {}, {} messages)", self.endpoint, self.model, messages.len());
        let response = self.client.post(&self.endpoint).json(&request).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response
            .json()
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
        Ok(Some(body.message.content.trim().to_string()))
    }
}
