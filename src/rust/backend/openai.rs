use log::{debug, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{build_client, join_url, BackendError, ChatMessage, InferenceBackend};
use crate::config::{HostedSampling, OpenAiConfig};

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat backend for the OpenAI chat completions API.
///
/// A failed call is logged and reported as `Ok(None)`; the caller skips the
/// record and moves on. Only client construction can fail with `Err`.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    pub fn new(config: OpenAiConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_client(config.timeout)?,
            endpoint: join_url(&config.base_url, "chat/completions"),
            api_key: config.api_key,
            model: config.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(
        &self,
        messages: &[ChatMessage],
        sampling: &HostedSampling,
    ) -> Result<String, BackendError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        };

        debug!("POST {} (model {}, {} messages)", self.endpoint, self.model, messages.len());
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatCompletionResponse = response
            .json()
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| BackendError::MalformedResponse("response has no message content".into()))
    }
}

impl InferenceBackend for OpenAiBackend {
    type Sampling = HostedSampling;

    fn name(&self) -> &str {
        "openai"
    }

    fn classify(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        sampling: &HostedSampling,
    ) -> Result<Option<String>, BackendError> {
        let messages = ChatMessage::conversation(prompt, system_prompt);
        match self.request(&messages, sampling) {
            Ok(content) => Ok(Some(content.trim().to_string())),
            Err(e) => {
                warn!("Error during OpenAI API call: {}", e);
                Ok(None)
            }
        }
    }
}
