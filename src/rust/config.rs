use std::env;
use std::time::Duration;

use serde::Serialize;

use crate::error::{ClassifierError, Result};

pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_TOP_K: u32 = 10;
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Sampling options for the local Ollama backend, fixed for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocalSampling {
    pub temperature: f32,
    pub top_k: u32,
}

impl Default for LocalSampling {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Sampling options for the hosted OpenAI backend, fixed for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HostedSampling {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for HostedSampling {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Checked by the pipeline builder before any request is sent.
pub trait SamplingConfig: std::fmt::Debug + Default {
    fn validate(&self) -> Result<()>;
}

fn check_temperature(temperature: f32) -> Result<()> {
    if !temperature.is_finite() || temperature < 0.0 {
        return Err(ClassifierError::ValidationError(format!(
            "Temperature must be a non-negative number, got {}",
            temperature
        )));
    }
    Ok(())
}

impl SamplingConfig for LocalSampling {
    fn validate(&self) -> Result<()> {
        check_temperature(self.temperature)?;
        if self.top_k == 0 {
            return Err(ClassifierError::ValidationError("top_k must be at least 1".into()));
        }
        Ok(())
    }
}

impl SamplingConfig for HostedSampling {
    fn validate(&self) -> Result<()> {
        check_temperature(self.temperature)?;
        if self.max_tokens == 0 {
            return Err(ClassifierError::ValidationError("max_tokens must be at least 1".into()));
        }
        Ok(())
    }
}

/// Connection settings for a local Ollama server.
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
    pub timeout: Option<Duration>,
}

impl OllamaConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            host: Self::default_host(),
            model: model.into(),
            timeout: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the Ollama host, honouring `OLLAMA_HOST`
    pub fn default_host() -> String {
        resolve_host(env::var("OLLAMA_HOST").ok())
    }
}

/// Connection settings for the OpenAI chat completions API.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Option<Duration>,
}

impl OpenAiConfig {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            api_key: api_key.into(),
            model: model.into(),
            timeout: None,
        }
    }

    /// Builds a config with the key taken from `OPENAI_API_KEY`.
    ///
    /// # Errors
    /// `BuildError` if the variable is unset or empty.
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        match env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(model, key.trim())),
            _ => Err(ClassifierError::BuildError(
                "OpenAI API key is not set. Please set the OPENAI_API_KEY environment variable.".into(),
            )),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Normalizes an `OLLAMA_HOST`-style value into a base URL.
///
/// Accepts a bare `host:port` the way the Ollama CLI does.
pub fn resolve_host(value: Option<String>) -> String {
    let host = match value {
        Some(v) if !v.trim().is_empty() => v.trim().trim_end_matches('/').to_string(),
        _ => return DEFAULT_OLLAMA_HOST.to_string(),
    };
    if host.starts_with("http://") || host.starts_with("https://") {
        host
    } else {
        format!("http://{}", host)
    }
}
