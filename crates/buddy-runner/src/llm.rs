//! Inference backends.
//!
//! Enum dispatch over the two supported HTTP APIs, implementing
//! [`InferenceClient`] so the scheduler never learns which one is in use.
//!
//! - Ollama `/api/generate` answers with newline-delimited JSON chunks; the
//!   `response` field of every chunk is concatenated in order
//! - `OpenAI`-compatible chat completions answer with one JSON document whose
//!   `choices[0].message.content` holds the reply

use buddy_core::{InferenceClient, InferenceError};
use serde_json::Value;

use crate::config::{BackendType, LlmBackendConfig};

// ---------------------------------------------------------------------------
// Unified backend enum
// ---------------------------------------------------------------------------

/// An inference backend selected at startup.
pub enum LlmBackend {
    /// Ollama generate API.
    Ollama(OllamaBackend),
    /// `OpenAI`-compatible chat completions API.
    OpenAi(OpenAiBackend),
}

impl InferenceClient for LlmBackend {
    fn name(&self) -> &str {
        match self {
            Self::Ollama(_) => "ollama",
            Self::OpenAi(_) => "openai-compatible",
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, InferenceError> {
        match self {
            Self::Ollama(backend) => backend.complete(prompt).await,
            Self::OpenAi(backend) => backend.complete(prompt).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Ollama
// ---------------------------------------------------------------------------

/// Backend for Ollama's `/api/generate`.
pub struct OllamaBackend {
    client: reqwest::Client,
    api_url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend.
    pub fn new(config: &LlmBackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, InferenceError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
        });

        let response = self
            .client
            .post(&self.api_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Transport(format!("Ollama request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| InferenceError::Transport(format!("Ollama stream read failed: {e}")))?;
        Ok(concat_ollama_chunks(&text))
    }
}

/// Join the `response` fields of an Ollama NDJSON stream.
///
/// Lines that are blank, not JSON, or carry no `response` are skipped.
fn concat_ollama_chunks(stream: &str) -> String {
    stream
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter_map(|chunk| chunk.get("response").and_then(Value::as_str).map(ToOwned::to_owned))
        .collect()
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for OpenAI-compatible chat completions APIs.
///
/// Sends requests to `{api_url}/chat/completions`.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(config: &LlmBackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, InferenceError> {
        let url = format!("{}/chat/completions", self.api_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.7,
            "max_tokens": 512
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| InferenceError::Transport(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| InferenceError::Malformed(format!("OpenAI response parse failed: {e}")))?;

        extract_openai_content(&json)
    }
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &Value) -> Result<String, InferenceError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            InferenceError::Malformed("response missing choices[0].message.content".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create an inference backend from configuration.
pub fn create_backend(config: &LlmBackendConfig) -> LlmBackend {
    match config.backend_type {
        BackendType::Ollama => LlmBackend::Ollama(OllamaBackend::new(config)),
        BackendType::OpenAi => LlmBackend::OpenAi(OpenAiBackend::new(config)),
    }
}
