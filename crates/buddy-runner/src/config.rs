//! Configuration types for the runner.
//!
//! Deployment settings come from environment variables: which inference
//! backend to call, where the scenario and decision loop YAML live, and how
//! to reach NATS. Tuning of the decision loop itself (tick interval, radii,
//! ranges) lives in the YAML file read by [`buddy_core::BuddyConfig`].

use crate::error::RunnerError;

/// Complete runner configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Inference backend configuration.
    pub backend: LlmBackendConfig,
    /// Path to the decision loop YAML. Defaults apply when unset.
    pub buddy_config: Option<String>,
    /// Path to the scenario YAML.
    pub scenario_path: String,
    /// Directory holding `decision.j2`. The built-in template is used when unset.
    pub templates_dir: Option<String>,
    /// NATS server URL. Chat intake and decision echo are off when unset.
    pub nats_url: Option<String>,
    /// Stop after this many ticks; 0 runs until Ctrl-C.
    pub max_ticks: u64,
}

/// Configuration for the inference backend.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// Which API shape to speak.
    pub backend_type: BackendType,
    /// Endpoint URL. For Ollama the full `/api/generate` URL; for
    /// OpenAI-compatible services the base URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// Bearer token, when the service needs one.
    pub api_key: Option<String>,
    /// Model identifier (e.g. `llama3.2:1b`).
    pub model: String,
}

/// Supported inference backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Ollama `/api/generate` with streamed newline-delimited JSON.
    Ollama,
    /// `OpenAI`-compatible chat completions.
    OpenAi,
}

impl BackendType {
    /// Parse a backend name as written in `INFERENCE_BACKEND`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Config`] for an unknown name.
    pub fn parse(name: &str) -> Result<Self, RunnerError> {
        match name.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "openai-compatible" | "deepseek" => Ok(Self::OpenAi),
            other => Err(RunnerError::Config(format!(
                "unknown inference backend: {other}"
            ))),
        }
    }

    /// Endpoint used when `INFERENCE_URL` is unset.
    pub const fn default_url(self) -> &'static str {
        match self {
            Self::Ollama => "http://localhost:11434/api/generate",
            Self::OpenAi => "https://api.openai.com/v1",
        }
    }
}

impl RunnerConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `SCENARIO_PATH` -- scenario YAML describing the agents and their world
    /// - `INFERENCE_MODEL` -- model name passed to the backend
    ///
    /// Optional variables:
    /// - `INFERENCE_BACKEND` -- `ollama` (default) or `openai`
    /// - `INFERENCE_URL` -- endpoint (default depends on the backend)
    /// - `INFERENCE_API_KEY` -- bearer token
    /// - `BUDDY_CONFIG` -- decision loop YAML
    /// - `TEMPLATES_DIR` -- directory with a `decision.j2` override
    /// - `NATS_URL` -- enables chat intake and decision echo
    /// - `MAX_TICKS` -- stop after N ticks (default 0, unbounded)
    pub fn from_env() -> Result<Self, RunnerError> {
        let backend_type = BackendType::parse(
            &std::env::var("INFERENCE_BACKEND").unwrap_or_else(|_| "ollama".to_owned()),
        )?;
        let api_url = std::env::var("INFERENCE_URL")
            .unwrap_or_else(|_| backend_type.default_url().to_owned());
        let model = env_var("INFERENCE_MODEL")?;

        let max_ticks: u64 = std::env::var("MAX_TICKS")
            .unwrap_or_else(|_| "0".to_owned())
            .parse()
            .map_err(|e| RunnerError::Config(format!("invalid MAX_TICKS: {e}")))?;

        Ok(Self {
            backend: LlmBackendConfig {
                backend_type,
                api_url,
                api_key: optional_var("INFERENCE_API_KEY"),
                model,
            },
            buddy_config: optional_var("BUDDY_CONFIG"),
            scenario_path: env_var("SCENARIO_PATH")?,
            templates_dir: optional_var("TEMPLATES_DIR"),
            nats_url: optional_var("NATS_URL"),
            max_ticks,
        })
    }
}

/// Read a required environment variable.
fn env_var(name: &str) -> Result<String, RunnerError> {
    std::env::var(name)
        .map_err(|e| RunnerError::Config(format!("missing required env var {name}: {e}")))
}

/// Read an optional environment variable; empty counts as unset.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_type_parsing() {
        assert_eq!(BackendType::parse("ollama").ok(), Some(BackendType::Ollama));
        assert_eq!(BackendType::parse("OpenAI").ok(), Some(BackendType::OpenAi));
        assert_eq!(BackendType::parse("deepseek").ok(), Some(BackendType::OpenAi));
        assert!(BackendType::parse("carrier-pigeon").is_err());
    }

    #[test]
    fn default_urls_follow_backend() {
        assert!(BackendType::Ollama.default_url().ends_with("/api/generate"));
        assert!(BackendType::OpenAi.default_url().ends_with("/v1"));
    }
}
