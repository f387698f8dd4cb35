//! Error types for the runner.
//!
//! Uses `thiserror` for typed errors raised while starting up: environment
//! configuration, loading files, and NATS connectivity. Once the tick loop is
//! running nothing propagates; failures are logged where they happen.

use buddy_core::config::ConfigError;
use buddy_core::prompt::PromptError;
use buddy_core::sandbox::ScenarioError;

/// Errors that can occur while starting or running the runner.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Failed to connect to or communicate with the NATS server.
    #[error("NATS error: {0}")]
    Nats(String),

    /// An environment variable is missing or invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The decision loop configuration file could not be loaded.
    #[error("decision loop config error: {0}")]
    BuddyConfig(#[from] ConfigError),

    /// The scenario file could not be loaded.
    #[error("scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    /// The prompt template could not be loaded or compiled.
    #[error("prompt template error: {0}")]
    Prompt(#[from] PromptError),

    /// A message payload could not be decoded.
    #[error("response parse error: {0}")]
    Parse(String),
}
