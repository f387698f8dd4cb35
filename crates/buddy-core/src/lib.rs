//! The bot buddy decision loop.
//!
//! Every scheduling tick, each idle managed agent gets one decision cycle:
//!
//! ```text
//! snapshot --> StateEncoder --> PromptEngine --> InferenceClient (async)
//!          --> codec::decode --> Dispatcher --> ActionSurface
//! ```
//!
//! The [`AgentMemoryStore`] is the only shared mutable state. It is read by
//! the encoder and written by the cycle, the dispatcher, and the chat
//! observer.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration with defaults for every knob
//! - [`store`] -- Per-agent command/reasoning history and mailbox
//! - [`capability`] -- Traits over the game: world queries and the action surface
//! - [`encoder`] -- Builds the observation text from a snapshot
//! - [`prompt`] -- Wraps the observation in the instruction template
//! - [`inference`] -- The inference client seam
//! - [`codec`] -- Extracts and validates the command object in a reply
//! - [`text_command`] -- Parser for the manual control syntax
//! - [`dispatch`] -- Executes commands through fallback chains
//! - [`scheduler`] -- Per-agent busy tracking and decision cycle tasks
//! - [`sandbox`] -- In-memory world driven by a YAML scenario

pub mod capability;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod encoder;
pub mod inference;
pub mod prompt;
pub mod sandbox;
pub mod scheduler;
pub mod store;
pub mod text_command;

pub use capability::{ActionSurface, Capability, GameWorld, WorldQuery};
pub use codec::{CodecError, Decision};
pub use config::{BuddyConfig, ConfigError};
pub use dispatch::Dispatcher;
pub use encoder::{Observation, StateEncoder};
pub use inference::{InferenceClient, InferenceError};
pub use prompt::{PromptEngine, PromptError};
pub use sandbox::SandboxWorld;
pub use scheduler::{AgentScheduler, CycleObserver, TickReport};
pub use store::{AgentMemoryStore, ChatMessage, MailboxEntry};
pub use text_command::{ControlInput, TextCommandError};
