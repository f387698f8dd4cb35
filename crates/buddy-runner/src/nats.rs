//! NATS pub/sub integration for chat intake and decision echo.
//!
//! The game bridge publishes every chat line it sees on `botbuddy.chat` as
//! JSON (`{"sender": .., "text": .., "from_bot": ..}`). The runner routes
//! each line to the mailboxes of the agents it mentions, and publishes every
//! finished decision cycle on `botbuddy.decisions.{agent_id}`.
//!
//! Operators can also steer an agent by hand: a plain-text payload such as
//! `attack 2241` or `move to -9347 256 65` on `botbuddy.control.{agent_id}`
//! is parsed and executed through the same dispatcher the model uses.

use std::sync::Arc;

use buddy_core::{AgentMemoryStore, ChatMessage, CycleObserver, Dispatcher, GameWorld, WorldQuery};
use buddy_types::{AgentId, DecisionRecord};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::RunnerError;

/// Subject chat lines arrive on.
pub const CHAT_SUBJECT: &str = "botbuddy.chat";

/// Wildcard subject for manual control commands, one token per agent id.
pub const CONTROL_SUBJECT: &str = "botbuddy.control.*";

/// NATS client wrapper for the runner.
#[derive(Clone)]
pub struct NatsClient {
    client: async_nats::Client,
}

impl NatsClient {
    /// Connect to a NATS server.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Nats`] if the connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self, RunnerError> {
        info!(url = url, "connecting to NATS server");
        let client = async_nats::connect(url)
            .await
            .map_err(|e| RunnerError::Nats(format!("failed to connect to {url}: {e}")))?;
        info!("NATS connection established");
        Ok(Self { client })
    }

    /// Subscribe to the chat subject.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Nats`] if the subscription fails.
    pub async fn subscribe_chat(&self) -> Result<async_nats::Subscriber, RunnerError> {
        debug!(subject = CHAT_SUBJECT, "subscribing to chat");
        let subscriber = self
            .client
            .subscribe(CHAT_SUBJECT.to_owned())
            .await
            .map_err(|e| {
                RunnerError::Nats(format!("failed to subscribe to {CHAT_SUBJECT}: {e}"))
            })?;
        info!(subject = CHAT_SUBJECT, "subscribed to chat");
        Ok(subscriber)
    }

    /// Subscribe to manual control commands for every agent.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Nats`] if the subscription fails.
    pub async fn subscribe_control(&self) -> Result<async_nats::Subscriber, RunnerError> {
        let subscriber = self
            .client
            .subscribe(CONTROL_SUBJECT.to_owned())
            .await
            .map_err(|e| {
                RunnerError::Nats(format!("failed to subscribe to {CONTROL_SUBJECT}: {e}"))
            })?;
        info!(subject = CONTROL_SUBJECT, "subscribed to control commands");
        Ok(subscriber)
    }

    /// Extract the agent id from a `botbuddy.control.{agent_id}` subject.
    pub fn extract_agent_from_subject(subject: &str) -> Option<AgentId> {
        let parts: Vec<&str> = subject.split('.').collect();
        if parts.len() == 3 {
            parts.get(2).and_then(|s| s.parse().ok())
        } else {
            None
        }
    }

    /// Publish a decision record (fire-and-forget).
    ///
    /// Serialization or publish failures are logged but do not propagate.
    /// Must be called from within a tokio runtime.
    pub fn publish_decision(&self, record: &DecisionRecord) {
        let subject = decision_subject(record.agent_id);
        match serde_json::to_vec(record) {
            Ok(payload) => {
                let client = self.client.clone();
                tokio::spawn(async move {
                    if let Err(e) = client.publish(subject.clone(), payload.into()).await {
                        warn!(
                            subject = subject,
                            error = %e,
                            "failed to publish decision record"
                        );
                    }
                });
            }
            Err(e) => {
                warn!(
                    subject = subject,
                    error = %e,
                    "failed to serialize decision record"
                );
            }
        }
    }

    /// Deserialize a NATS message payload into a [`ChatMessage`].
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Parse`] if deserialization fails.
    pub fn deserialize_chat(data: &[u8]) -> Result<ChatMessage, RunnerError> {
        serde_json::from_slice(data)
            .map_err(|e| RunnerError::Parse(format!("failed to deserialize chat message: {e}")))
    }
}

impl CycleObserver for NatsClient {
    fn on_decision(&self, record: &DecisionRecord) {
        self.publish_decision(record);
    }
}

impl std::fmt::Debug for NatsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsClient")
            .field("connected", &true)
            .finish()
    }
}

/// Subject a decision record for `agent` is published on.
pub fn decision_subject(agent: AgentId) -> String {
    format!("botbuddy.decisions.{agent}")
}

/// Route incoming chat lines into agent mailboxes until the subscription ends.
pub fn spawn_chat_intake<W: WorldQuery + 'static>(
    mut subscriber: async_nats::Subscriber,
    world: Arc<W>,
    store: Arc<AgentMemoryStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = subscriber.next().await {
            match NatsClient::deserialize_chat(&message.payload) {
                Ok(chat) => {
                    let recipients = route_chat(world.as_ref(), &store, &chat);
                    debug!(
                        sender = chat.sender,
                        recipients = recipients.len(),
                        "chat line received"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "failed to deserialize chat line, skipping");
                }
            }
        }
        info!("chat subscription ended");
    })
}

/// Execute manual control commands until the subscription ends.
pub fn spawn_control_intake<W: GameWorld + 'static>(
    mut subscriber: async_nats::Subscriber,
    dispatcher: Dispatcher<W>,
    store: Arc<AgentMemoryStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = subscriber.next().await {
            let subject = message.subject.to_string();
            match apply_control(&dispatcher, &store, &subject, &message.payload) {
                Ok(applied) => {
                    debug!(subject = subject, applied = applied, "control command handled");
                }
                Err(e) => {
                    warn!(subject = subject, error = %e, "rejected control message");
                }
            }
        }
        info!("control subscription ended");
    })
}

/// Run one control payload against the agent named by its subject.
fn apply_control<W: GameWorld>(
    dispatcher: &Dispatcher<W>,
    store: &AgentMemoryStore,
    subject: &str,
    payload: &[u8],
) -> Result<bool, RunnerError> {
    let agent = NatsClient::extract_agent_from_subject(subject)
        .ok_or_else(|| RunnerError::Parse(format!("no agent id in subject {subject}")))?;
    let input = std::str::from_utf8(payload)
        .map_err(|e| RunnerError::Parse(format!("control payload is not UTF-8: {e}")))?;
    Ok(dispatcher.execute_text(agent, input.trim(), store))
}

/// Deliver one chat line to every managed agent it names.
fn route_chat<W: WorldQuery>(
    world: &W,
    store: &AgentMemoryStore,
    chat: &ChatMessage,
) -> Vec<AgentId> {
    let names: Vec<(AgentId, String)> = world
        .managed_agents()
        .into_iter()
        .filter_map(|agent| world.agent_name(agent).map(|name| (agent, name)))
        .collect();
    store.deliver_chat(chat, names.iter().map(|(agent, name)| (*agent, name.as_str())))
}

#[cfg(test)]
mod tests {
    use buddy_core::SandboxWorld;
    use buddy_core::config::{CombatConfig, QuestConfig};
    use buddy_core::sandbox::ScenarioAgent;

    use super::*;

    #[test]
    fn decision_subject_carries_agent_id() {
        assert_eq!(decision_subject(AgentId(42)), "botbuddy.decisions.42");
    }

    #[test]
    fn deserialize_valid_chat() {
        let payload = br#"{"sender":"Alice","text":"Ollamatest come here"}"#;
        let chat = NatsClient::deserialize_chat(payload);
        assert!(chat.is_ok());
        let chat = chat.unwrap_or_else(|_| ChatMessage {
            sender: String::new(),
            text: String::new(),
            from_bot: true,
        });
        assert_eq!(chat.sender, "Alice");
        assert!(!chat.from_bot);
    }

    #[test]
    fn deserialize_invalid_chat() {
        assert!(NatsClient::deserialize_chat(b"not valid json").is_err());
    }

    #[test]
    fn chat_is_routed_by_name() {
        let world = SandboxWorld::with_agents(vec![
            ScenarioAgent::named(AgentId(1), "Ollamatest"),
            ScenarioAgent::named(AgentId(2), "Buddy"),
        ]);
        let store = AgentMemoryStore::default();
        let chat = ChatMessage {
            sender: "Alice".to_owned(),
            text: "OLLAMATEST follow me".to_owned(),
            from_bot: false,
        };

        assert_eq!(route_chat(&world, &store, &chat), vec![AgentId(1)]);
        assert_eq!(store.pending_messages(AgentId(1)), 1);
        assert_eq!(store.pending_messages(AgentId(2)), 0);
    }

    #[test]
    fn bot_chat_is_ignored() {
        let world = SandboxWorld::with_agents(vec![ScenarioAgent::named(AgentId(1), "Ollamatest")]);
        let store = AgentMemoryStore::default();
        let chat = ChatMessage {
            sender: "Otherbot".to_owned(),
            text: "Ollamatest hello".to_owned(),
            from_bot: true,
        };
        assert!(route_chat(&world, &store, &chat).is_empty());
    }

    #[test]
    fn extract_agent_from_control_subject() {
        assert_eq!(
            NatsClient::extract_agent_from_subject("botbuddy.control.42"),
            Some(AgentId(42))
        );
        assert_eq!(NatsClient::extract_agent_from_subject("botbuddy.control"), None);
        assert_eq!(
            NatsClient::extract_agent_from_subject("botbuddy.control.alice"),
            None
        );
    }

    #[test]
    fn control_payload_runs_through_dispatcher() {
        let world = Arc::new(SandboxWorld::with_agents(vec![ScenarioAgent::named(
            AgentId(1),
            "Ollamatest",
        )]));
        let dispatcher = Dispatcher::new(
            Arc::clone(&world),
            CombatConfig::default(),
            QuestConfig::default(),
        );
        let store = AgentMemoryStore::default();

        let applied = apply_control(&dispatcher, &store, "botbuddy.control.1", b"follow\n");
        assert!(matches!(applied, Ok(true)));
        assert_eq!(world.action_names(AgentId(1)), vec!["follow"]);
        assert_eq!(store.commands(AgentId(1)), vec!["follow"]);

        let garbled = apply_control(&dispatcher, &store, "botbuddy.control.1", b"dance wildly");
        assert!(matches!(garbled, Ok(false)));
        assert!(apply_control(&dispatcher, &store, "botbuddy.control.x", b"stop").is_err());
        assert!(apply_control(&dispatcher, &store, "botbuddy.control.1", &[0xff, 0xfe]).is_err());
        assert_eq!(store.commands(AgentId(1)).len(), 1);
    }

    // Integration tests that require a live NATS server are marked #[ignore].
    #[tokio::test]
    #[ignore]
    async fn connect_and_subscribe() {
        let client = NatsClient::connect("nats://localhost:4222").await;
        assert!(client.is_ok());
        if let Ok(client) = client {
            assert!(client.subscribe_chat().await.is_ok());
            assert!(client.subscribe_control().await.is_ok());
        }
    }
}
