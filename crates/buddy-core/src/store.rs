//! Per-agent history and mailbox.
//!
//! Three tables keyed by [`AgentId`], each behind its own mutex:
//!
//! - **commands**: the last N commands (compact JSON for model decisions,
//!   control syntax for manual commands)
//! - **reasoning**: the last N stated reasons
//! - **mailbox**: chat messages addressed to the agent by name, unbounded
//!   until drained
//!
//! Critical sections are limited to append-and-trim or drain-and-copy. A
//! poisoned lock is recovered rather than propagated since the tables stay
//! structurally valid after any panic.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use buddy_types::AgentId;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Entries kept per history track unless configured otherwise.
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// A chat message waiting in an agent's mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxEntry {
    /// Name of the player who spoke.
    pub sender: String,
    /// Message text as written.
    pub text: String,
}

impl core::fmt::Display for MailboxEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "From {}: {}", self.sender, self.text)
    }
}

/// A chat line observed in the game, before routing to mailboxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Name of the speaker.
    pub sender: String,
    /// Message text.
    pub text: String,
    /// Set when the speaker is itself a bot; such lines are never routed.
    #[serde(default)]
    pub from_bot: bool,
}

/// One aligned (command, reasoning) pair from the history tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPair {
    /// The recorded command.
    pub command: String,
    /// The reasoning at the same position.
    pub reasoning: String,
}

/// Process-wide per-agent memory shared by the encoder, cycles, and chat intake.
#[derive(Debug)]
pub struct AgentMemoryStore {
    capacity: usize,
    commands: Mutex<HashMap<AgentId, VecDeque<String>>>,
    reasoning: Mutex<HashMap<AgentId, VecDeque<String>>>,
    mailbox: Mutex<HashMap<AgentId, VecDeque<MailboxEntry>>>,
}

impl Default for AgentMemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl AgentMemoryStore {
    /// Create a store keeping `capacity` entries per history track.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            commands: Mutex::new(HashMap::new()),
            reasoning: Mutex::new(HashMap::new()),
            mailbox: Mutex::new(HashMap::new()),
        }
    }

    /// History capacity per track.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Append a command to the agent's command track. Empty strings are ignored.
    pub fn record_command(&self, agent: AgentId, command: &str) {
        if command.is_empty() {
            return;
        }
        push_bounded(&self.commands, agent, command.to_owned(), self.capacity);
    }

    /// Append a reason to the agent's reasoning track. Empty strings are ignored.
    pub fn record_reasoning(&self, agent: AgentId, reasoning: &str) {
        if reasoning.is_empty() {
            return;
        }
        push_bounded(&self.reasoning, agent, reasoning.to_owned(), self.capacity);
    }

    /// Copy of the command track, oldest first.
    pub fn commands(&self, agent: AgentId) -> Vec<String> {
        copy_track(&self.commands, agent)
    }

    /// Copy of the reasoning track, oldest first.
    pub fn reasoning(&self, agent: AgentId) -> Vec<String> {
        copy_track(&self.reasoning, agent)
    }

    /// Commands and reasons aligned by position, oldest first.
    ///
    /// Empty unless both tracks hold at least one entry. When the tracks
    /// differ in length the surplus of the longer one is not paired.
    pub fn history_pairs(&self, agent: AgentId) -> Vec<HistoryPair> {
        let commands = self.commands(agent);
        let reasoning = self.reasoning(agent);
        commands
            .into_iter()
            .zip(reasoning)
            .map(|(command, reasoning)| HistoryPair { command, reasoning })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Mailbox
    // -----------------------------------------------------------------------

    /// Append a message to the agent's mailbox.
    pub fn post_message(&self, agent: AgentId, sender: &str, text: &str) {
        lock(&self.mailbox)
            .entry(agent)
            .or_default()
            .push_back(MailboxEntry {
                sender: sender.to_owned(),
                text: text.to_owned(),
            });
    }

    /// Remove and return every unread message, oldest first.
    ///
    /// Delivery is at-most-once: a second drain without new posts is empty.
    pub fn drain_mailbox(&self, agent: AgentId) -> Vec<MailboxEntry> {
        lock(&self.mailbox)
            .get_mut(&agent)
            .map(|queue| queue.drain(..).collect())
            .unwrap_or_default()
    }

    /// Number of unread messages.
    pub fn pending_messages(&self, agent: AgentId) -> usize {
        lock(&self.mailbox).get(&agent).map_or(0, VecDeque::len)
    }

    /// Route a chat line to every agent whose name it mentions.
    ///
    /// Matching is a case-insensitive substring search for the agent's name
    /// in the message text. Lines spoken by bots, empty lines, and agents
    /// with empty names are skipped. Returns the agents that received it.
    pub fn deliver_chat<'a, I>(&self, message: &ChatMessage, agents: I) -> Vec<AgentId>
    where
        I: IntoIterator<Item = (AgentId, &'a str)>,
    {
        if message.from_bot || message.text.is_empty() {
            return Vec::new();
        }
        let lowered = message.text.to_lowercase();
        let recipients: Vec<AgentId> = agents
            .into_iter()
            .filter(|(_, name)| !name.is_empty() && lowered.contains(&name.to_lowercase()))
            .map(|(agent, _)| agent)
            .collect();

        for &agent in &recipients {
            self.post_message(agent, &message.sender, &message.text);
        }
        if !recipients.is_empty() {
            debug!(
                sender = message.sender,
                recipients = recipients.len(),
                "chat message routed to mailboxes"
            );
        }
        recipients
    }

    /// Drop everything held for an agent.
    pub fn forget(&self, agent: AgentId) {
        lock(&self.commands).remove(&agent);
        lock(&self.reasoning).remove(&agent);
        lock(&self.mailbox).remove(&agent);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn push_bounded(
    table: &Mutex<HashMap<AgentId, VecDeque<String>>>,
    agent: AgentId,
    entry: String,
    capacity: usize,
) {
    let mut guard = lock(table);
    let track = guard.entry(agent).or_default();
    track.push_back(entry);
    while track.len() > capacity {
        track.pop_front();
    }
}

fn copy_track(table: &Mutex<HashMap<AgentId, VecDeque<String>>>, agent: AgentId) -> Vec<String> {
    lock(table)
        .get(&agent)
        .map(|track| track.iter().cloned().collect())
        .unwrap_or_default()
}
