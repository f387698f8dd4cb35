//! Decision records echoed to observers.
//!
//! Every decision cycle that reaches the inference service produces one
//! [`DecisionRecord`]. Records are informational only: nothing in the loop
//! reads them back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, CycleId};

/// How a decision cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// A command was decoded and the dispatcher reported success.
    Executed,
    /// A command was decoded but every fallback tier failed.
    CommandFailed,
    /// The inference service answered with nothing usable (empty text).
    EmptyReply,
    /// The inference call failed or timed out.
    TransportError,
    /// The reply held no valid command object.
    ProtocolError,
    /// The agent left management before dispatch; the result was discarded.
    AgentGone,
}

impl DecisionOutcome {
    /// Snake-case label, identical to the serialized form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Executed => "executed",
            Self::CommandFailed => "command_failed",
            Self::EmptyReply => "empty_reply",
            Self::TransportError => "transport_error",
            Self::ProtocolError => "protocol_error",
            Self::AgentGone => "agent_gone",
        }
    }

    /// Whether a command reached the dispatcher.
    pub const fn dispatched(self) -> bool {
        matches!(self, Self::Executed | Self::CommandFailed)
    }
}

/// A complete record of one decision cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Cycle identifier.
    pub cycle_id: CycleId,
    /// Agent the cycle ran for.
    pub agent_id: AgentId,
    /// Agent name at observation time.
    pub agent_name: String,
    /// The observation sent to the inference service (possibly truncated).
    pub observation: String,
    /// The raw reply text (possibly truncated).
    pub raw_reply: String,
    /// The decoded `command` object in wire form.
    pub command: Option<serde_json::Value>,
    /// Stated reasoning, when present.
    pub reasoning: Option<String>,
    /// Chat line the agent said, when present.
    pub say: Option<String>,
    /// How the cycle ended.
    pub outcome: DecisionOutcome,
    /// Wall-clock time from observation to outcome.
    pub latency_ms: u64,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_snake_case() {
        for outcome in [
            DecisionOutcome::Executed,
            DecisionOutcome::CommandFailed,
            DecisionOutcome::EmptyReply,
            DecisionOutcome::TransportError,
            DecisionOutcome::ProtocolError,
            DecisionOutcome::AgentGone,
        ] {
            let json = serde_json::to_string(&outcome).unwrap_or_default();
            assert_eq!(json, format!("\"{}\"", outcome.as_str()));
        }
    }

    #[test]
    fn only_executed_and_failed_were_dispatched() {
        assert!(DecisionOutcome::Executed.dispatched());
        assert!(DecisionOutcome::CommandFailed.dispatched());
        assert!(!DecisionOutcome::ProtocolError.dispatched());
        assert!(!DecisionOutcome::AgentGone.dispatched());
    }
}
