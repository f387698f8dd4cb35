//! Command dispatch through fallback chains.
//!
//! The [`Dispatcher`] turns one validated [`Command`] into calls on the
//! [`GameWorld`]. Simple commands map to a single named capability. Attack,
//! spell casting and quest interaction try several tiers in order and stop at
//! the first that the game accepts:
//!
//! - [`combat`]: positioning first, then damage tiers, then a manual
//!   selection/facing/movement fallback
//! - [`quest`]: quest menu turn-ins and accepts, then gossip navigation
//!
//! Dispatch never panics and never propagates errors. Unresolvable ids,
//! refused actions and out-of-range conditions all end as `false`, and
//! nothing is retried within the same call.

mod combat;
mod quest;

use std::sync::Arc;

use buddy_types::{AgentId, Command, QuestId};
use tracing::{debug, info, warn};

use crate::capability::{Capability, GameWorld};
use crate::config::{CombatConfig, QuestConfig};
use crate::store::AgentMemoryStore;
use crate::text_command::{self, ControlInput};

/// Executes commands against a game world.
#[derive(Debug)]
pub struct Dispatcher<W> {
    world: Arc<W>,
    combat: CombatConfig,
    quest: QuestConfig,
}

impl<W> Clone for Dispatcher<W> {
    fn clone(&self) -> Self {
        Self {
            world: Arc::clone(&self.world),
            combat: self.combat.clone(),
            quest: self.quest.clone(),
        }
    }
}

impl<W: GameWorld> Dispatcher<W> {
    /// Create a dispatcher over a shared world.
    pub const fn new(world: Arc<W>, combat: CombatConfig, quest: QuestConfig) -> Self {
        Self {
            world,
            combat,
            quest,
        }
    }

    /// The world commands are executed against.
    pub const fn world(&self) -> &Arc<W> {
        &self.world
    }

    /// Execute one command. Returns whether it was applied.
    pub fn execute(&self, agent: AgentId, command: &Command) -> bool {
        let applied = match *command {
            Command::MoveTo { x, y, z } => self.act(agent, Capability::Go, &format!("{x};{y};{z}")),
            Command::Attack { target } => self.attack(agent, target),
            Command::Interact { target } => self.interact(agent, target),
            Command::CastSpell { spell, target } => self.cast_spell(agent, spell, target),
            Command::Loot => self.act(agent, Capability::Loot, ""),
            Command::AcceptQuest { quest } => self.accept_quest(agent, quest),
            Command::TurnInQuest { quest } => self.turn_in_quest(agent, quest),
            Command::Follow => self.act(agent, Capability::Follow, ""),
            Command::Stop => self.act(agent, Capability::Stay, ""),
        };

        if applied {
            info!(agent_id = %agent, command = %command, "command applied");
        } else {
            info!(agent_id = %agent, command = %command, "command failed");
        }
        applied
    }

    /// Say a line in chat. Empty text is not sent.
    pub fn say(&self, agent: AgentId, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.act(agent, Capability::Say, text)
    }

    /// Parse and execute a manual control string.
    ///
    /// On success the command's control-syntax form is appended to the
    /// agent's command history; failed or unparsable input leaves the
    /// history untouched.
    pub fn execute_text(&self, agent: AgentId, input: &str, store: &AgentMemoryStore) -> bool {
        let parsed = match text_command::parse(input) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(agent_id = %agent, input, error = %e, "rejected control command");
                return false;
            }
        };

        let applied = match &parsed {
            ControlInput::Command(command) => self.execute(agent, command),
            ControlInput::Say(text) => self.say(agent, text),
        };
        if applied {
            store.record_command(agent, &parsed.to_string());
        }
        applied
    }

    /// Accept a quest by id. The quest must exist.
    fn accept_quest(&self, agent: AgentId, quest: QuestId) -> bool {
        if !self.world.quest_exists(quest) {
            debug!(agent_id = %agent, quest = %quest, "unknown quest");
            return false;
        }
        self.act(agent, Capability::AcceptQuest, &quest.to_string())
    }

    /// Invoke one named capability.
    fn act(&self, agent: AgentId, capability: Capability, payload: &str) -> bool {
        self.invoke(agent, capability.as_str(), payload)
    }

    /// Invoke a raw action name (capabilities and literal spell names).
    fn invoke(&self, agent: AgentId, action: &str, payload: &str) -> bool {
        let accepted = self.world.do_action(agent, action, payload);
        debug!(agent_id = %agent, action, payload, accepted, "action attempted");
        accepted
    }
}
