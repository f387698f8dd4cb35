//! Shared type definitions for the bot buddy decision loop.
//!
//! This crate holds the vocabulary that flows between the game-facing
//! capability layer, the decision loop in `buddy-core`, and the runner.
//!
//! # Modules
//!
//! - [`ids`] -- Strongly-typed identifiers for agents, entities, spells, quests
//! - [`command`] -- The closed set of commands an agent can be told to execute
//! - [`snapshot`] -- Read-only view of an agent's situation used to build observations
//! - [`record`] -- Decision records echoed to observers after each cycle

pub mod command;
pub mod ids;
pub mod record;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use command::{Command, CommandType};
pub use ids::{AgentId, CycleId, EntityGuid, ItemId, QuestId, SpellId};
pub use record::{DecisionOutcome, DecisionRecord};
pub use snapshot::{
    AgentSnapshot, CombatProfile, CombatStyle, CreatureView, Disposition, Faction, GroupMember,
    NpcService, ObjectView, ObjectiveKind, PlayerTraits, PlayerView, Pool, Position, PowerType,
    QuestGiverMark, QuestLogEntry, QuestObjective, QuestStatus, SpellCost, SpellEffect, SpellView,
    TargetKind, TurnInTarget, UnitView, WaypointView,
};
