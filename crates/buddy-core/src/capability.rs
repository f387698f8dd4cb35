//! The seam between the decision loop and the game.
//!
//! The game is split into two traits:
//!
//! - [`WorldQuery`]: read-only lookups (snapshots, entity resolution, quest
//!   menus, spell metadata)
//! - [`ActionSurface`]: mutations, chiefly the named-capability primitive
//!   [`ActionSurface::do_action`], plus the low-level selection, facing,
//!   gossip and movement-intent calls the dispatcher falls back to
//!
//! Anything implementing both is a [`GameWorld`]. Both traits are
//! synchronous: the game answers from its own state, and only the inference
//! call in a decision cycle ever suspends.

use buddy_types::{
    AgentId, AgentSnapshot, CombatProfile, EntityGuid, ItemId, Position, QuestId, QuestStatus,
    SpellId,
};

// ---------------------------------------------------------------------------
// Named capabilities
// ---------------------------------------------------------------------------

/// Named actions understood by the underlying agent-action system.
///
/// Casting a spell by its literal name is the one action not listed here;
/// the dispatcher passes the spell name straight to
/// [`ActionSurface::do_action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Walk to a coordinate; payload `x;y;z`.
    Go,
    /// Generic attack on the selected target.
    AttackMyTarget,
    /// Close to melee range of the selected target.
    ReachMelee,
    /// Tank-role assist on the selected target.
    TankAssist,
    /// Damage-role assist on the selected target.
    DpsAssist,
    /// Bare melee attack.
    Melee,
    /// Back away from the selected target.
    Flee,
    /// Close to spell range of the selected target.
    ReachSpell,
    /// Ranged weapon attack.
    Shoot,
    /// Let the agent pick a combat spell.
    CastCombatSpell,
    /// Open the gossip dialog of a creature; payload is its low GUID.
    GossipHello,
    /// Use a game object; payload is its name.
    Use,
    /// Accept a quest; payload is the quest id.
    AcceptQuest,
    /// Turn in a quest; payload is the quest id.
    TurnInQueryQuest,
    /// Loot nearby corpses.
    Loot,
    /// Follow the master.
    Follow,
    /// Stay in place.
    Stay,
    /// Say a line in chat; payload is the text.
    Say,
    /// Cast a spell by id; payload is `<spell id>` or `<spell id> on <target name>`.
    CastCustomSpell,
}

impl Capability {
    /// The action name passed to [`ActionSurface::do_action`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::AttackMyTarget => "attack my target",
            Self::ReachMelee => "reach melee",
            Self::TankAssist => "tank assist",
            Self::DpsAssist => "dps assist",
            Self::Melee => "melee",
            Self::Flee => "flee",
            Self::ReachSpell => "reach spell",
            Self::Shoot => "shoot",
            Self::CastCombatSpell => "cast combat spell",
            Self::GossipHello => "gossip hello",
            Self::Use => "use",
            Self::AcceptQuest => "accept quest",
            Self::TurnInQueryQuest => "turn in query quest",
            Self::Loot => "loot",
            Self::Follow => "follow",
            Self::Stay => "stay",
            Self::Say => "say",
            Self::CastCustomSpell => "cast custom spell",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// Whether a resolved unit is a creature or a connected player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Found in the map's creature store.
    Creature,
    /// Found among connected players.
    Player,
}

/// A live unit resolved from a low GUID.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitRef {
    /// Low GUID.
    pub guid: EntityGuid,
    /// Display name.
    pub name: String,
    /// Current position.
    pub position: Position,
    /// Creature or player.
    pub kind: UnitKind,
}

/// Whether an interactable is a creature or a game object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractableKind {
    /// A creature (NPC).
    Creature,
    /// A game object.
    Object,
}

/// A creature or game object resolved from a low GUID.
#[derive(Debug, Clone, PartialEq)]
pub struct Interactable {
    /// Low GUID.
    pub guid: EntityGuid,
    /// Display name. Used as the payload of the `use` action.
    pub name: String,
    /// Current position.
    pub position: Position,
    /// Creature or game object.
    pub kind: InteractableKind,
    /// Carries the quest-giver flag.
    pub quest_giver: bool,
}

/// A spell the agent knows, as needed for casting.
#[derive(Debug, Clone, PartialEq)]
pub struct SpellInfo {
    /// Spell id.
    pub id: SpellId,
    /// Name, also the literal action name used to cast it.
    pub name: String,
    /// Maximum range in yards.
    pub max_range: f32,
}

/// One entry of a quest giver's quest menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestMenuEntry {
    /// Quest offered or awaiting turn-in.
    pub quest: QuestId,
}

/// One free-text option of a gossip dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GossipOption {
    /// Option index to pass back when selecting it.
    pub index: u32,
    /// Option text.
    pub text: String,
}

/// Low-level movement intents used by the manual combat fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementIntent {
    /// Move towards the target and stay within `distance`.
    Chase {
        /// Unit to chase.
        target: EntityGuid,
        /// Desired distance.
        distance: f32,
    },
    /// Reposition to keep `distance` between agent and target.
    KeepDistance {
        /// Unit to keep away from.
        target: EntityGuid,
        /// Desired distance.
        distance: f32,
    },
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Read-only view of the game.
pub trait WorldQuery: Send + Sync {
    /// Agents currently controlled by this process, in stable order.
    fn managed_agents(&self) -> Vec<AgentId>;

    /// Present in the world and alive.
    fn is_eligible(&self, agent: AgentId) -> bool;

    /// Name of an agent, if present.
    fn agent_name(&self, agent: AgentId) -> Option<String>;

    /// Full snapshot for observation building.
    fn snapshot(&self, agent: AgentId) -> Option<AgentSnapshot>;

    /// Current position of an agent.
    fn agent_position(&self, agent: AgentId) -> Option<Position>;

    /// Role classification of an agent.
    fn combat_profile(&self, agent: AgentId) -> Option<CombatProfile>;

    /// Resolve a low GUID to a live unit: creature store first, then
    /// connected players.
    fn resolve_unit(&self, agent: AgentId, guid: EntityGuid) -> Option<UnitRef>;

    /// Resolve a low GUID to a creature first, then a game object.
    fn resolve_interactable(&self, agent: AgentId, guid: EntityGuid) -> Option<Interactable>;

    /// Whether the agent can see the entity.
    fn in_line_of_sight(&self, agent: AgentId, guid: EntityGuid) -> bool;

    /// A spell the agent knows, or `None` if it does not know it.
    fn known_spell(&self, agent: AgentId, spell: SpellId) -> Option<SpellInfo>;

    /// Whether a quest template exists.
    fn quest_exists(&self, quest: QuestId) -> bool;

    /// Status of a quest in the agent's log.
    fn quest_status(&self, agent: AgentId, quest: QuestId) -> QuestStatus;

    /// Whether the agent meets the requirements for the quest's reward.
    fn can_reward_quest(&self, agent: AgentId, quest: QuestId) -> bool;

    /// Whether the agent can take and add the quest to its log.
    fn can_take_quest(&self, agent: AgentId, quest: QuestId) -> bool;

    /// Whether the quest has already been rewarded to this agent.
    fn quest_rewarded(&self, agent: AgentId, quest: QuestId) -> bool;

    /// The giver's quest menu as presented to the agent.
    fn quest_menu(&self, agent: AgentId, giver: EntityGuid) -> Vec<QuestMenuEntry>;

    /// Reward items offered as a choice when turning in a quest.
    fn reward_choices(&self, quest: QuestId) -> Vec<ItemId>;

    /// Whether the agent can equip or use an item.
    fn can_use_item(&self, agent: AgentId, item: ItemId) -> bool;

    /// Creatures or objects within `range` of the agent that accept this quest.
    fn quest_enders_in_range(&self, agent: AgentId, quest: QuestId, range: f32)
    -> Vec<EntityGuid>;

    /// Options of the creature's gossip dialog, once opened.
    fn gossip_options(&self, agent: AgentId, giver: EntityGuid) -> Vec<GossipOption>;
}

/// The mutations the decision loop can perform on the game.
pub trait ActionSurface: Send + Sync {
    /// Invoke a named capability with an unstructured payload.
    fn do_action(&self, agent: AgentId, action: &str, payload: &str) -> bool;

    /// Set the agent's selected target.
    fn set_selection(&self, agent: AgentId, target: EntityGuid) -> bool;

    /// Turn the agent to face an entity.
    fn face(&self, agent: AgentId, target: EntityGuid) -> bool;

    /// Start a low-level movement intent.
    fn set_movement(&self, agent: AgentId, intent: MovementIntent) -> bool;

    /// Open the creature's gossip dialog.
    fn open_gossip(&self, agent: AgentId, giver: EntityGuid) -> bool;

    /// Select a gossip option by index.
    fn select_gossip_option(&self, agent: AgentId, giver: EntityGuid, index: u32) -> bool;

    /// Pick the reward item for the next turn-in of this quest.
    fn choose_reward(&self, agent: AgentId, quest: QuestId, item: ItemId) -> bool;
}

/// A full game backend: queries plus actions.
pub trait GameWorld: WorldQuery + ActionSurface {}

impl<T: WorldQuery + ActionSurface> GameWorld for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_names_match_action_system() {
        assert_eq!(Capability::AttackMyTarget.as_str(), "attack my target");
        assert_eq!(Capability::TurnInQueryQuest.as_str(), "turn in query quest");
        assert_eq!(Capability::Stay.to_string(), "stay");
    }
}
