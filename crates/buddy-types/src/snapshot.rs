//! Read-only view of an agent's situation.
//!
//! The game owns the agent; the decision loop only ever sees an
//! [`AgentSnapshot`] taken at the start of a cycle. Every field here is
//! something the observation can mention. Visibility (line of sight, map
//! membership) is the game's concern: whatever is in the snapshot is visible.
//!
//! All structs deserialize with generous defaults so scenario files only
//! have to spell out what matters for the situation being described.

use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, EntityGuid, QuestId, SpellId};

// ---------------------------------------------------------------------------
// Geometry and pools
// ---------------------------------------------------------------------------

/// A point in the agent's map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// World X coordinate.
    pub x: f32,
    /// World Y coordinate.
    pub y: f32,
    /// World Z coordinate.
    pub z: f32,
}

impl Position {
    /// Create a position from raw coordinates.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Straight-line distance to another position.
    pub fn distance_to(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx.mul_add(dx, dy.mul_add(dy, dz * dz)).sqrt()
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2} {:.2} {:.2}", self.x, self.y, self.z)
    }
}

/// A current/maximum resource pool (health, mana, energy).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Current value.
    pub current: u32,
    /// Maximum value.
    pub max: u32,
}

impl Pool {
    /// Create a pool.
    pub const fn new(current: u32, max: u32) -> Self {
        Self { current, max }
    }
}

impl core::fmt::Display for Pool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.current, self.max)
    }
}

// ---------------------------------------------------------------------------
// Classification enums
// ---------------------------------------------------------------------------

/// Player faction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// The Alliance.
    #[default]
    Alliance,
    /// The Horde.
    Horde,
}

impl Faction {
    /// Display name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alliance => "Alliance",
            Self::Horde => "Horde",
        }
    }
}

/// How an agent fights. Drives positioning in the dispatcher and the range
/// band shown in the observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatStyle {
    /// Must stand within melee range of the target.
    Melee,
    /// Fights from a distance with spells or ranged weapons.
    Ranged,
    /// Neither classification applies.
    #[default]
    Hybrid,
}

impl CombatStyle {
    /// Upper-case label used in the combat summary.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Melee => "MELEE",
            Self::Ranged => "RANGED",
            Self::Hybrid => "HYBRID",
        }
    }
}

/// Role classification of an agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatProfile {
    /// Melee, ranged, or hybrid.
    #[serde(default)]
    pub style: CombatStyle,
    /// Whether the agent plays a tank role (selects the tank assist action).
    #[serde(default)]
    pub is_tank: bool,
}

/// Resource a spell consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerType {
    /// Mana.
    Mana,
    /// Rage.
    Rage,
    /// Focus.
    Focus,
    /// Energy.
    Energy,
    /// Runic power.
    RunicPower,
}

impl PowerType {
    /// Lower-case name used in cost descriptions.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mana => "mana",
            Self::Rage => "rage",
            Self::Focus => "focus",
            Self::Energy => "energy",
            Self::RunicPower => "runic power",
        }
    }
}

/// The effect category of a spell. Spells without one are not listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpellEffect {
    /// Direct school damage.
    Damage,
    /// Healing.
    Heal,
    /// Applies a buff or debuff.
    Aura,
    /// Removes magic effects.
    Dispel,
    /// Generates threat.
    Threat,
}

impl SpellEffect {
    /// Short description used in the ability summary.
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Damage => "Deals damage",
            Self::Heal => "Heals the target",
            Self::Aura => "Applies an aura",
            Self::Dispel => "Dispels magic",
            Self::Threat => "Generates threat",
        }
    }
}

/// Attitude of a creature towards the agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disposition {
    /// Attacks on sight.
    Hostile,
    /// Will not attack.
    Friendly,
    /// Attacks only when provoked.
    #[default]
    Neutral,
}

impl Disposition {
    /// Upper-case label used in the entity list.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hostile => "ENEMY",
            Self::Friendly => "FRIENDLY",
            Self::Neutral => "NEUTRAL",
        }
    }
}

/// What a quest giver currently offers this particular agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestGiverMark {
    /// Not a quest giver, or nothing relevant on offer.
    #[default]
    None,
    /// Holds at least one completed quest the agent can turn in.
    TurnInReady,
    /// Offers at least one quest the agent can take.
    QuestsAvailable,
}

impl QuestGiverMark {
    /// Bracketed tag appended to the entity name, if any.
    pub const fn tag(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::TurnInReady => Some("[QUEST GIVER - TURN IN READY]"),
            Self::QuestsAvailable => Some("[QUEST GIVER - QUESTS AVAILABLE]"),
        }
    }
}

/// Non-quest services an NPC may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpcService {
    /// Buys and sells items.
    Vendor,
    /// Teaches spells or professions.
    Trainer,
    /// Provides flight paths.
    FlightMaster,
    /// Sets the hearthstone location.
    Innkeeper,
    /// Opens the bank.
    Banker,
    /// Opens the auction house.
    Auctioneer,
}

impl NpcService {
    /// Bracketed tag appended to the entity name.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Vendor => "[VENDOR]",
            Self::Trainer => "[TRAINER]",
            Self::FlightMaster => "[FLIGHT MASTER]",
            Self::Innkeeper => "[INNKEEPER]",
            Self::Banker => "[BANKER]",
            Self::Auctioneer => "[AUCTIONEER]",
        }
    }
}

/// Status of a quest in an agent's quest log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestStatus {
    /// Not in the log and never completed.
    #[default]
    None,
    /// Accepted, objectives outstanding.
    Incomplete,
    /// Objectives done, not yet turned in.
    Complete,
    /// Failed.
    Failed,
    /// Turned in and rewarded.
    Rewarded,
}

/// Kind of quest objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveKind {
    /// Kill a number of creatures.
    Kill,
    /// Use or click a game object.
    Use,
    /// Collect items.
    Collect,
    /// Reach an area or trigger an event.
    Explore,
}

/// Whether a turn-in target is a creature or a game object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// An NPC.
    #[default]
    Npc,
    /// A game object.
    Object,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// A unit the agent is fighting (its target or its attacker).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitView {
    /// Low GUID.
    pub guid: EntityGuid,
    /// Display name.
    pub name: String,
    /// Level.
    pub level: u8,
    /// Health pool.
    pub health: Pool,
    /// Position.
    pub position: Position,
    /// Elite creature flag.
    pub elite: bool,
    /// Set when the unit is a player character.
    pub player: Option<PlayerTraits>,
    /// Names of the auras on the unit.
    pub auras: Vec<String>,
}

/// Extra detail shown for player-controlled units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTraits {
    /// Faction.
    pub faction: Faction,
    /// Class name.
    pub class: String,
    /// Race name.
    pub race: String,
}

/// A known ability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellView {
    /// Spell id.
    pub id: SpellId,
    /// Spell name, also the literal action name used to cast it.
    pub name: String,
    /// Effect category, if recognised.
    pub effect: Option<SpellEffect>,
    /// Resource cost; `None` means free.
    pub cost: Option<SpellCost>,
    /// Passive spells cannot be cast.
    pub passive: bool,
    /// Generic-family spells (racials, professions, mounts) are not combat abilities.
    pub generic_family: bool,
    /// Currently on cooldown.
    pub on_cooldown: bool,
    /// Maximum cast range in yards.
    pub max_range: f32,
}

/// Resource cost of a spell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellCost {
    /// Amount consumed.
    pub amount: u32,
    /// Resource consumed.
    pub power: PowerType,
}

/// Another member of the agent's group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupMember {
    /// Low GUID.
    pub guid: EntityGuid,
    /// Name.
    pub name: String,
    /// Level.
    pub level: u8,
    /// Health pool.
    pub health: Pool,
    /// Position.
    pub position: Position,
    /// The unit this member is fighting, if any.
    pub fighting: Option<UnitView>,
}

/// One objective of an in-progress quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestObjective {
    /// Objective kind.
    pub kind: ObjectiveKind,
    /// Creature, object, or item name. Empty for exploration objectives.
    #[serde(default)]
    pub target: String,
    /// Progress so far.
    #[serde(default)]
    pub current: u32,
    /// Amount required.
    pub required: u32,
}

/// Who accepts a completed quest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnInTarget {
    /// NPC or game object.
    #[serde(default)]
    pub kind: TargetKind,
    /// Template name.
    pub name: String,
}

/// A quest in the agent's log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestLogEntry {
    /// Quest id.
    pub id: QuestId,
    /// Title.
    pub title: String,
    /// Quest level.
    pub level: u8,
    /// Experience granted at the agent's level.
    pub xp_reward: u32,
    /// Log status. Only `Incomplete` and `Complete` are shown.
    pub status: QuestStatus,
    /// Objective text.
    pub description: String,
    /// Objectives with progress counters.
    pub objectives: Vec<QuestObjective>,
    /// Where the quest can be turned in.
    pub turn_in_targets: Vec<TurnInTarget>,
}

/// A creature in the agent's surroundings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureView {
    /// Low GUID.
    pub guid: EntityGuid,
    /// Name.
    pub name: String,
    /// Level.
    pub level: u8,
    /// Health pool.
    pub health: Pool,
    /// Position.
    pub position: Position,
    /// False for corpses.
    pub alive: bool,
    /// Corpse the agent (or its group) may loot.
    pub lootable: bool,
    /// Corpse that can be skinned.
    pub skinnable: bool,
    /// Attitude towards the agent.
    pub disposition: Disposition,
    /// Quest offers relevant to this agent.
    pub quest_giver: QuestGiverMark,
    /// Other services offered.
    pub services: Vec<NpcService>,
    /// Someone's pet. Never listed.
    pub pet: bool,
    /// A totem. Never listed.
    pub totem: bool,
}

impl Default for CreatureView {
    fn default() -> Self {
        Self {
            guid: EntityGuid(0),
            name: String::new(),
            level: 1,
            health: Pool::default(),
            position: Position::default(),
            alive: true,
            lootable: false,
            skinnable: false,
            disposition: Disposition::default(),
            quest_giver: QuestGiverMark::default(),
            services: Vec::new(),
            pet: false,
            totem: false,
        }
    }
}

/// A game object in the agent's surroundings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectView {
    /// Low GUID.
    pub guid: EntityGuid,
    /// Name.
    pub name: String,
    /// Game object type id.
    pub type_id: u32,
    /// Position.
    pub position: Position,
    /// Gathering profession tag (Herbalism, Mining, ...).
    pub profession: Option<String>,
    /// Quest offers relevant to this agent.
    pub quest_giver: QuestGiverMark,
}

/// Another player character in view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerView {
    /// Low GUID.
    pub guid: EntityGuid,
    /// Name.
    pub name: String,
    /// Level.
    pub level: u8,
    /// Class, race and faction.
    pub traits: PlayerTraits,
    /// Position.
    pub position: Position,
}

/// A navigation node on the agent's map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointView {
    /// Node name.
    pub name: String,
    /// Position.
    pub position: Position,
}

// ---------------------------------------------------------------------------
// Agent snapshot
// ---------------------------------------------------------------------------

/// Everything the decision loop knows about one agent at the start of a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSnapshot {
    /// Agent GUID.
    pub id: AgentId,
    /// Character name. Chat messages are routed by it.
    pub name: String,
    /// Level.
    pub level: u8,
    /// Class name.
    pub class: String,
    /// Race name.
    pub race: String,
    /// Gender.
    pub gender: String,
    /// Faction.
    pub faction: Faction,
    /// Money in copper.
    pub money: u64,
    /// Area name.
    pub area: String,
    /// Zone name.
    pub zone: String,
    /// Map name.
    pub map: String,
    /// Position.
    pub position: Position,
    /// False while dead.
    pub alive: bool,
    /// Health pool.
    pub health: Pool,
    /// Mana pool (zero for classes without mana).
    pub mana: Pool,
    /// Energy pool (zero for classes without energy).
    pub energy: Pool,
    /// Role classification.
    pub combat: CombatProfile,
    /// In-combat flag.
    pub in_combat: bool,
    /// Current victim.
    pub target: Option<UnitView>,
    /// A unit attacking the agent while it has no victim of its own.
    pub attacker: Option<UnitView>,
    /// Known spells, unfiltered.
    pub spells: Vec<SpellView>,
    /// Whether the agent is in a group.
    pub in_group: bool,
    /// The other group members.
    pub group: Vec<GroupMember>,
    /// Quest log.
    pub quests: Vec<QuestLogEntry>,
    /// Creatures in line of sight, in game order.
    pub creatures: Vec<CreatureView>,
    /// Game objects in line of sight, in game order.
    pub objects: Vec<ObjectView>,
    /// Other player characters in line of sight.
    pub players: Vec<PlayerView>,
    /// Navigation nodes on the current map.
    pub waypoints: Vec<WaypointView>,
}

impl Default for AgentSnapshot {
    fn default() -> Self {
        Self {
            id: AgentId(0),
            name: String::new(),
            level: 1,
            class: String::new(),
            race: String::new(),
            gender: "Male".to_owned(),
            faction: Faction::default(),
            money: 0,
            area: "UnknownArea".to_owned(),
            zone: "UnknownZone".to_owned(),
            map: "UnknownMap".to_owned(),
            position: Position::default(),
            alive: true,
            health: Pool::default(),
            mana: Pool::default(),
            energy: Pool::default(),
            combat: CombatProfile::default(),
            in_combat: false,
            target: None,
            attacker: None,
            spells: Vec::new(),
            in_group: false,
            group: Vec::new(),
            quests: Vec::new(),
            creatures: Vec::new(),
            objects: Vec::new(),
            players: Vec::new(),
            waypoints: Vec::new(),
        }
    }
}

impl AgentSnapshot {
    /// Whole gold pieces (money is stored in copper).
    pub const fn gold(&self) -> u64 {
        self.money / 10_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 4.0, 12.0);
        assert!((a.distance_to(&b) - 13.0).abs() < 1e-4);
        assert!(a.distance_to(&a).abs() < f32::EPSILON);
    }

    #[test]
    fn gold_truncates_copper() {
        let snapshot = AgentSnapshot {
            money: 125_999,
            ..AgentSnapshot::default()
        };
        assert_eq!(snapshot.gold(), 12);
    }

    #[test]
    fn creature_defaults_to_alive_neutral() {
        let c: CreatureView = serde_json::from_str(r#"{"guid": 5, "name": "Kobold"}"#)
            .unwrap_or_default();
        assert!(c.alive);
        assert_eq!(c.disposition, Disposition::Neutral);
        assert_eq!(c.guid, EntityGuid(5));
    }

    #[test]
    fn quest_giver_tags() {
        assert_eq!(QuestGiverMark::None.tag(), None);
        assert_eq!(
            QuestGiverMark::TurnInReady.tag(),
            Some("[QUEST GIVER - TURN IN READY]")
        );
        assert_eq!(NpcService::FlightMaster.tag(), "[FLIGHT MASTER]");
    }
}
