//! In-memory game world driven by a YAML scenario.
//!
//! [`SandboxWorld`] implements both capability traits without a game
//! server. It keeps just enough state for the decision loop to observe the
//! consequences of its own actions:
//!
//! - `go` moves the agent to the requested coordinate
//! - `accept quest` puts the quest in the log as incomplete
//! - `turn in query quest` marks it rewarded
//! - opening a gossip dialog makes its options visible
//!
//! Every call on the action surface, accepted or not, is appended to an
//! action log that tests and the runner can inspect. Individual action names
//! can be configured to be refused.
//!
//! ```yaml
//! agents:
//!   - id: 1
//!     name: Ollamatest
//!     level: 5
//!     position: { x: 0, y: 0, z: 0 }
//!     combat: { style: Melee }
//! creatures:
//!   - guid: 2241
//!     name: Kobold Vermin
//!     disposition: Hostile
//!     position: { x: 8, y: 0, z: 0 }
//! quests:
//!   - id: 7
//!     enders: [17]
//! refused_actions: [shoot]
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use buddy_types::{
    AgentId, AgentSnapshot, CombatProfile, CreatureView, EntityGuid, ItemId, ObjectView,
    PlayerView, Position, QuestGiverMark, QuestId, QuestLogEntry, QuestStatus, SpellId,
    WaypointView,
};
use serde::Deserialize;
use tracing::debug;

use crate::capability::{
    ActionSurface, Capability, GossipOption, Interactable, InteractableKind, MovementIntent,
    QuestMenuEntry, SpellInfo, UnitKind, UnitRef, WorldQuery,
};

/// Errors that can occur when loading a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// Failed to read the file from disk.
    #[error("failed to read scenario file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse scenario YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// Two agents share an id.
    #[error("duplicate agent id {0}")]
    DuplicateAgent(AgentId),
}

impl From<serde_yml::Error> for ScenarioError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

// ---------------------------------------------------------------------------
// Scenario description
// ---------------------------------------------------------------------------

/// A complete scenario file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Agents under management, in scheduling order.
    pub agents: Vec<ScenarioAgent>,
    /// Creatures on the map.
    pub creatures: Vec<ScenarioCreature>,
    /// Game objects on the map.
    pub objects: Vec<ScenarioObject>,
    /// Other connected players.
    pub players: Vec<ScenarioPlayer>,
    /// Navigation nodes.
    pub waypoints: Vec<WaypointView>,
    /// Quest templates.
    pub quests: Vec<ScenarioQuest>,
    /// Action names that are always refused.
    pub refused_actions: Vec<String>,
}

/// An agent and the game-side facts the snapshot does not carry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioAgent {
    /// The agent's own state. Surroundings are filled in from the scenario.
    #[serde(flatten)]
    pub snapshot: AgentSnapshot,
    /// Items the agent can equip or use.
    #[serde(default)]
    pub usable_items: Vec<ItemId>,
}

impl ScenarioAgent {
    /// A level-one agent at the origin.
    pub fn named(id: AgentId, name: &str) -> Self {
        Self {
            snapshot: AgentSnapshot {
                id,
                name: name.to_owned(),
                ..AgentSnapshot::default()
            },
            usable_items: Vec::new(),
        }
    }

    /// Set the position.
    #[must_use]
    pub const fn at(mut self, position: Position) -> Self {
        self.snapshot.position = position;
        self
    }

    /// Set the combat profile.
    #[must_use]
    pub const fn with_profile(mut self, combat: CombatProfile) -> Self {
        self.snapshot.combat = combat;
        self
    }
}

/// A creature with its quest menu and gossip dialog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioCreature {
    /// How the creature appears in observations.
    #[serde(flatten)]
    pub view: CreatureView,
    /// Quests this creature offers or accepts.
    #[serde(default)]
    pub quest_menu: Vec<QuestId>,
    /// Free-text gossip options, in menu order.
    #[serde(default)]
    pub gossip_options: Vec<String>,
    /// Out of line of sight.
    #[serde(default)]
    pub hidden: bool,
}

impl ScenarioCreature {
    /// A living creature with the given identity and position.
    pub fn new(guid: EntityGuid, name: &str, position: Position) -> Self {
        Self {
            view: CreatureView {
                guid,
                name: name.to_owned(),
                position,
                ..CreatureView::default()
            },
            ..Self::default()
        }
    }

    fn is_quest_giver(&self) -> bool {
        self.view.quest_giver != QuestGiverMark::None || !self.quest_menu.is_empty()
    }
}

/// A game object with its quest menu.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioObject {
    /// How the object appears in observations.
    #[serde(flatten)]
    pub view: ObjectView,
    /// Quests this object offers or accepts.
    #[serde(default)]
    pub quest_menu: Vec<QuestId>,
    /// Out of line of sight.
    #[serde(default)]
    pub hidden: bool,
}

/// Another connected player.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioPlayer {
    /// How the player appears in observations.
    #[serde(flatten)]
    pub view: PlayerView,
    /// Out of line of sight.
    #[serde(default)]
    pub hidden: bool,
}

/// A quest template.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioQuest {
    /// Quest id.
    pub id: QuestId,
    /// Reward items offered as a choice.
    #[serde(default)]
    pub reward_choices: Vec<ItemId>,
    /// Creatures or objects that accept the turn-in.
    #[serde(default)]
    pub enders: Vec<EntityGuid>,
    /// Whether agents may take the quest.
    #[serde(default = "default_true")]
    pub available: bool,
    /// Whether agents meet the reward requirements.
    #[serde(default = "default_true")]
    pub reward_eligible: bool,
}

impl ScenarioQuest {
    /// An available, rewardable quest with no reward choices.
    pub const fn new(id: QuestId) -> Self {
        Self {
            id,
            reward_choices: Vec::new(),
            enders: Vec::new(),
            available: true,
            reward_eligible: true,
        }
    }
}

const fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// One call recorded on the action surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    /// Acting agent.
    pub agent: AgentId,
    /// Capability, spell name, or low-level primitive name.
    pub action: String,
    /// Payload as passed.
    pub payload: String,
    /// Whether the world accepted it.
    pub accepted: bool,
}

#[derive(Debug, Default)]
struct SandboxState {
    order: Vec<AgentId>,
    agents: HashMap<AgentId, ScenarioAgent>,
    open_gossip: HashSet<(AgentId, EntityGuid)>,
    log: Vec<ActionRecord>,
}

/// An in-memory [`WorldQuery`] + [`ActionSurface`].
#[derive(Debug, Default)]
pub struct SandboxWorld {
    scenario: Scenario,
    refused: HashSet<String>,
    state: Mutex<SandboxState>,
}

impl SandboxWorld {
    /// Build a world from a scenario.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::DuplicateAgent`] if two agents share an id.
    pub fn new(mut scenario: Scenario) -> Result<Self, ScenarioError> {
        let mut state = SandboxState::default();
        for agent in std::mem::take(&mut scenario.agents) {
            let id = agent.snapshot.id;
            if state.agents.insert(id, agent).is_some() {
                return Err(ScenarioError::DuplicateAgent(id));
            }
            state.order.push(id);
        }
        let refused = scenario.refused_actions.iter().cloned().collect();
        Ok(Self {
            scenario,
            refused,
            state: Mutex::new(state),
        })
    }

    /// Load a scenario from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a scenario from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] if the YAML is invalid.
    pub fn parse(yaml: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_yml::from_str(yaml)?;
        Self::new(scenario)
    }

    /// A world holding only the given agents. Later agents with a repeated
    /// id replace earlier ones.
    pub fn with_agents(agents: Vec<ScenarioAgent>) -> Self {
        let mut state = SandboxState::default();
        for agent in agents {
            let id = agent.snapshot.id;
            if state.agents.insert(id, agent).is_none() {
                state.order.push(id);
            }
        }
        Self {
            scenario: Scenario::default(),
            refused: HashSet::new(),
            state: Mutex::new(state),
        }
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    /// Refuse every call of this action name from now on.
    pub fn refuse_action(&mut self, action: &str) {
        self.refused.insert(action.to_owned());
    }

    /// Add a creature.
    pub fn add_creature(&mut self, creature: ScenarioCreature) {
        self.scenario.creatures.push(creature);
    }

    /// Add a game object.
    pub fn add_object(&mut self, object: ScenarioObject) {
        self.scenario.objects.push(object);
    }

    /// Add another connected player.
    pub fn add_player(&mut self, player: ScenarioPlayer) {
        self.scenario.players.push(player);
    }

    /// Add a quest template.
    pub fn add_quest(&mut self, quest: ScenarioQuest) {
        self.scenario.quests.push(quest);
    }

    /// Put a quest in an agent's log with the given status.
    pub fn set_quest_status(&self, agent: AgentId, quest: QuestId, status: QuestStatus) {
        if let Some(entry) = lock(&self.state).agents.get_mut(&agent) {
            set_log_status(&mut entry.snapshot, quest, status);
        }
    }

    /// Mark an agent dead or alive.
    pub fn set_alive(&self, agent: AgentId, alive: bool) {
        if let Some(entry) = lock(&self.state).agents.get_mut(&agent) {
            entry.snapshot.alive = alive;
        }
    }

    /// Remove an agent from the world.
    pub fn remove_agent(&self, agent: AgentId) {
        let mut state = lock(&self.state);
        state.agents.remove(&agent);
        state.order.retain(|id| *id != agent);
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Every call recorded so far, oldest first.
    pub fn actions(&self) -> Vec<ActionRecord> {
        lock(&self.state).log.clone()
    }

    /// Names of the calls made for one agent, oldest first.
    pub fn action_names(&self, agent: AgentId) -> Vec<String> {
        lock(&self.state)
            .log
            .iter()
            .filter(|r| r.agent == agent)
            .map(|r| r.action.clone())
            .collect()
    }

    /// Forget the action log.
    pub fn clear_actions(&self) {
        lock(&self.state).log.clear();
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn record(&self, agent: AgentId, action: &str, payload: &str) -> bool {
        let mut state = lock(&self.state);
        let accepted = state.agents.contains_key(&agent) && !self.refused.contains(action);
        state.log.push(ActionRecord {
            agent,
            action: action.to_owned(),
            payload: payload.to_owned(),
            accepted,
        });
        debug!(agent_id = %agent, action, payload, accepted, "sandbox action");
        accepted
    }

    fn quest(&self, quest: QuestId) -> Option<&ScenarioQuest> {
        self.scenario.quests.iter().find(|q| q.id == quest)
    }

    fn creature(&self, guid: EntityGuid) -> Option<&ScenarioCreature> {
        self.scenario.creatures.iter().find(|c| c.view.guid == guid)
    }

    fn object(&self, guid: EntityGuid) -> Option<&ScenarioObject> {
        self.scenario.objects.iter().find(|o| o.view.guid == guid)
    }

    fn player(&self, guid: EntityGuid) -> Option<&ScenarioPlayer> {
        self.scenario.players.iter().find(|p| p.view.guid == guid)
    }

    fn entity_position(&self, guid: EntityGuid) -> Option<Position> {
        self.creature(guid)
            .map(|c| c.view.position)
            .or_else(|| self.object(guid).map(|o| o.view.position))
            .or_else(|| self.player(guid).map(|p| p.view.position))
    }

    /// What a quest giver currently offers this agent.
    fn mark_for(
        &self,
        snapshot: &AgentSnapshot,
        menu: &[QuestId],
        base: QuestGiverMark,
    ) -> QuestGiverMark {
        let status = |quest: QuestId| log_status(snapshot, quest);
        let turn_in = menu.iter().any(|&q| {
            status(q) == QuestStatus::Complete && self.quest(q).is_some_and(|t| t.reward_eligible)
        });
        if turn_in {
            return QuestGiverMark::TurnInReady;
        }
        let available = menu.iter().any(|&q| {
            status(q) == QuestStatus::None && self.quest(q).is_some_and(|t| t.available)
        });
        if available {
            return QuestGiverMark::QuestsAvailable;
        }
        if menu.is_empty() { base } else { QuestGiverMark::None }
    }

    fn with_agent<T>(&self, agent: AgentId, f: impl FnOnce(&ScenarioAgent) -> T) -> Option<T> {
        lock(&self.state).agents.get(&agent).map(f)
    }
}

impl WorldQuery for SandboxWorld {
    fn managed_agents(&self) -> Vec<AgentId> {
        lock(&self.state).order.clone()
    }

    fn is_eligible(&self, agent: AgentId) -> bool {
        self.with_agent(agent, |a| a.snapshot.alive).unwrap_or(false)
    }

    fn agent_name(&self, agent: AgentId) -> Option<String> {
        self.with_agent(agent, |a| a.snapshot.name.clone())
    }

    fn snapshot(&self, agent: AgentId) -> Option<AgentSnapshot> {
        let mut snapshot = self.with_agent(agent, |a| a.snapshot.clone())?;
        let s = &self.scenario;

        let creatures: Vec<CreatureView> = s
            .creatures
            .iter()
            .filter(|c| !c.hidden)
            .map(|c| CreatureView {
                quest_giver: self.mark_for(&snapshot, &c.quest_menu, c.view.quest_giver),
                ..c.view.clone()
            })
            .collect();
        let objects: Vec<ObjectView> = s
            .objects
            .iter()
            .filter(|o| !o.hidden)
            .map(|o| ObjectView {
                quest_giver: self.mark_for(&snapshot, &o.quest_menu, o.view.quest_giver),
                ..o.view.clone()
            })
            .collect();

        snapshot.creatures.extend(creatures);
        snapshot.objects.extend(objects);
        snapshot
            .players
            .extend(s.players.iter().filter(|p| !p.hidden).map(|p| p.view.clone()));
        snapshot.waypoints.extend(s.waypoints.iter().cloned());
        Some(snapshot)
    }

    fn agent_position(&self, agent: AgentId) -> Option<Position> {
        self.with_agent(agent, |a| a.snapshot.position)
    }

    fn combat_profile(&self, agent: AgentId) -> Option<CombatProfile> {
        self.with_agent(agent, |a| a.snapshot.combat)
    }

    fn resolve_unit(&self, _agent: AgentId, guid: EntityGuid) -> Option<UnitRef> {
        if let Some(c) = self.creature(guid) {
            return Some(UnitRef {
                guid,
                name: c.view.name.clone(),
                position: c.view.position,
                kind: UnitKind::Creature,
            });
        }
        self.player(guid).map(|p| UnitRef {
            guid,
            name: p.view.name.clone(),
            position: p.view.position,
            kind: UnitKind::Player,
        })
    }

    fn resolve_interactable(&self, _agent: AgentId, guid: EntityGuid) -> Option<Interactable> {
        if let Some(c) = self.creature(guid) {
            return Some(Interactable {
                guid,
                name: c.view.name.clone(),
                position: c.view.position,
                kind: InteractableKind::Creature,
                quest_giver: c.is_quest_giver(),
            });
        }
        self.object(guid).map(|o| Interactable {
            guid,
            name: o.view.name.clone(),
            position: o.view.position,
            kind: InteractableKind::Object,
            quest_giver: o.view.quest_giver != QuestGiverMark::None || !o.quest_menu.is_empty(),
        })
    }

    fn in_line_of_sight(&self, _agent: AgentId, guid: EntityGuid) -> bool {
        self.creature(guid)
            .map(|c| c.hidden)
            .or_else(|| self.object(guid).map(|o| o.hidden))
            .or_else(|| self.player(guid).map(|p| p.hidden))
            .is_some_and(|hidden| !hidden)
    }

    fn known_spell(&self, agent: AgentId, spell: SpellId) -> Option<SpellInfo> {
        self.with_agent(agent, |a| {
            a.snapshot
                .spells
                .iter()
                .find(|s| s.id == spell)
                .map(|s| SpellInfo {
                    id: s.id,
                    name: s.name.clone(),
                    max_range: s.max_range,
                })
        })
        .flatten()
    }

    fn quest_exists(&self, quest: QuestId) -> bool {
        self.quest(quest).is_some()
    }

    fn quest_status(&self, agent: AgentId, quest: QuestId) -> QuestStatus {
        self.with_agent(agent, |a| log_status(&a.snapshot, quest))
            .unwrap_or_default()
    }

    fn can_reward_quest(&self, _agent: AgentId, quest: QuestId) -> bool {
        self.quest(quest).is_some_and(|q| q.reward_eligible)
    }

    fn can_take_quest(&self, agent: AgentId, quest: QuestId) -> bool {
        self.quest(quest).is_some_and(|q| q.available)
            && self.quest_status(agent, quest) == QuestStatus::None
    }

    fn quest_rewarded(&self, agent: AgentId, quest: QuestId) -> bool {
        self.quest_status(agent, quest) == QuestStatus::Rewarded
    }

    fn quest_menu(&self, _agent: AgentId, giver: EntityGuid) -> Vec<QuestMenuEntry> {
        let menu = self
            .creature(giver)
            .map(|c| c.quest_menu.as_slice())
            .or_else(|| self.object(giver).map(|o| o.quest_menu.as_slice()))
            .unwrap_or_default();
        menu.iter().map(|&quest| QuestMenuEntry { quest }).collect()
    }

    fn reward_choices(&self, quest: QuestId) -> Vec<ItemId> {
        self.quest(quest)
            .map(|q| q.reward_choices.clone())
            .unwrap_or_default()
    }

    fn can_use_item(&self, agent: AgentId, item: ItemId) -> bool {
        self.with_agent(agent, |a| a.usable_items.contains(&item))
            .unwrap_or(false)
    }

    fn quest_enders_in_range(&self, agent: AgentId, quest: QuestId, range: f32) -> Vec<EntityGuid> {
        let (Some(me), Some(template)) = (self.agent_position(agent), self.quest(quest)) else {
            return Vec::new();
        };
        template
            .enders
            .iter()
            .copied()
            .filter(|&guid| {
                self.entity_position(guid)
                    .is_some_and(|p| me.distance_to(&p) <= range)
            })
            .collect()
    }

    fn gossip_options(&self, agent: AgentId, giver: EntityGuid) -> Vec<GossipOption> {
        if !lock(&self.state).open_gossip.contains(&(agent, giver)) {
            return Vec::new();
        }
        self.creature(giver)
            .map(|c| {
                c.gossip_options
                    .iter()
                    .zip(0_u32..)
                    .map(|(text, index)| GossipOption {
                        index,
                        text: text.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl ActionSurface for SandboxWorld {
    fn do_action(&self, agent: AgentId, action: &str, payload: &str) -> bool {
        if !self.record(agent, action, payload) {
            return false;
        }

        let mut state = lock(&self.state);
        let Some(entry) = state.agents.get_mut(&agent) else {
            return false;
        };
        if action == Capability::Go.as_str() {
            match parse_coordinates(payload) {
                Some(position) => entry.snapshot.position = position,
                None => return false,
            }
        } else if action == Capability::AcceptQuest.as_str() {
            if let Ok(quest) = payload.parse::<QuestId>() {
                set_log_status(&mut entry.snapshot, quest, QuestStatus::Incomplete);
            }
        } else if action == Capability::TurnInQueryQuest.as_str() {
            if let Ok(quest) = payload.parse::<QuestId>() {
                set_log_status(&mut entry.snapshot, quest, QuestStatus::Rewarded);
            }
        }
        true
    }

    fn set_selection(&self, agent: AgentId, target: EntityGuid) -> bool {
        self.record(agent, "set selection", &target.to_string())
    }

    fn face(&self, agent: AgentId, target: EntityGuid) -> bool {
        self.record(agent, "face", &target.to_string())
    }

    fn set_movement(&self, agent: AgentId, intent: MovementIntent) -> bool {
        match intent {
            MovementIntent::Chase { target, distance } => {
                self.record(agent, "chase", &format!("{target} {distance}"))
            }
            MovementIntent::KeepDistance { target, distance } => {
                self.record(agent, "keep distance", &format!("{target} {distance}"))
            }
        }
    }

    fn open_gossip(&self, agent: AgentId, giver: EntityGuid) -> bool {
        let accepted = self.record(agent, "open gossip", &giver.to_string())
            && self.creature(giver).is_some();
        if accepted {
            lock(&self.state).open_gossip.insert((agent, giver));
        }
        accepted
    }

    fn select_gossip_option(&self, agent: AgentId, giver: EntityGuid, index: u32) -> bool {
        let open = lock(&self.state).open_gossip.contains(&(agent, giver));
        self.record(agent, "select gossip option", &index.to_string()) && open
    }

    fn choose_reward(&self, agent: AgentId, quest: QuestId, item: ItemId) -> bool {
        self.record(agent, "choose reward", &format!("{quest} {item}"))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn log_status(snapshot: &AgentSnapshot, quest: QuestId) -> QuestStatus {
    snapshot
        .quests
        .iter()
        .find(|q| q.id == quest)
        .map(|q| q.status)
        .unwrap_or_default()
}

fn set_log_status(snapshot: &mut AgentSnapshot, quest: QuestId, status: QuestStatus) {
    match snapshot.quests.iter_mut().find(|q| q.id == quest) {
        Some(entry) => entry.status = status,
        None => snapshot.quests.push(QuestLogEntry {
            id: quest,
            title: format!("Quest {quest}"),
            status,
            ..QuestLogEntry::default()
        }),
    }
}

fn parse_coordinates(payload: &str) -> Option<Position> {
    let mut parts = payload.split(';').map(|p| p.trim().parse::<f32>().ok());
    let (x, y, z) = (parts.next()??, parts.next()??, parts.next()??);
    Some(Position::new(x, y, z))
}

#[cfg(test)]
mod tests {
    use buddy_types::Disposition;

    use super::*;

    const SCENARIO: &str = r"
agents:
  - id: 1
    name: Ollamatest
    level: 5
    position: { x: 0, y: 0, z: 0 }
    combat: { style: Melee }
    usable_items: [100]
creatures:
  - guid: 2241
    name: Kobold Vermin
    disposition: Hostile
    position: { x: 8, y: 0, z: 0 }
  - guid: 17
    name: Marshal McBride
    disposition: Friendly
    position: { x: 3, y: 0, z: 0 }
    quest_menu: [7]
    gossip_options: [Tell me about the quest]
quests:
  - id: 7
    enders: [17]
    reward_choices: [99, 100]
refused_actions: [shoot]
";

    fn world() -> SandboxWorld {
        let world = SandboxWorld::parse(SCENARIO);
        assert!(world.is_ok(), "{world:?}");
        world.unwrap_or_default()
    }

    const BOT: AgentId = AgentId(1);

    #[test]
    fn scenario_loads_agents_and_entities() {
        let world = world();
        assert_eq!(world.managed_agents(), vec![BOT]);
        assert!(world.is_eligible(BOT));
        assert_eq!(world.agent_name(BOT).as_deref(), Some("Ollamatest"));

        let snapshot = world.snapshot(BOT);
        assert!(snapshot.is_some());
        let snapshot = snapshot.unwrap_or_default();
        assert_eq!(snapshot.creatures.len(), 2);
        let marshal = snapshot.creatures.iter().find(|c| c.guid == EntityGuid(17));
        assert_eq!(
            marshal.map(|c| c.quest_giver),
            Some(QuestGiverMark::QuestsAvailable)
        );
        let kobold = snapshot.creatures.iter().find(|c| c.guid == EntityGuid(2241));
        assert_eq!(kobold.map(|c| c.disposition), Some(Disposition::Hostile));
    }

    #[test]
    fn duplicate_agents_are_rejected() {
        let yaml = "agents:\n  - { id: 1, name: A }\n  - { id: 1, name: B }\n";
        assert!(matches!(
            SandboxWorld::parse(yaml),
            Err(ScenarioError::DuplicateAgent(AgentId(1)))
        ));
    }

    #[test]
    fn go_moves_the_agent() {
        let world = world();
        assert!(world.do_action(BOT, "go", "1.5;2;-3"));
        assert_eq!(world.agent_position(BOT), Some(Position::new(1.5, 2.0, -3.0)));
        assert!(!world.do_action(BOT, "go", "nowhere"));
    }

    #[test]
    fn refused_actions_are_logged_and_fail() {
        let world = world();
        assert!(!world.do_action(BOT, "shoot", ""));
        let log = world.actions();
        assert_eq!(log.len(), 1);
        assert!(log.first().is_some_and(|r| !r.accepted && r.action == "shoot"));
    }

    #[test]
    fn quest_lifecycle_updates_marks() {
        let world = world();
        assert!(world.can_take_quest(BOT, QuestId(7)));
        assert!(world.do_action(BOT, "accept quest", "7"));
        assert_eq!(world.quest_status(BOT, QuestId(7)), QuestStatus::Incomplete);
        assert!(!world.can_take_quest(BOT, QuestId(7)));

        world.set_quest_status(BOT, QuestId(7), QuestStatus::Complete);
        let mark = world
            .snapshot(BOT)
            .and_then(|s| s.creatures.into_iter().find(|c| c.guid == EntityGuid(17)))
            .map(|c| c.quest_giver);
        assert_eq!(mark, Some(QuestGiverMark::TurnInReady));

        assert!(world.do_action(BOT, "turn in query quest", "7"));
        assert!(world.quest_rewarded(BOT, QuestId(7)));
    }

    #[test]
    fn enders_filtered_by_range() {
        let world = world();
        assert_eq!(
            world.quest_enders_in_range(BOT, QuestId(7), 5.5),
            vec![EntityGuid(17)]
        );
        assert!(world.quest_enders_in_range(BOT, QuestId(7), 2.0).is_empty());
    }

    #[test]
    fn gossip_options_need_open_dialog() {
        let world = world();
        assert!(world.gossip_options(BOT, EntityGuid(17)).is_empty());
        assert!(world.open_gossip(BOT, EntityGuid(17)));
        let options = world.gossip_options(BOT, EntityGuid(17));
        assert_eq!(options.len(), 1);
        assert_eq!(options.first().map(|o| o.index), Some(0));
    }

    #[test]
    fn dead_or_removed_agents_are_ineligible() {
        let world = world();
        world.set_alive(BOT, false);
        assert!(!world.is_eligible(BOT));
        world.set_alive(BOT, true);
        world.remove_agent(BOT);
        assert!(!world.is_eligible(BOT));
        assert!(world.managed_agents().is_empty());
        assert!(!world.do_action(BOT, "loot", ""));
    }
}
