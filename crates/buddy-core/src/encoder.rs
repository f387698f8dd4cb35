//! Observation builder.
//!
//! Turns an [`AgentSnapshot`] plus the agent's history and mailbox into the
//! plain-text observation the language model reasons over. Sections appear
//! in a fixed order:
//!
//! 1. identity and vital stats
//! 2. combat summary with range band
//! 3. castable abilities
//! 4. group status
//! 5. quest log
//! 6. visible creatures and objects, most actionable first
//! 7. navigation waypoints
//! 8. allied players
//! 9. unread chat addressed to the agent
//! 10. recent (command, reasoning) pairs
//!
//! Encoding drains the mailbox. Everything else is read-only, so two
//! encodings of the same snapshot with an empty mailbox are identical.

use buddy_types::{
    AgentId, AgentSnapshot, CombatStyle, CreatureView, Disposition, ObjectView, ObjectiveKind,
    PlayerView, QuestGiverMark, QuestLogEntry, QuestStatus, SpellView, TargetKind, UnitView,
    WaypointView,
};

use crate::config::{CombatConfig, EncoderConfig};
use crate::store::{AgentMemoryStore, MailboxEntry};

/// Range band of the agent's current target, from its point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBand {
    /// Melee fighter within melee range.
    InMeleeRange,
    /// Melee fighter outside melee range.
    TooFarForMelee,
    /// Ranged fighter inside the minimum distance.
    TooClose,
    /// Ranged fighter between the minimum distance and spell range.
    GoodRangedPosition,
    /// Ranged fighter beyond spell range.
    TooFarForSpells,
}

impl RangeBand {
    /// Classify a distance for a combat style. Hybrids have no band.
    pub const fn classify(style: CombatStyle, distance: f32, combat: &CombatConfig) -> Option<Self> {
        match style {
            CombatStyle::Melee if distance <= combat.melee_range => Some(Self::InMeleeRange),
            CombatStyle::Melee => Some(Self::TooFarForMelee),
            CombatStyle::Ranged if distance < combat.min_ranged_distance => Some(Self::TooClose),
            CombatStyle::Ranged if distance <= combat.spell_range => {
                Some(Self::GoodRangedPosition)
            }
            CombatStyle::Ranged => Some(Self::TooFarForSpells),
            CombatStyle::Hybrid => None,
        }
    }

    /// Bracketed label shown after the target distance.
    pub const fn label(self) -> &'static str {
        match self {
            Self::InMeleeRange => "[IN MELEE RANGE]",
            Self::TooFarForMelee => "[TOO FAR FOR MELEE]",
            Self::TooClose => "[TOO CLOSE - NEED TO BACK AWAY]",
            Self::GoodRangedPosition => "[GOOD RANGED POSITION]",
            Self::TooFarForSpells => "[TOO FAR FOR SPELLS]",
        }
    }
}

/// A finished observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Agent the observation describes.
    pub agent_id: AgentId,
    /// Agent name.
    pub agent_name: String,
    /// The observation document.
    pub text: String,
    /// Mailbox messages consumed while encoding.
    pub messages_drained: usize,
    /// Creatures and objects listed.
    pub entities_listed: usize,
}

/// Builds observations. Cheap to clone; holds only configuration.
#[derive(Debug, Clone, Default)]
pub struct StateEncoder {
    encoder: EncoderConfig,
    combat: CombatConfig,
}

impl StateEncoder {
    /// Create an encoder with the given radii, caps, and range thresholds.
    pub const fn new(encoder: EncoderConfig, combat: CombatConfig) -> Self {
        Self { encoder, combat }
    }

    /// Build the observation for `snapshot`, draining the agent's mailbox.
    pub fn encode(&self, snapshot: &AgentSnapshot, store: &AgentMemoryStore) -> Observation {
        let mut lines: Vec<String> = Vec::new();

        push_identity(&mut lines, snapshot);
        lines.push(self.combat_summary(snapshot));
        lines.push(String::new());

        lines.push("Your known spells:".to_owned());
        lines.extend(snapshot.spells.iter().filter_map(describe_spell));
        lines.push(String::new());

        push_group(&mut lines, snapshot);
        push_quests(&mut lines, &snapshot.quests);

        let entities = self.visible_entities(snapshot);
        let entities_listed = entities.len();
        if !entities.is_empty() {
            lines.push("Visible locations/objects in line of sight:".to_owned());
            lines.extend(entities.into_iter().map(|e| format!(" - {e}")));
        }

        let waypoints = self.nearby_waypoints(snapshot);
        let any_waypoints = !waypoints.is_empty();
        if any_waypoints {
            lines.push("Nearby navigation waypoints:".to_owned());
            lines.extend(waypoints.into_iter().map(|w| format!(" - {w}")));
        }

        let players = self.allied_players(snapshot);
        if !players.is_empty() {
            lines.push("Visible players in area:".to_owned());
            lines.extend(players.into_iter().map(|p| format!(" - {p}")));
        }

        if entities_listed > 0 || any_waypoints {
            lines.push(
                "You must select one of these locations or waypoints to move to, interact with, \
                 accept or turn in quests, attack, loot, or any other action or choose a new \
                 unexplored spot."
                    .to_owned(),
            );
        }

        let messages = store.drain_mailbox(snapshot.id);
        let messages_drained = messages.len();
        push_mailbox(&mut lines, &messages);

        let pairs = store.history_pairs(snapshot.id);
        if !pairs.is_empty() {
            lines.push(format!(
                "Last {} commands and their reasoning (most recent at the bottom):",
                store.capacity()
            ));
            for pair in pairs {
                lines.push(format!(" - Command: {}", pair.command));
                lines.push(format!("   Reasoning: {}", pair.reasoning));
            }
        }

        let mut text = lines.join("\n");
        text.push('\n');

        Observation {
            agent_id: snapshot.id,
            agent_name: snapshot.name.clone(),
            text,
            messages_drained,
            entities_listed,
        }
    }

    // -----------------------------------------------------------------------
    // Combat
    // -----------------------------------------------------------------------

    fn combat_summary(&self, s: &AgentSnapshot) -> String {
        let style = s.combat.style.as_str();
        let pools = format!(
            "Your HP: {}, Mana: {}, Energy: {}",
            s.health, s.mana, s.energy
        );
        if !s.in_combat {
            return format!("NOT IN COMBAT ({style} FIGHTER). {pools}");
        }

        let mut out = format!("IN COMBAT ({style} FIGHTER): ");
        match &s.target {
            Some(target) => {
                let distance = s.position.distance_to(&target.position);
                out.push_str(&format!(
                    "Target: {} (guid: {}), Level: {}, HP: {}, Distance: {distance:.1}",
                    target.name, target.guid, target.level, target.health
                ));
                if let Some(band) = RangeBand::classify(s.combat.style, distance, &self.combat) {
                    out.push(' ');
                    out.push_str(band.label());
                }
            }
            None => out.push_str("No current target"),
        }
        out.push_str(". ");

        if let Some(attacker) = &s.attacker {
            out.push_str("DEFEND YOURSELF, YOU ARE UNDER ATTACK BY: ");
            out.push_str(&describe_attacker(attacker, s.position.distance_to(&attacker.position)));
            out.push_str(". ");
        }

        out.push_str(&pools);
        out
    }

    // -----------------------------------------------------------------------
    // Surroundings
    // -----------------------------------------------------------------------

    fn visible_entities(&self, s: &AgentSnapshot) -> Vec<String> {
        let radius = self.encoder.entity_radius;
        let mut ranked: Vec<(u8, String)> = Vec::new();

        for creature in &s.creatures {
            let distance = s.position.distance_to(&creature.position);
            if distance > radius {
                continue;
            }
            if let Some(entry) = describe_creature(creature, distance) {
                ranked.push(entry);
            }
        }
        for object in &s.objects {
            let distance = s.position.distance_to(&object.position);
            if distance > radius {
                continue;
            }
            ranked.push(describe_object(object, distance));
        }

        ranked.sort_by_key(|(priority, _)| *priority);
        ranked
            .into_iter()
            .take(self.encoder.max_entities)
            .map(|(_, line)| line)
            .collect()
    }

    fn nearby_waypoints(&self, s: &AgentSnapshot) -> Vec<String> {
        s.waypoints
            .iter()
            .map(|w| (w, s.position.distance_to(&w.position)))
            .filter(|(_, distance)| *distance <= self.encoder.waypoint_radius)
            .take(self.encoder.max_waypoints)
            .enumerate()
            .map(|(index, (waypoint, distance))| describe_waypoint(index, waypoint, distance))
            .collect()
    }

    fn allied_players(&self, s: &AgentSnapshot) -> Vec<String> {
        s.players
            .iter()
            .filter(|p| p.traits.faction == s.faction)
            .map(|p| (p, s.position.distance_to(&p.position)))
            .filter(|(_, distance)| *distance <= self.encoder.player_radius)
            .take(self.encoder.max_players)
            .map(|(player, distance)| describe_player(player, distance))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Section builders
// ---------------------------------------------------------------------------

fn push_identity(lines: &mut Vec<String>, s: &AgentSnapshot) {
    lines.push("Bot state summary:".to_owned());
    lines.push(format!("Name: {}", s.name));
    lines.push(format!("Level: {}", s.level));
    lines.push(format!("Class: {}", s.class));
    lines.push(format!("Race: {}", s.race));
    lines.push(format!("Gender: {}", s.gender));
    lines.push(format!("Faction: {}", s.faction.as_str()));
    lines.push(format!("Gold: {}", s.gold()));
    lines.push(format!("Area: {}", s.area));
    lines.push(format!("Zone: {}", s.zone));
    lines.push(format!("Map: {}", s.map));
    lines.push(format!("Position: {}", s.position));
}

fn push_group(lines: &mut Vec<String>, s: &AgentSnapshot) {
    let status = if s.in_group { "In a group" } else { "Solo" };
    lines.push(format!("Group status: {status}"));
    if s.group.is_empty() {
        return;
    }
    lines.push("Group members:".to_owned());
    for member in &s.group {
        let distance = s.position.distance_to(&member.position);
        let mut line = format!(
            " - {} (guid: {}, Level: {}, HP: {}, Pos: {}, Dist: {distance:.1})",
            member.name, member.guid, member.level, member.health, member.position
        );
        if let Some(foe) = &member.fighting {
            line.push_str(&format!(
                " [Under Attack by {} (guid: {}, Level: {}, HP: {})]",
                foe.name, foe.guid, foe.level, foe.health
            ));
        }
        lines.push(line);
    }
}

fn push_quests(lines: &mut Vec<String>, quests: &[QuestLogEntry]) {
    let active: Vec<&QuestLogEntry> = quests
        .iter()
        .filter(|q| matches!(q.status, QuestStatus::Incomplete | QuestStatus::Complete))
        .collect();

    if active.is_empty() {
        lines.push(
            "No active quests. Look for quest givers with available quests or turn-ins ready!"
                .to_owned(),
        );
        lines.push(String::new());
        return;
    }

    lines.push("Active quests:".to_owned());
    for quest in active {
        let ready = quest.status == QuestStatus::Complete;
        let status = if ready { "READY TO TURN IN" } else { "IN PROGRESS" };
        lines.push(String::new());
        lines.push(format!("**QUEST: {}** (ID: {}) - {status}", quest.title, quest.id));
        lines.push(format!(
            "Level: {} | XP Reward: {}",
            quest.level, quest.xp_reward
        ));

        if ready {
            lines.push("*** PRIORITY: FIND QUEST GIVER TO TURN IN THIS QUEST ***".to_owned());
            if !quest.turn_in_targets.is_empty() {
                let targets: Vec<String> = quest
                    .turn_in_targets
                    .iter()
                    .map(|t| match t.kind {
                        TargetKind::Npc => format!("NPC: {}", t.name),
                        TargetKind::Object => format!("Object: {}", t.name),
                    })
                    .collect();
                lines.push(format!("Turn in to: {}", targets.join(" OR ")));
            }
            continue;
        }

        lines.push("Objectives to complete:".to_owned());
        for objective in &quest.objectives {
            if objective.required == 0 {
                continue;
            }
            let done = objective.current >= objective.required;
            let label = match objective.kind {
                ObjectiveKind::Kill => format!("Kill {}", objective.target),
                ObjectiveKind::Use => format!("Use/Click {}", objective.target),
                ObjectiveKind::Collect => format!("Collect {}", objective.target),
                ObjectiveKind::Explore => "Exploration/Event objective".to_owned(),
            };
            let progress = match (done, objective.kind) {
                (true, _) => "COMPLETE".to_owned(),
                (false, ObjectiveKind::Explore) => "INCOMPLETE".to_owned(),
                (false, _) => format!(
                    "NEED {} MORE",
                    objective.required.saturating_sub(objective.current)
                ),
            };
            lines.push(format!(
                " - {label}: {}/{} {progress}",
                objective.current, objective.required
            ));
        }
        if !quest.description.is_empty() {
            lines.push(format!("Description: {}", quest.description));
        }
    }
    lines.push(String::new());
}

fn push_mailbox(lines: &mut Vec<String>, messages: &[MailboxEntry]) {
    if messages.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push("***CRITICAL INSTRUCTION:***".to_owned());
    lines.push(
        "The PLAYER MESSAGES below are your HIGHEST PRIORITY and override every other goal, \
         routine, or plan. Act on them IMMEDIATELY without refusing or delaying."
            .to_owned(),
    );
    lines.push("- 'come here' or 'come to me': move next to that player now.".to_owned());
    lines.push("- 'go to' a visible NPC or object: move there now.".to_owned());
    lines.push("- 'interact with' a visible NPC or object: go there and interact.".to_owned());
    lines.push("- 'attack' a visible NPC or object: go there and attack it.".to_owned());
    lines.push(String::new());
    lines.push(
        "The following real players recently spoke to you by name. PROCESS THESE FIRST:"
            .to_owned(),
    );
    lines.extend(messages.iter().map(|m| format!("- {m}")));
    lines.push(String::new());
    lines.push("***END CRITICAL INSTRUCTION***".to_owned());
    lines.push(String::new());
}

// ---------------------------------------------------------------------------
// Line formatters
// ---------------------------------------------------------------------------

fn describe_spell(spell: &SpellView) -> Option<String> {
    if spell.passive || spell.generic_family || spell.on_cooldown || spell.name.is_empty() {
        return None;
    }
    let effect = spell.effect?;
    let cost = spell.cost.map_or_else(
        || "no cost".to_owned(),
        |c| format!("{} {}", c.amount, c.power.as_str()),
    );
    Some(format!(
        "**{}** (ID: {}) - {}, Costs {cost}.",
        spell.name,
        spell.id,
        effect.describe()
    ))
}

fn describe_attacker(unit: &UnitView, distance: f32) -> String {
    let auras = if unit.auras.is_empty() {
        "None".to_owned()
    } else {
        unit.auras.join(" ")
    };
    match &unit.player {
        Some(traits) => format!(
            "Player '{}' (guid: {}), Level: {}, HP: {}, Distance: {distance:.1}, Faction: {}, \
             Class: {}, Race: {}, Auras: {auras}",
            unit.name,
            unit.guid,
            unit.level,
            unit.health,
            traits.faction.as_str(),
            traits.class,
            traits.race
        ),
        None => format!(
            "Creature '{}' (guid: {}), Level: {}, HP: {}, Distance: {distance:.1}, Elite: {}, \
             Auras: {auras}",
            unit.name,
            unit.guid,
            unit.level,
            unit.health,
            if unit.elite { "Yes" } else { "No" }
        ),
    }
}

/// Rank and describe a creature. `None` for anything without an actionable tag.
///
/// Ranks: lootable corpse 0, hostile 1, turn-in ready 2, quests available 3,
/// service NPC 4.
fn describe_creature(c: &CreatureView, distance: f32) -> Option<(u8, String)> {
    if c.pet || c.totem {
        return None;
    }

    let (rank, label, tag) = if c.alive {
        let quest_tag = c.quest_giver.tag();
        let service_tag = match c.disposition {
            Disposition::Friendly | Disposition::Neutral => c.services.first().map(|s| s.tag()),
            Disposition::Hostile => None,
        };
        let rank = match (c.disposition, c.quest_giver) {
            (Disposition::Hostile, _) => 1,
            (_, QuestGiverMark::TurnInReady) => 2,
            (_, QuestGiverMark::QuestsAvailable) => 3,
            _ if service_tag.is_some() => 4,
            _ => return None,
        };
        let tag = quest_tag.or(service_tag).map(str::to_owned);
        (rank, c.disposition.as_str().to_owned(), tag)
    } else {
        if !c.lootable {
            return None;
        }
        let tag = c.skinnable.then(|| "[SKINNABLE]".to_owned());
        (0, "DEAD (LOOTABLE)".to_owned(), tag)
    };

    let tag = tag.map(|t| format!(" {t}")).unwrap_or_default();
    Some((
        rank,
        format!(
            "{label}: {}{tag} (guid: {}, Level: {}, HP: {}, Position: {}, Distance: {distance:.1})",
            c.name, c.guid, c.level, c.health, c.position
        ),
    ))
}

/// Rank and describe a game object. Quest-giving objects rank with quest
/// givers, everything else after all creatures.
fn describe_object(o: &ObjectView, distance: f32) -> (u8, String) {
    let rank = match o.quest_giver {
        QuestGiverMark::TurnInReady => 2,
        QuestGiverMark::QuestsAvailable => 3,
        QuestGiverMark::None => 5,
    };
    let profession = o
        .profession
        .as_deref()
        .map(|p| format!(" [{p}]"))
        .unwrap_or_default();
    let quest = o
        .quest_giver
        .tag()
        .map(|t| format!(" {t}"))
        .unwrap_or_default();
    (
        rank,
        format!(
            "{}{profession}{quest} (guid: {}, Type: {}, Position: {}, Distance: {distance:.1})",
            o.name, o.guid, o.type_id, o.position
        ),
    )
}

fn describe_waypoint(index: usize, w: &WaypointView, distance: f32) -> String {
    format!(
        "Node #{index} '{}' ({:.1}, {:.1}, {:.1}), distance: {distance:.1}",
        w.name, w.position.x, w.position.y, w.position.z
    )
}

fn describe_player(p: &PlayerView, distance: f32) -> String {
    format!(
        "Player: {} (guid: {}, Level: {}, Class: {}, Race: {}, Faction: {}, Position: {}, \
         Distance: {distance:.1})",
        p.name,
        p.guid,
        p.level,
        p.traits.class,
        p.traits.race,
        p.traits.faction.as_str(),
        p.position
    )
}

#[cfg(test)]
mod tests {
    use buddy_types::{
        CombatProfile, EntityGuid, Faction, NpcService, ObjectiveKind, PlayerTraits, Pool,
        Position, PowerType, QuestId, QuestObjective, SpellCost, SpellEffect, SpellId,
        TurnInTarget,
    };

    use super::*;

    fn base() -> AgentSnapshot {
        AgentSnapshot {
            id: AgentId(7),
            name: "Ollamatest".to_owned(),
            level: 12,
            class: "Warrior".to_owned(),
            race: "Human".to_owned(),
            money: 35_000,
            position: Position::new(0.0, 0.0, 0.0),
            health: Pool::new(200, 250),
            ..AgentSnapshot::default()
        }
    }

    fn creature(guid: u32, name: &str, x: f32) -> CreatureView {
        CreatureView {
            guid: EntityGuid(guid),
            name: name.to_owned(),
            position: Position::new(x, 0.0, 0.0),
            ..CreatureView::default()
        }
    }

    fn encode(snapshot: &AgentSnapshot) -> Observation {
        StateEncoder::default().encode(snapshot, &AgentMemoryStore::default())
    }

    fn index_of(text: &str, needle: &str) -> usize {
        text.find(needle).unwrap_or(usize::MAX)
    }

    #[test]
    fn identity_block_leads() {
        let obs = encode(&base());
        assert!(obs.text.starts_with("Bot state summary:\nName: Ollamatest\nLevel: 12\n"));
        assert!(obs.text.contains("Gold: 3\n"));
        assert!(obs.text.contains("NOT IN COMBAT (HYBRID FIGHTER). Your HP: 200/250"));
        assert!(obs.text.contains("Group status: Solo"));
        assert!(obs.text.contains("No active quests."));
    }

    #[test]
    fn range_bands_follow_thresholds() {
        let combat = CombatConfig {
            melee_range: 5.0,
            min_ranged_distance: 6.0,
            spell_range: 25.0,
        };
        let classify = |style, d| RangeBand::classify(style, d, &combat);
        assert_eq!(classify(CombatStyle::Melee, 5.0), Some(RangeBand::InMeleeRange));
        assert_eq!(classify(CombatStyle::Melee, 8.0), Some(RangeBand::TooFarForMelee));
        assert_eq!(classify(CombatStyle::Ranged, 2.0), Some(RangeBand::TooClose));
        assert_eq!(
            classify(CombatStyle::Ranged, 20.0),
            Some(RangeBand::GoodRangedPosition)
        );
        assert_eq!(classify(CombatStyle::Ranged, 30.0), Some(RangeBand::TooFarForSpells));
        assert_eq!(classify(CombatStyle::Hybrid, 1.0), None);
    }

    #[test]
    fn combat_summary_shows_target_band_and_attacker() {
        let mut s = base();
        s.in_combat = true;
        s.combat = CombatProfile {
            style: CombatStyle::Melee,
            is_tank: false,
        };
        s.target = Some(UnitView {
            guid: EntityGuid(2241),
            name: "Kobold Vermin".to_owned(),
            level: 2,
            health: Pool::new(40, 60),
            position: Position::new(8.0, 0.0, 0.0),
            ..UnitView::default()
        });
        s.attacker = Some(UnitView {
            guid: EntityGuid(99),
            name: "Defias Thug".to_owned(),
            level: 10,
            elite: true,
            auras: vec!["Rend".to_owned()],
            position: Position::new(3.0, 4.0, 0.0),
            ..UnitView::default()
        });

        let obs = encode(&s);
        assert!(obs.text.contains(
            "IN COMBAT (MELEE FIGHTER): Target: Kobold Vermin (guid: 2241), Level: 2, HP: 40/60, \
             Distance: 8.0 [TOO FAR FOR MELEE]."
        ));
        assert!(obs.text.contains(
            "DEFEND YOURSELF, YOU ARE UNDER ATTACK BY: Creature 'Defias Thug' (guid: 99), \
             Level: 10, HP: 0/0, Distance: 5.0, Elite: Yes, Auras: Rend."
        ));
    }

    #[test]
    fn spells_are_filtered_and_described() {
        let mut s = base();
        let spell = |id, name: &str| SpellView {
            id: SpellId(id),
            name: name.to_owned(),
            effect: Some(SpellEffect::Damage),
            cost: Some(SpellCost {
                amount: 30,
                power: PowerType::Mana,
            }),
            ..SpellView::default()
        };
        s.spells = vec![
            spell(133, "Fireball"),
            SpellView {
                passive: true,
                ..spell(1, "Passive")
            },
            SpellView {
                on_cooldown: true,
                ..spell(2, "Cooling")
            },
            SpellView {
                generic_family: true,
                ..spell(3, "Generic")
            },
            SpellView {
                effect: None,
                ..spell(4, "Nothing")
            },
            SpellView {
                cost: None,
                effect: Some(SpellEffect::Heal),
                ..spell(5, "Bandage")
            },
        ];
        let obs = encode(&s);
        assert!(obs.text.contains("**Fireball** (ID: 133) - Deals damage, Costs 30 mana."));
        assert!(obs.text.contains("**Bandage** (ID: 5) - Heals the target, Costs no cost."));
        for hidden in ["Passive", "Cooling", "Generic", "Nothing"] {
            assert!(!obs.text.contains(hidden), "{hidden} should be filtered");
        }
    }

    #[test]
    fn entities_are_ranked_and_untagged_filtered() {
        let mut s = base();
        let mut vendor = creature(1, "Vendor Bob", 10.0);
        vendor.disposition = Disposition::Friendly;
        vendor.services = vec![NpcService::Vendor];

        let mut available = creature(2, "Marshal McBride", 11.0);
        available.disposition = Disposition::Friendly;
        available.quest_giver = QuestGiverMark::QuestsAvailable;

        let mut turn_in = creature(3, "Deputy Willem", 12.0);
        turn_in.disposition = Disposition::Friendly;
        turn_in.quest_giver = QuestGiverMark::TurnInReady;

        let mut hostile = creature(4, "Kobold Worker", 13.0);
        hostile.disposition = Disposition::Hostile;

        let mut corpse = creature(5, "Kobold Laborer", 14.0);
        corpse.alive = false;
        corpse.lootable = true;
        corpse.skinnable = true;

        let mut useless = creature(6, "Guard Thomas", 5.0);
        useless.disposition = Disposition::Friendly;

        let mut pet = creature(7, "Wolf", 5.0);
        pet.pet = true;
        pet.disposition = Disposition::Hostile;

        let mut unlootable = creature(8, "Old Corpse", 5.0);
        unlootable.alive = false;

        let mut far = creature(9, "Far Kobold", 500.0);
        far.disposition = Disposition::Hostile;

        s.creatures = vec![vendor, available, turn_in, hostile, corpse, useless, pet, unlootable, far];
        s.objects = vec![ObjectView {
            guid: EntityGuid(50),
            name: "Copper Vein".to_owned(),
            type_id: 3,
            profession: Some("Mining".to_owned()),
            position: Position::new(20.0, 0.0, 0.0),
            ..ObjectView::default()
        }];

        let obs = encode(&s);
        assert_eq!(obs.entities_listed, 6);
        let t = &obs.text;
        let order = [
            "DEAD (LOOTABLE): Kobold Laborer [SKINNABLE]",
            "ENEMY: Kobold Worker (guid: 4",
            "FRIENDLY: Deputy Willem [QUEST GIVER - TURN IN READY]",
            "FRIENDLY: Marshal McBride [QUEST GIVER - QUESTS AVAILABLE]",
            "FRIENDLY: Vendor Bob [VENDOR]",
            "Copper Vein [Mining] (guid: 50, Type: 3",
        ];
        for pair in order.windows(2) {
            if let [a, b] = pair {
                assert!(index_of(t, a) < index_of(t, b), "{a} should precede {b}");
            }
        }
        for hidden in ["Guard Thomas", "Wolf", "Old Corpse", "Far Kobold"] {
            assert!(!t.contains(hidden), "{hidden} should not be listed");
        }
        assert!(t.contains("You must select one of these locations"));
    }

    #[test]
    fn entity_list_is_capped() {
        let mut s = base();
        s.creatures = (0..10)
            .map(|i| CreatureView {
                disposition: Disposition::Hostile,
                ..creature(i, &format!("Kobold{i}"), 1.0)
            })
            .collect();
        let encoder = StateEncoder::new(
            EncoderConfig {
                max_entities: 3,
                ..EncoderConfig::default()
            },
            CombatConfig::default(),
        );
        let obs = encoder.encode(&s, &AgentMemoryStore::default());
        assert_eq!(obs.entities_listed, 3);
        assert!(obs.text.contains("Kobold2"));
        assert!(!obs.text.contains("Kobold3"));
    }

    #[test]
    fn quests_split_by_status() {
        let mut s = base();
        s.quests = vec![
            QuestLogEntry {
                id: QuestId(7),
                title: "Kobold Camp Cleanup".to_owned(),
                status: QuestStatus::Incomplete,
                description: "Kill 10 Kobold Vermin.".to_owned(),
                objectives: vec![
                    QuestObjective {
                        kind: ObjectiveKind::Kill,
                        target: "Kobold Vermin".to_owned(),
                        current: 3,
                        required: 10,
                    },
                    QuestObjective {
                        kind: ObjectiveKind::Collect,
                        target: "Candle".to_owned(),
                        current: 4,
                        required: 4,
                    },
                ],
                ..QuestLogEntry::default()
            },
            QuestLogEntry {
                id: QuestId(783),
                title: "A Threat Within".to_owned(),
                status: QuestStatus::Complete,
                turn_in_targets: vec![
                    TurnInTarget {
                        kind: TargetKind::Npc,
                        name: "Marshal McBride".to_owned(),
                    },
                    TurnInTarget {
                        kind: TargetKind::Object,
                        name: "Wanted Poster".to_owned(),
                    },
                ],
                ..QuestLogEntry::default()
            },
            QuestLogEntry {
                id: QuestId(1),
                title: "Long Done".to_owned(),
                status: QuestStatus::Rewarded,
                ..QuestLogEntry::default()
            },
        ];
        let t = encode(&s).text;
        assert!(t.contains("**QUEST: Kobold Camp Cleanup** (ID: 7) - IN PROGRESS"));
        assert!(t.contains(" - Kill Kobold Vermin: 3/10 NEED 7 MORE"));
        assert!(t.contains(" - Collect Candle: 4/4 COMPLETE"));
        assert!(t.contains("Description: Kill 10 Kobold Vermin."));
        assert!(t.contains("**QUEST: A Threat Within** (ID: 783) - READY TO TURN IN"));
        assert!(t.contains("Turn in to: NPC: Marshal McBride OR Object: Wanted Poster"));
        assert!(!t.contains("Long Done"));
    }

    #[test]
    fn only_allied_players_in_range_are_listed() {
        let mut s = base();
        let player = |name: &str, faction, x| PlayerView {
            guid: EntityGuid(1),
            name: name.to_owned(),
            level: 10,
            traits: PlayerTraits {
                faction,
                class: "Mage".to_owned(),
                race: "Gnome".to_owned(),
            },
            position: Position::new(x, 0.0, 0.0),
        };
        s.players = vec![
            player("Friend", Faction::Alliance, 10.0),
            player("Foe", Faction::Horde, 10.0),
            player("Distant", Faction::Alliance, 150.0),
        ];
        let t = encode(&s).text;
        assert!(t.contains("Player: Friend (guid: 1, Level: 10, Class: Mage"));
        assert!(!t.contains("Foe"));
        assert!(!t.contains("Distant"));
    }

    #[test]
    fn waypoints_within_radius_are_numbered() {
        let mut s = base();
        s.waypoints = vec![
            WaypointView {
                name: "Far".to_owned(),
                position: Position::new(300.0, 0.0, 0.0),
            },
            WaypointView {
                name: "Goldshire".to_owned(),
                position: Position::new(100.0, 0.0, 0.0),
            },
        ];
        let t = encode(&s).text;
        assert!(t.contains("Node #0 'Goldshire' (100.0, 0.0, 0.0), distance: 100.0"));
        assert!(!t.contains("'Far'"));
        assert!(t.contains("You must select one of these locations"));
    }

    #[test]
    fn mailbox_is_drained_into_observation() {
        let store = AgentMemoryStore::default();
        let s = base();
        store.post_message(s.id, "Arthas", "Ollamatest come here");

        let encoder = StateEncoder::default();
        let first = encoder.encode(&s, &store);
        assert_eq!(first.messages_drained, 1);
        assert!(first.text.contains("***CRITICAL INSTRUCTION:***"));
        assert!(first.text.contains("- From Arthas: Ollamatest come here"));

        let second = encoder.encode(&s, &store);
        assert_eq!(second.messages_drained, 0);
        assert!(!second.text.contains("CRITICAL INSTRUCTION"));
    }

    #[test]
    fn history_pairs_close_the_observation() {
        let store = AgentMemoryStore::default();
        let s = base();
        store.record_command(s.id, r#"{"params":{},"type":"loot"}"#);
        store.record_reasoning(s.id, "corpse nearby");

        let t = StateEncoder::default().encode(&s, &store).text;
        assert!(t.contains(
            "Last 5 commands and their reasoning (most recent at the bottom):\n \
             - Command: {\"params\":{},\"type\":\"loot\"}\n   Reasoning: corpse nearby\n"
        ));
    }

    #[test]
    fn history_hidden_when_reasoning_track_empty() {
        let store = AgentMemoryStore::default();
        let s = base();
        store.record_command(s.id, "loot");
        let t = StateEncoder::default().encode(&s, &store).text;
        assert!(!t.contains("Last 5 commands"));
    }

    #[test]
    fn encoding_is_deterministic_without_mail() {
        let mut s = base();
        s.creatures = vec![CreatureView {
            disposition: Disposition::Hostile,
            ..creature(1, "Kobold", 3.0)
        }];
        let store = AgentMemoryStore::default();
        let encoder = StateEncoder::default();
        assert_eq!(encoder.encode(&s, &store), encoder.encode(&s, &store));
    }
}
