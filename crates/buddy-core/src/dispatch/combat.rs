//! Attack and spell-cast chains.
//!
//! Positioning (`reach melee`, `reach spell`, `flee`) always runs before any
//! damage tier, and a failed positioning step does not end the chain.

use buddy_types::{AgentId, CombatStyle, EntityGuid, Position, SpellId};
use tracing::debug;

use super::Dispatcher;
use crate::capability::{Capability, GameWorld, MovementIntent, UnitRef};

impl<W: GameWorld> Dispatcher<W> {
    /// Attack a unit by low GUID.
    ///
    /// Fails only when the unit cannot be resolved or is out of sight; once
    /// a target is selected the manual fallback always reports success.
    pub(super) fn attack(&self, agent: AgentId, target: EntityGuid) -> bool {
        let Some(unit) = self.world.resolve_unit(agent, target) else {
            debug!(agent_id = %agent, target = %target, "attack target not found");
            return false;
        };
        if !self.world.in_line_of_sight(agent, target) {
            debug!(agent_id = %agent, target = %target, "attack target out of sight");
            return false;
        }

        self.world.set_selection(agent, target);
        let profile = self.world.combat_profile(agent).unwrap_or_default();
        let distance = self.distance_to(agent, unit.position);
        let assist = if profile.is_tank {
            Capability::TankAssist
        } else {
            Capability::DpsAssist
        };

        let tiers = match profile.style {
            CombatStyle::Melee => {
                if distance > self.combat.melee_range {
                    self.act(agent, Capability::ReachMelee, &unit.name);
                }
                vec![assist, Capability::Melee]
            }
            CombatStyle::Ranged => {
                self.position_ranged(agent, &unit, distance, self.combat.spell_range);
                vec![assist, Capability::Shoot, Capability::CastCombatSpell]
            }
            CombatStyle::Hybrid => vec![Capability::AttackMyTarget],
        };

        if tiers.iter().any(|&tier| self.act(agent, tier, &unit.name)) {
            return true;
        }

        debug!(agent_id = %agent, target = %target, "damage tiers refused, manual fallback");
        let intent = match profile.style {
            CombatStyle::Ranged => MovementIntent::KeepDistance {
                target,
                distance: self.combat.min_ranged_distance,
            },
            CombatStyle::Melee | CombatStyle::Hybrid => MovementIntent::Chase {
                target,
                distance: self.combat.melee_range,
            },
        };
        self.world.set_selection(agent, target);
        self.world.face(agent, target);
        self.world.set_movement(agent, intent);
        true
    }

    /// Cast a known spell, on a target when one is given.
    pub(super) fn cast_spell(
        &self,
        agent: AgentId,
        spell: SpellId,
        target: Option<EntityGuid>,
    ) -> bool {
        let Some(info) = self.world.known_spell(agent, spell) else {
            debug!(agent_id = %agent, spell = %spell, "spell not known");
            return false;
        };

        let Some(target) = target else {
            return self.invoke(agent, &info.name, "")
                || self.act(agent, Capability::CastCustomSpell, &spell.to_string());
        };

        let Some(unit) = self.world.resolve_unit(agent, target) else {
            debug!(agent_id = %agent, target = %target, "spell target not found");
            return false;
        };
        self.world.set_selection(agent, target);

        let distance = self.distance_to(agent, unit.position);
        if info.max_range <= self.combat.melee_range {
            if distance > self.combat.melee_range {
                self.act(agent, Capability::ReachMelee, &unit.name);
            }
        } else {
            let range = if info.max_range > 0.0 {
                info.max_range
            } else {
                self.combat.spell_range
            };
            let ranged = self
                .world
                .combat_profile(agent)
                .is_some_and(|p| p.style == CombatStyle::Ranged);
            if ranged {
                self.position_ranged(agent, &unit, distance, range);
            } else if distance > range {
                debug!(
                    agent_id = %agent,
                    spell = %spell,
                    distance,
                    range,
                    "spell target out of range, closing in"
                );
                if !self.act(agent, Capability::ReachSpell, &unit.name) {
                    debug!(agent_id = %agent, spell = %spell, "reach spell refused, casting anyway");
                }
            }
        }

        self.invoke(agent, &info.name, &unit.name)
            || self.act(
                agent,
                Capability::CastCustomSpell,
                &format!("{spell} on {}", unit.name),
            )
    }

    /// Back away when too close, close in when beyond `range`.
    fn position_ranged(&self, agent: AgentId, unit: &UnitRef, distance: f32, range: f32) {
        if distance < self.combat.min_ranged_distance {
            self.act(agent, Capability::Flee, &unit.name);
        } else if distance > range {
            self.act(agent, Capability::ReachSpell, &unit.name);
        }
    }

    fn distance_to(&self, agent: AgentId, position: Position) -> f32 {
        self.world
            .agent_position(agent)
            .map_or(f32::MAX, |me| me.distance_to(&position))
    }
}
