//! The closed command vocabulary an agent can execute.
//!
//! A [`Command`] is produced either by decoding a language-model reply or by
//! parsing a manual control string, and is consumed exactly once by the
//! dispatcher. The wire form is the `command` object of the reply schema:
//!
//! ```text
//! {"type": "spell", "params": {"spellid": 133, "guid": 2241}}
//! ```

use serde::{Deserialize, Serialize};

use crate::ids::{EntityGuid, QuestId, SpellId};

// ---------------------------------------------------------------------------
// Command type tags
// ---------------------------------------------------------------------------

/// The wire tag of a command. Exactly nine values are recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    /// Walk to a world coordinate.
    MoveTo,
    /// Engage a creature or player.
    Attack,
    /// Talk to a creature or use a game object.
    Interact,
    /// Cast a known ability, optionally on a target.
    #[serde(rename = "spell")]
    Spell,
    /// Loot nearby corpses.
    Loot,
    /// Accept a quest by id.
    AcceptQuest,
    /// Turn in a completed quest by id.
    TurnInQuest,
    /// Follow the group leader or master.
    Follow,
    /// Stop moving and stay in place.
    Stop,
}

impl CommandType {
    /// Every recognised command type, in schema order.
    pub const ALL: [Self; 9] = [
        Self::MoveTo,
        Self::Attack,
        Self::Interact,
        Self::Spell,
        Self::Loot,
        Self::AcceptQuest,
        Self::TurnInQuest,
        Self::Follow,
        Self::Stop,
    ];

    /// The tag used in the `command.type` field.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MoveTo => "move_to",
            Self::Attack => "attack",
            Self::Interact => "interact",
            Self::Spell => "spell",
            Self::Loot => "loot",
            Self::AcceptQuest => "accept_quest",
            Self::TurnInQuest => "turn_in_quest",
            Self::Follow => "follow",
            Self::Stop => "stop",
        }
    }

    /// Look up a command type by its wire tag. Matching is exact.
    pub fn from_wire(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl core::fmt::Display for CommandType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A decoded, schema-validated command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Move to the given world coordinate.
    MoveTo {
        /// World X coordinate.
        x: f32,
        /// World Y coordinate.
        y: f32,
        /// World Z coordinate.
        z: f32,
    },
    /// Attack the unit with this low GUID.
    Attack {
        /// Creature or player to engage.
        target: EntityGuid,
    },
    /// Interact with the creature or game object with this low GUID.
    Interact {
        /// Creature or game object to interact with.
        target: EntityGuid,
    },
    /// Cast a spell, on a target when one is given, otherwise on self.
    CastSpell {
        /// Spell to cast.
        spell: SpellId,
        /// Optional target unit.
        target: Option<EntityGuid>,
    },
    /// Loot nearby lootable corpses.
    Loot,
    /// Accept a quest.
    AcceptQuest {
        /// Quest to accept.
        quest: QuestId,
    },
    /// Turn in a completed quest.
    TurnInQuest {
        /// Quest to turn in.
        quest: QuestId,
    },
    /// Follow the master.
    Follow,
    /// Stop and stay in place.
    Stop,
}

impl Command {
    /// The wire tag for this command.
    pub const fn command_type(&self) -> CommandType {
        match self {
            Self::MoveTo { .. } => CommandType::MoveTo,
            Self::Attack { .. } => CommandType::Attack,
            Self::Interact { .. } => CommandType::Interact,
            Self::CastSpell { .. } => CommandType::Spell,
            Self::Loot => CommandType::Loot,
            Self::AcceptQuest { .. } => CommandType::AcceptQuest,
            Self::TurnInQuest { .. } => CommandType::TurnInQuest,
            Self::Follow => CommandType::Follow,
            Self::Stop => CommandType::Stop,
        }
    }

    /// Encode this command as the `command` object of the reply schema.
    pub fn to_wire(&self) -> serde_json::Value {
        let params = match *self {
            Self::MoveTo { x, y, z } => serde_json::json!({ "x": x, "y": y, "z": z }),
            Self::Attack { target } | Self::Interact { target } => {
                serde_json::json!({ "guid": target })
            }
            Self::CastSpell { spell, target } => match target {
                Some(guid) => serde_json::json!({ "spellid": spell, "guid": guid }),
                None => serde_json::json!({ "spellid": spell }),
            },
            Self::AcceptQuest { quest } | Self::TurnInQuest { quest } => {
                serde_json::json!({ "id": quest })
            }
            Self::Loot | Self::Follow | Self::Stop => serde_json::json!({}),
        };
        serde_json::json!({
            "type": self.command_type().as_str(),
            "params": params,
        })
    }
}

/// Formats the command in manual control syntax (`move to 1 2 3`,
/// `spell 133 2241`), which the text command parser accepts back.
impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MoveTo { x, y, z } => write!(f, "move to {x} {y} {z}"),
            Self::Attack { target } => write!(f, "attack {target}"),
            Self::Interact { target } => write!(f, "interact {target}"),
            Self::CastSpell {
                spell,
                target: Some(target),
            } => write!(f, "spell {spell} {target}"),
            Self::CastSpell { spell, target: None } => write!(f, "spell {spell}"),
            Self::Loot => f.write_str("loot"),
            Self::AcceptQuest { quest } => write!(f, "acceptquest {quest}"),
            Self::TurnInQuest { quest } => write!(f, "turninquest {quest}"),
            Self::Follow => f.write_str("follow"),
            Self::Stop => f.write_str("stop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tags_round_trip() {
        for t in CommandType::ALL {
            assert_eq!(CommandType::from_wire(t.as_str()), Some(t));
        }
        assert_eq!(CommandType::from_wire("Attack"), None);
        assert_eq!(CommandType::from_wire("cast"), None);
    }

    #[test]
    fn serde_tag_matches_as_str() {
        let json = serde_json::to_string(&CommandType::Spell).ok();
        assert_eq!(json.as_deref(), Some("\"spell\""));
        let json = serde_json::to_string(&CommandType::TurnInQuest).ok();
        assert_eq!(json.as_deref(), Some("\"turn_in_quest\""));
    }

    #[test]
    fn spell_without_target_omits_guid() {
        let wire = Command::CastSpell {
            spell: SpellId(133),
            target: None,
        }
        .to_wire();
        let params = wire.get("params").cloned().unwrap_or_default();
        assert_eq!(wire.get("type").and_then(|t| t.as_str()), Some("spell"));
        assert_eq!(params.get("spellid").and_then(serde_json::Value::as_u64), Some(133));
        assert!(params.get("guid").is_none());
    }

    #[test]
    fn display_uses_control_syntax() {
        let cmd = Command::MoveTo {
            x: -9347.5,
            y: 256.25,
            z: 65.0,
        };
        assert_eq!(cmd.to_string(), "move to -9347.5 256.25 65");
        assert_eq!(
            Command::CastSpell {
                spell: SpellId(133),
                target: Some(EntityGuid(9)),
            }
            .to_string(),
            "spell 133 9"
        );
        assert_eq!(
            Command::TurnInQuest { quest: QuestId(5) }.to_string(),
            "turninquest 5"
        );
    }
}
