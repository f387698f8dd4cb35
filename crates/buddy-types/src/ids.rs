//! Strongly-typed identifier wrappers.
//!
//! Game-side identifiers are plain integers handed out by the game server:
//! agents are keyed by their full 64-bit GUID, while creatures, game objects
//! and players are addressed by the low GUID counter that also appears in
//! observations and in decoded commands. Wrapping them prevents a quest id
//! from being passed where a spell id is expected.
//!
//! Decision cycles are identified by a UUID v7 so that echoed records sort by
//! creation time.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Generates a newtype wrapper around an integer identifier issued by the game.
macro_rules! define_game_id {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Return the raw integer value.
            pub const fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(raw: $inner) -> Self {
                Self(raw)
            }
        }

        impl core::str::FromStr for $name {
            type Err = core::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<$inner>().map(Self)
            }
        }
    };
}

define_id! {
    /// Unique identifier for one decision cycle (observation to dispatch).
    CycleId
}

define_game_id! {
    /// Raw 64-bit GUID of a managed agent. Keys all per-agent state.
    AgentId(u64)
}

define_game_id! {
    /// Low GUID counter of a creature, game object, or player in the agent's map.
    EntityGuid(u32)
}

define_game_id! {
    /// Identifier of a spell (ability) template.
    SpellId(u32)
}

define_game_id! {
    /// Identifier of a quest template.
    QuestId(u32)
}

define_game_id! {
    /// Identifier of an item template.
    ItemId(u32)
}
