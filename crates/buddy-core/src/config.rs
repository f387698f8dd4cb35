//! Configuration loading and typed config structures.
//!
//! The decision loop is tuned through a single YAML document (conventionally
//! `botbuddy.yaml`). Every section and every field is optional; missing
//! values fall back to the defaults below, so an empty file is a valid
//! configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration or scenario files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration of the decision loop.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BuddyConfig {
    /// Tick cadence, inference timeout, and which agents are managed.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// History ring-buffer sizing.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Observation radii and list caps.
    #[serde(default)]
    pub encoder: EncoderConfig,

    /// Range thresholds for combat positioning.
    #[serde(default)]
    pub combat: CombatConfig,

    /// Quest interaction parameters.
    #[serde(default)]
    pub quest: QuestConfig,

    /// Diagnostic switches.
    #[serde(default)]
    pub debug: DebugConfig,
}

impl BuddyConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchedulerConfig {
    /// Milliseconds between scheduling passes.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Upper bound on one inference call. Unset means wait indefinitely.
    #[serde(default)]
    pub inference_timeout_ms: Option<u64>,

    /// When non-empty, only agents with one of these names are managed.
    #[serde(default)]
    pub managed_names: Vec<String>,
}

impl SchedulerConfig {
    /// Tick interval as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Inference timeout as a [`Duration`], if configured.
    pub fn inference_timeout(&self) -> Option<Duration> {
        self.inference_timeout_ms.map(Duration::from_millis)
    }

    /// Whether an agent with this name falls under management.
    pub fn manages(&self, name: &str) -> bool {
        self.managed_names.is_empty() || self.managed_names.iter().any(|n| n == name)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            inference_timeout_ms: None,
            managed_names: Vec::new(),
        }
    }
}

/// History configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryConfig {
    /// Entries kept per agent on the command and reasoning tracks.
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

/// Observation encoder configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EncoderConfig {
    /// Creatures and objects further than this are not listed.
    #[serde(default = "default_entity_radius")]
    pub entity_radius: f32,

    /// Navigation nodes further than this are not listed.
    #[serde(default = "default_waypoint_radius")]
    pub waypoint_radius: f32,

    /// Players further than this are not listed.
    #[serde(default = "default_player_radius")]
    pub player_radius: f32,

    /// Maximum creatures plus objects listed.
    #[serde(default = "default_max_entities")]
    pub max_entities: usize,

    /// Maximum navigation nodes listed.
    #[serde(default = "default_max_waypoints")]
    pub max_waypoints: usize,

    /// Maximum players listed.
    #[serde(default = "default_max_players")]
    pub max_players: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            entity_radius: default_entity_radius(),
            waypoint_radius: default_waypoint_radius(),
            player_radius: default_player_radius(),
            max_entities: default_max_entities(),
            max_waypoints: default_max_waypoints(),
            max_players: default_max_players(),
        }
    }
}

/// Combat positioning thresholds, in yards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CombatConfig {
    /// A melee fighter further than this must close in first.
    #[serde(default = "default_melee_range")]
    pub melee_range: f32,

    /// A ranged fighter closer than this must back away first.
    #[serde(default = "default_min_ranged_distance")]
    pub min_ranged_distance: f32,

    /// A ranged fighter further than this must close in first.
    #[serde(default = "default_spell_range")]
    pub spell_range: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            melee_range: default_melee_range(),
            min_ranged_distance: default_min_ranged_distance(),
            spell_range: default_spell_range(),
        }
    }
}

/// Quest interaction configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuestConfig {
    /// Maximum distance at which a quest giver can be talked to.
    #[serde(default = "default_interaction_distance")]
    pub interaction_distance: f32,

    /// Keywords marking a gossip option as quest related.
    #[serde(default)]
    pub gossip_keywords: GossipKeywords,
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            interaction_distance: default_interaction_distance(),
            gossip_keywords: GossipKeywords::default(),
        }
    }
}

/// Keyword sets for spotting quest-related gossip options.
///
/// An option matches when its text contains any `case_sensitive` keyword
/// verbatim, or any `case_insensitive` keyword ignoring case.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GossipKeywords {
    /// Substrings matched exactly.
    #[serde(default = "default_case_sensitive_keywords")]
    pub case_sensitive: Vec<String>,

    /// Substrings matched ignoring case.
    #[serde(default)]
    pub case_insensitive: Vec<String>,
}

impl GossipKeywords {
    /// Whether a gossip option text mentions any keyword.
    pub fn matches(&self, text: &str) -> bool {
        if self
            .case_sensitive
            .iter()
            .any(|k| !k.is_empty() && text.contains(k.as_str()))
        {
            return true;
        }
        if self.case_insensitive.is_empty() {
            return false;
        }
        let lowered = text.to_lowercase();
        self.case_insensitive
            .iter()
            .any(|k| !k.is_empty() && lowered.contains(&k.to_lowercase()))
    }
}

impl Default for GossipKeywords {
    fn default() -> Self {
        Self {
            case_sensitive: default_case_sensitive_keywords(),
            case_insensitive: Vec::new(),
        }
    }
}

/// Diagnostic configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DebugConfig {
    /// Log every observation and raw reply at debug level.
    #[serde(default)]
    pub log_observations: bool,
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_history_capacity() -> usize {
    5
}

const fn default_entity_radius() -> f32 {
    100.0
}

const fn default_waypoint_radius() -> f32 {
    200.0
}

const fn default_player_radius() -> f32 {
    100.0
}

const fn default_max_entities() -> usize {
    40
}

const fn default_max_waypoints() -> usize {
    20
}

const fn default_max_players() -> usize {
    20
}

const fn default_melee_range() -> f32 {
    5.0
}

const fn default_min_ranged_distance() -> f32 {
    5.0
}

const fn default_spell_range() -> f32 {
    25.0
}

const fn default_interaction_distance() -> f32 {
    5.5
}

fn default_case_sensitive_keywords() -> Vec<String> {
    ["quest", "Quest", "mission", "task"]
        .into_iter()
        .map(ToOwned::to_owned)
        .collect()
}
