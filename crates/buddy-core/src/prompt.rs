//! Prompt template loading and rendering via `minijinja`.
//!
//! The decision prompt is the observation followed by the behaviour rules,
//! the command schema, and a few example replies. A default template is
//! compiled into the crate; operators can point [`PromptEngine::from_dir`]
//! at a directory holding their own `decision.j2` to tune behaviour without
//! recompiling.

use std::path::Path;

use minijinja::{Environment, context};

use crate::config::CombatConfig;
use crate::encoder::Observation;

/// File name of the decision template inside a template directory.
pub const DECISION_TEMPLATE: &str = "decision.j2";

const DEFAULT_DECISION_TEMPLATE: &str = include_str!("../templates/decision.j2");

/// Errors from loading or rendering prompt templates.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// The template file could not be read.
    #[error("failed to read template {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The template failed to compile or render.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Renders decision prompts.
///
/// Available template variables:
///
/// - `observation`: the encoded observation text
/// - `agent_name`: the agent's character name
/// - `combat.melee_range`, `combat.min_ranged_distance`, `combat.spell_range`
pub struct PromptEngine {
    env: Environment<'static>,
    combat: CombatConfig,
}

impl core::fmt::Debug for PromptEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PromptEngine")
            .field("combat", &self.combat)
            .finish_non_exhaustive()
    }
}

impl PromptEngine {
    /// Create an engine using the built-in decision template.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Template`] if the built-in template fails to
    /// compile.
    pub fn new(combat: CombatConfig) -> Result<Self, PromptError> {
        Self::with_source(DEFAULT_DECISION_TEMPLATE.to_owned(), combat)
    }

    /// Create an engine loading `decision.j2` from the given directory.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Io`] if the file cannot be read, or
    /// [`PromptError::Template`] if it does not compile.
    pub fn from_dir(dir: &Path, combat: CombatConfig) -> Result<Self, PromptError> {
        let path = dir.join(DECISION_TEMPLATE);
        let source = std::fs::read_to_string(&path).map_err(|source| PromptError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::with_source(source, combat)
    }

    fn with_source(source: String, combat: CombatConfig) -> Result<Self, PromptError> {
        let mut env = Environment::new();
        env.add_template_owned("decision", source)?;
        Ok(Self { env, combat })
    }

    /// Render the full prompt for one decision cycle.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Template`] if rendering fails.
    pub fn render(&self, observation: &Observation) -> Result<String, PromptError> {
        let rendered = self.env.get_template("decision")?.render(context! {
            observation => observation.text,
            agent_name => observation.agent_name,
            combat => context! {
                melee_range => self.combat.melee_range,
                min_ranged_distance => self.combat.min_ranged_distance,
                spell_range => self.combat.spell_range,
            },
        })?;
        Ok(rendered)
    }
}
