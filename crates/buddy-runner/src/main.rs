//! Runner entry point for the bot buddy decision loop.
//!
//! The runner hosts the scheduler: it loads the scenario world and the
//! decision loop configuration, picks an inference backend, optionally
//! bridges chat in from NATS and decision records out to it, then ticks
//! until the tick budget is spent or Ctrl-C arrives.
//!
//! # Architecture
//!
//! ```text
//! NATS (chat) --> AgentMemoryStore mailbox
//! NATS (control) --> Dispatcher --> SandboxWorld
//! tick --> AgentScheduler --> LLM Backend --> Dispatcher --> SandboxWorld
//!                         --> NATS (decision records)
//! ```

mod config;
mod error;
mod llm;
mod nats;
mod runner;

use std::path::Path;
use std::sync::Arc;

use buddy_core::{
    AgentMemoryStore, AgentScheduler, BuddyConfig, CycleObserver, InferenceClient, PromptEngine,
    SandboxWorld, WorldQuery,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::llm::create_backend;
use crate::nats::{NatsClient, spawn_chat_intake, spawn_control_intake};
use crate::runner::run_loop;

/// Application entry point.
///
/// Initializes logging, loads configuration from environment variables and
/// YAML, wires the scheduler, then runs the tick loop.
///
/// # Errors
///
/// Returns an error if any startup step fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("buddy-runner starting");

    let config = RunnerConfig::from_env()?;
    info!(
        scenario = config.scenario_path,
        buddy_config = config.buddy_config,
        templates_dir = config.templates_dir,
        nats_url = config.nats_url,
        max_ticks = config.max_ticks,
        "configuration loaded"
    );

    let buddy = match &config.buddy_config {
        Some(path) => BuddyConfig::from_file(Path::new(path)).map_err(RunnerError::from)?,
        None => BuddyConfig::default(),
    };

    let world = Arc::new(
        SandboxWorld::from_file(Path::new(&config.scenario_path)).map_err(RunnerError::from)?,
    );
    info!(
        agents = world.managed_agents().len(),
        "scenario world loaded"
    );

    let prompts = match &config.templates_dir {
        Some(dir) => PromptEngine::from_dir(Path::new(dir), buddy.combat.clone()),
        None => PromptEngine::new(buddy.combat.clone()),
    }
    .map_err(RunnerError::from)?;

    let backend = Arc::new(create_backend(&config.backend));
    info!(
        backend = backend.name(),
        model = config.backend.model,
        url = config.backend.api_url,
        "inference backend configured"
    );

    let store = Arc::new(AgentMemoryStore::new(buddy.history.capacity));
    let mut scheduler = AgentScheduler::new(
        Arc::clone(&world),
        backend,
        Arc::clone(&store),
        prompts,
        &buddy,
    );

    if let Some(url) = &config.nats_url {
        let nats = NatsClient::connect(url).await?;
        let subscriber = nats.subscribe_chat().await?;
        spawn_chat_intake(subscriber, Arc::clone(&world), Arc::clone(&store));
        let control = nats.subscribe_control().await?;
        spawn_control_intake(control, scheduler.dispatcher().clone(), Arc::clone(&store));
        scheduler = scheduler.with_observer(Arc::new(nats) as Arc<dyn CycleObserver>);
    } else {
        info!("NATS_URL unset, chat intake, control commands and decision echo disabled");
    }

    info!(
        tick_interval_ms = buddy.scheduler.tick_interval_ms,
        "entering tick loop"
    );
    let summary = run_loop(&mut scheduler, buddy.scheduler.tick_interval(), config.max_ticks).await;
    info!(
        end_reason = ?summary.end_reason,
        total_ticks = summary.total_ticks,
        cycles_launched = summary.cycles_launched,
        "buddy-runner stopped"
    );

    Ok(())
}
