//! Per-agent decision cycle scheduling.
//!
//! [`AgentScheduler::tick`] is one synchronous pass over the managed agents.
//! Each agent is either idle or has exactly one decision cycle in flight; the
//! scheduler keeps the cycle's [`JoinHandle`] and derives "busy" from it, so
//! a cycle that panics still frees its agent on the next tick. Missed ticks
//! are never queued.
//!
//! A decision cycle runs as its own tokio task:
//!
//! 1. Render the prompt from the observation taken at launch
//! 2. Call the inference client (bounded when a timeout is configured)
//! 3. Decode the reply into a [`Decision`]
//! 4. Record reasoning and the compact command, then dispatch
//! 5. Say the optional chat line
//! 6. Hand a [`DecisionRecord`] to the observer
//!
//! The task suspends only inside the inference call. If the agent is gone by
//! the time the reply is decoded, the decision is dropped unexecuted.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use buddy_types::{AgentId, AgentSnapshot, CycleId, DecisionOutcome, DecisionRecord};
use chrono::Utc;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capability::GameWorld;
use crate::codec::{self, Decision};
use crate::config::{BuddyConfig, SchedulerConfig};
use crate::dispatch::Dispatcher;
use crate::encoder::{Observation, StateEncoder};
use crate::inference::{self, InferenceClient, InferenceError};
use crate::prompt::PromptEngine;
use crate::store::AgentMemoryStore;

/// Maximum length of the observation kept in a [`DecisionRecord`].
const MAX_OBSERVATION_LEN: usize = 8000;

/// Maximum length of the raw reply kept in a [`DecisionRecord`].
const MAX_REPLY_LEN: usize = 4000;

/// Receives a record of every decision cycle that reached inference.
pub trait CycleObserver: Send + Sync {
    /// Called once per finished cycle, from the cycle's task.
    fn on_decision(&self, record: &DecisionRecord);
}

/// What one scheduling pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Cycles started this tick.
    pub launched: usize,
    /// Agents skipped because a cycle was still in flight.
    pub busy: usize,
    /// Agents skipped because they were dead, absent, or not managed by name.
    pub ineligible: usize,
    /// Finished cycles collected at the start of the tick.
    pub reaped: usize,
    /// Agents that left the world and had their history and mailbox dropped.
    pub forgotten: usize,
}

struct DecisionCycle {
    handle: JoinHandle<()>,
    started_at: Instant,
}

/// Launches and tracks decision cycles.
pub struct AgentScheduler<W, I> {
    world: Arc<W>,
    store: Arc<AgentMemoryStore>,
    encoder: StateEncoder,
    runner: CycleRunner<W, I>,
    config: SchedulerConfig,
    cycles: HashMap<AgentId, DecisionCycle>,
    known: HashSet<AgentId>,
}

impl<W, I> core::fmt::Debug for AgentScheduler<W, I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AgentScheduler")
            .field("config", &self.config)
            .field("in_flight", &self.cycles.len())
            .finish_non_exhaustive()
    }
}

impl<W: GameWorld + 'static, I: InferenceClient> AgentScheduler<W, I> {
    /// Create a scheduler over a world and an inference client.
    pub fn new(
        world: Arc<W>,
        inference: Arc<I>,
        store: Arc<AgentMemoryStore>,
        prompts: PromptEngine,
        config: &BuddyConfig,
    ) -> Self {
        let dispatcher = Dispatcher::new(
            Arc::clone(&world),
            config.combat.clone(),
            config.quest.clone(),
        );
        let runner = CycleRunner {
            world: Arc::clone(&world),
            inference,
            store: Arc::clone(&store),
            prompts: Arc::new(prompts),
            dispatcher,
            timeout: config.scheduler.inference_timeout(),
            log_observations: config.debug.log_observations,
            observer: None,
        };
        Self {
            world,
            store,
            encoder: StateEncoder::new(config.encoder.clone(), config.combat.clone()),
            runner,
            config: config.scheduler.clone(),
            cycles: HashMap::new(),
            known: HashSet::new(),
        }
    }

    /// Attach an observer for decision records.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn CycleObserver>) -> Self {
        self.runner.observer = Some(observer);
        self
    }

    /// The shared history and mailbox store.
    pub const fn store(&self) -> &Arc<AgentMemoryStore> {
        &self.store
    }

    /// The dispatcher cycles execute commands through. Also serves the
    /// manual control path.
    pub const fn dispatcher(&self) -> &Dispatcher<W> {
        &self.runner.dispatcher
    }

    /// Whether the agent has a cycle in flight (or finished but not yet
    /// reaped).
    pub fn is_busy(&self, agent: AgentId) -> bool {
        self.cycles.contains_key(&agent)
    }

    /// Number of tracked cycles.
    pub fn in_flight(&self) -> usize {
        self.cycles.len()
    }

    /// Run one scheduling pass. Must be called from within a tokio runtime.
    pub fn tick(&mut self) -> TickReport {
        let managed = self.world.managed_agents();
        let reaped = self.reap();
        let mut report = TickReport {
            reaped,
            forgotten: self.forget_departed(&managed),
            ..TickReport::default()
        };

        for agent in managed {
            self.known.insert(agent);
            if self.cycles.contains_key(&agent) {
                report.busy = report.busy.saturating_add(1);
                continue;
            }
            let Some(snapshot) = self.eligible_snapshot(agent) else {
                report.ineligible = report.ineligible.saturating_add(1);
                continue;
            };

            let observation = self.encoder.encode(&snapshot, &self.store);
            debug!(
                agent_id = %agent,
                entities = observation.entities_listed,
                messages = observation.messages_drained,
                "launching decision cycle"
            );
            let handle = tokio::spawn(self.runner.clone().run(observation));
            self.cycles.insert(
                agent,
                DecisionCycle {
                    handle,
                    started_at: Instant::now(),
                },
            );
            report.launched = report.launched.saturating_add(1);
        }

        if report.launched > 0 || report.reaped > 0 || report.forgotten > 0 {
            debug!(
                launched = report.launched,
                busy = report.busy,
                ineligible = report.ineligible,
                reaped = report.reaped,
                forgotten = report.forgotten,
                "tick complete"
            );
        }
        report
    }

    /// Wait for every in-flight cycle to finish, then reap them.
    pub async fn drain(&mut self) {
        for (agent, cycle) in self.cycles.drain() {
            if let Err(e) = cycle.handle.await {
                warn!(agent_id = %agent, error = %e, "decision cycle ended abnormally");
            }
        }
    }

    fn eligible_snapshot(&self, agent: AgentId) -> Option<AgentSnapshot> {
        if !self.world.is_eligible(agent) {
            return None;
        }
        let snapshot = self.world.snapshot(agent)?;
        self.config.manages(&snapshot.name).then_some(snapshot)
    }

    /// Clear the store for agents no longer in the world. An agent with a
    /// cycle still in flight is kept until that cycle is reaped.
    fn forget_departed(&mut self, managed: &[AgentId]) -> usize {
        let departed: Vec<AgentId> = self
            .known
            .iter()
            .filter(|agent| !managed.contains(agent) && !self.cycles.contains_key(agent))
            .copied()
            .collect();

        for agent in &departed {
            self.known.remove(agent);
            self.store.forget(*agent);
            debug!(agent_id = %agent, "agent left, history and mailbox dropped");
        }
        departed.len()
    }

    /// Drop handles of finished cycles.
    fn reap(&mut self) -> usize {
        let finished: Vec<AgentId> = self
            .cycles
            .iter()
            .filter(|(_, cycle)| cycle.handle.is_finished())
            .map(|(agent, _)| *agent)
            .collect();

        for agent in &finished {
            let Some(cycle) = self.cycles.remove(agent) else {
                continue;
            };
            let elapsed = cycle.started_at.elapsed();
            match cycle.handle.now_or_never() {
                Some(Err(e)) if e.is_panic() => {
                    warn!(agent_id = %agent, error = %e, "decision cycle panicked");
                }
                Some(Err(e)) => {
                    warn!(agent_id = %agent, error = %e, "decision cycle cancelled");
                }
                _ => {
                    debug!(agent_id = %agent, elapsed_ms = duration_ms(elapsed), "cycle reaped");
                }
            }
        }
        finished.len()
    }
}

// ---------------------------------------------------------------------------
// Decision cycle
// ---------------------------------------------------------------------------

/// Everything a cycle task needs, cloned per launch.
struct CycleRunner<W, I> {
    world: Arc<W>,
    inference: Arc<I>,
    store: Arc<AgentMemoryStore>,
    prompts: Arc<PromptEngine>,
    dispatcher: Dispatcher<W>,
    timeout: Option<Duration>,
    log_observations: bool,
    observer: Option<Arc<dyn CycleObserver>>,
}

impl<W, I> Clone for CycleRunner<W, I> {
    fn clone(&self) -> Self {
        Self {
            world: Arc::clone(&self.world),
            inference: Arc::clone(&self.inference),
            store: Arc::clone(&self.store),
            prompts: Arc::clone(&self.prompts),
            dispatcher: self.dispatcher.clone(),
            timeout: self.timeout,
            log_observations: self.log_observations,
            observer: self.observer.clone(),
        }
    }
}

/// How a reply was settled, before it becomes a record.
struct Settled {
    outcome: DecisionOutcome,
    raw_reply: String,
    decision: Option<Decision>,
}

impl Settled {
    const fn without_decision(outcome: DecisionOutcome, raw_reply: String) -> Self {
        Self {
            outcome,
            raw_reply,
            decision: None,
        }
    }
}

impl<W: GameWorld, I: InferenceClient> CycleRunner<W, I> {
    async fn run(self, observation: Observation) {
        let agent = observation.agent_id;
        let started = Instant::now();

        let prompt = match self.prompts.render(&observation) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(agent_id = %agent, error = %e, "failed to render prompt, skipping cycle");
                return;
            }
        };
        if self.log_observations {
            debug!(agent_id = %agent, observation = observation.text, "observation");
        }

        let reply = inference::complete_within(self.inference.as_ref(), &prompt, self.timeout).await;
        let settled = self.settle(agent, reply);

        let latency_ms = duration_ms(started.elapsed());
        info!(
            agent_id = %agent,
            outcome = settled.outcome.as_str(),
            latency_ms,
            "decision cycle finished"
        );

        let Some(observer) = &self.observer else {
            return;
        };
        let decision = settled.decision.as_ref();
        let record = DecisionRecord {
            cycle_id: CycleId::new(),
            agent_id: agent,
            agent_name: observation.agent_name,
            observation: truncate_string(&observation.text, MAX_OBSERVATION_LEN),
            raw_reply: truncate_string(&settled.raw_reply, MAX_REPLY_LEN),
            command: decision.map(|d| d.command_value.clone()),
            reasoning: decision.and_then(|d| d.reasoning.clone()),
            say: decision.and_then(|d| d.say.clone()),
            outcome: settled.outcome,
            latency_ms,
            created_at: Utc::now(),
        };
        observer.on_decision(&record);
    }

    /// Turn an inference result into an outcome, dispatching when it holds
    /// a valid command for an agent that is still around.
    fn settle(&self, agent: AgentId, reply: Result<String, InferenceError>) -> Settled {
        let raw = match reply {
            Ok(raw) if raw.trim().is_empty() => {
                warn!(agent_id = %agent, backend = self.inference.name(), "empty inference reply");
                return Settled::without_decision(DecisionOutcome::EmptyReply, raw);
            }
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    agent_id = %agent,
                    backend = self.inference.name(),
                    error = %e,
                    "inference call failed"
                );
                return Settled::without_decision(DecisionOutcome::TransportError, String::new());
            }
        };
        if self.log_observations {
            debug!(agent_id = %agent, reply = raw, "raw inference reply");
        }

        let decision = match codec::decode(&raw) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(agent_id = %agent, error = %e, "reply held no valid command");
                return Settled::without_decision(DecisionOutcome::ProtocolError, raw);
            }
        };

        if !self.world.is_eligible(agent) {
            info!(agent_id = %agent, command = %decision.command, "agent gone, decision dropped");
            return Settled {
                outcome: DecisionOutcome::AgentGone,
                raw_reply: raw,
                decision: Some(decision),
            };
        }

        if let Some(reasoning) = &decision.reasoning {
            self.store.record_reasoning(agent, reasoning);
        }
        self.store.record_command(agent, &decision.raw_command);

        let outcome = if self.dispatcher.execute(agent, &decision.command) {
            DecisionOutcome::Executed
        } else {
            DecisionOutcome::CommandFailed
        };
        if let Some(say) = &decision.say {
            self.dispatcher.say(agent, say);
        }

        Settled {
            outcome,
            raw_reply: raw,
            decision: Some(decision),
        }
    }
}

fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Cut `s` to at most `max_len` bytes on a char boundary, marking the cut.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_owned();
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end = end.saturating_sub(1);
    }
    let mut truncated = s.get(..end).unwrap_or_default().to_owned();
    truncated.push_str("...");
    truncated
}
