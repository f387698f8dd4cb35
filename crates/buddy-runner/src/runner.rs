//! The scheduling tick loop.
//!
//! Drives [`AgentScheduler::tick`] on a fixed interval until either the
//! configured tick budget is spent or the process receives Ctrl-C. Cycles
//! still in flight when the loop stops are awaited before returning, so
//! every launched decision is settled and echoed.

use std::time::Duration;

use buddy_core::{AgentScheduler, GameWorld, InferenceClient};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Why the tick loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// The configured number of ticks elapsed.
    MaxTicks,
    /// Ctrl-C was received.
    Shutdown,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Why the loop stopped.
    pub end_reason: RunEndReason,
    /// Scheduling ticks executed.
    pub total_ticks: u64,
    /// Decision cycles launched over the run.
    pub cycles_launched: u64,
}

/// Run the scheduler until `max_ticks` ticks have elapsed (0 means no limit)
/// or Ctrl-C arrives.
pub async fn run_loop<W, I>(
    scheduler: &mut AgentScheduler<W, I>,
    tick_interval: Duration,
    max_ticks: u64,
) -> RunSummary
where
    W: GameWorld + 'static,
    I: InferenceClient,
{
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut total_ticks: u64 = 0;
    let mut cycles_launched: u64 = 0;
    let end_reason = loop {
        if max_ticks > 0 && total_ticks >= max_ticks {
            break RunEndReason::MaxTicks;
        }

        tokio::select! {
            _ = interval.tick() => {
                let report = scheduler.tick();
                total_ticks = total_ticks.saturating_add(1);
                cycles_launched = cycles_launched
                    .saturating_add(u64::try_from(report.launched).unwrap_or(u64::MAX));
                debug!(
                    tick = total_ticks,
                    launched = report.launched,
                    busy = report.busy,
                    ineligible = report.ineligible,
                    reaped = report.reaped,
                    forgotten = report.forgotten,
                    "scheduling tick"
                );
            }
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break RunEndReason::Shutdown;
            }
        }
    };

    info!(
        in_flight = scheduler.in_flight(),
        "waiting for in-flight decision cycles"
    );
    scheduler.drain().await;

    RunSummary {
        end_reason,
        total_ticks,
        cycles_launched,
    }
}
