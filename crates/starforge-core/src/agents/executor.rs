//! Agent stage - runs every due, active agent through its behavior.

use super::{BehaviorRegistry, BehaviorResult};
use crate::clock::{add_seconds, seconds_between};
use crate::context::TickContext;
use crate::error::{Result, SimError};
use crate::model::{Agent, AgentLog, AgentState, LogLevel};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AgentReport {
    pub executed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Active agents that were not yet due.
    pub waiting: usize,
}

/// Whether an active agent may run at `now`.
pub fn is_due(agent: &Agent, now: DateTime<Utc>, min_interval_seconds: f64) -> bool {
    let interval_ok = agent
        .last_execution_time
        .map_or(true, |last| seconds_between(last, now) >= min_interval_seconds);
    let delay_ok = agent.next_execution_time.map_or(true, |next| now >= next);
    interval_ok && delay_ok
}

pub async fn agent_system(ctx: &mut TickContext, registry: &BehaviorRegistry) -> Result<AgentReport> {
    let mut report = AgentReport::default();
    let min_interval = ctx.config.agent_min_interval_seconds;

    for agent in ctx.store.list_agents(ctx.game_id).await? {
        if ctx.cancel.is_cancelled() {
            log::info!("Agent processing for game {} cancelled", ctx.game_id);
            break;
        }
        if agent.state != AgentState::Active {
            continue;
        }
        if !is_due(&agent, ctx.now, min_interval) {
            report.waiting += 1;
            continue;
        }

        let id = agent.id;
        report.executed += 1;
        match run_agent(ctx, registry, agent).await {
            Ok(true) => report.succeeded += 1,
            Ok(false) => report.failed += 1,
            Err(e) => {
                report.failed += 1;
                log::error!("Failed to record execution of agent {}: {}", id, e);
            }
        }
    }
    Ok(report)
}

/// Execute one agent and persist the result. Returns whether the behavior
/// succeeded; `Err` only when the outcome itself could not be stored.
async fn run_agent(ctx: &mut TickContext, registry: &BehaviorRegistry, mut agent: Agent) -> Result<bool> {
    let behavior = registry.resolve(agent.behavior_name.as_deref());
    let attempt = AssertUnwindSafe(async {
        match behavior.can_execute(&agent, ctx).await {
            Ok(true) => behavior.execute(&agent, ctx).await,
            Ok(false) => Ok(BehaviorResult::error(
                SimError::CannotExecute(behavior.name().to_string()).to_string(),
            )),
            Err(e) => Err(e),
        }
    })
    .catch_unwind()
    .await;
    // A panicking behavior is contained to its own agent.
    let outcome = attempt.unwrap_or_else(|payload| {
        Err(SimError::BehaviorPanicked {
            behavior: behavior.name().to_string(),
            message: panic_message(payload.as_ref()),
        })
    });

    let now = ctx.now;
    let (level, message, data, success) = match outcome {
        Ok(result) => {
            agent.state = result.next_state;
            agent.next_execution_time = result.delay_seconds.map(|s| add_seconds(now, s));
            let level = if result.success {
                LogLevel::Info
            } else {
                LogLevel::Error
            };
            (level, result.message, result.log_data, result.success)
        }
        Err(e) => {
            log::error!("Agent {} ({}) failed: {}", agent.id, behavior.name(), e);
            agent.state = AgentState::Error;
            agent.next_execution_time = None;
            (
                LogLevel::Error,
                format!("Agent execution error: {}", e),
                None,
                false,
            )
        }
    };
    agent.last_execution_time = Some(now);
    agent.updated_at = now;

    ctx.store.update_agent(&agent).await?;
    let entry = ctx
        .store
        .add_log(AgentLog {
            id: 0,
            agent_id: agent.id,
            level,
            message,
            data,
            at: now,
        })
        .await?;
    log::debug!(
        "Agent {} '{}' ran {}: {} -> {:?}",
        agent.id,
        agent.name,
        behavior.name(),
        entry.message,
        agent.state
    );

    ctx.sink.on_agent_updated(&agent);
    ctx.sink.on_agent_log(agent.id, &entry);
    Ok(success)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
