//! Sequential plan executor.
//!
//! Steps run strictly in array order with a fixed inter-step delay. Every
//! failure path degrades to "skip this step, notify, continue": a rejected or
//! failed step never aborts the remainder of the plan, and nothing here is
//! fatal to the hosting process.

use std::time::Duration;

use tracing::{info, warn};

use super::auth::AuthState;
use super::dispatch::dispatch;
use super::game_api::GameApi;
use super::validate::validate_step;
use super::wire::ActionWire;

/// Single-writer busy flag guarding against overlapping plan executions.
///
/// Callers that find the session busy drop their request entirely; requests
/// are never queued.
#[derive(Debug, Clone, Default)]
pub struct ExecutionSession {
    busy: bool,
    current_task: Option<String>,
}

impl ExecutionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn current_task(&self) -> Option<&str> {
        self.current_task.as_deref()
    }

    /// Claims the session. Returns false (and changes nothing) if a plan is
    /// already in flight.
    pub fn begin(&mut self, task: &str) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        self.current_task = Some(task.to_string());
        true
    }

    pub fn finish(&mut self) {
        self.busy = false;
        self.current_task = None;
    }
}

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Per-step distance bound for geometry-bound primitives.
    pub max_reach: f64,
    /// Steps beyond this cap are dropped silently before validation.
    pub plan_cap: usize,
    /// Fixed delay after every step, success or failure.
    pub step_delay: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_reach: 10.0,
            plan_cap: 8,
            step_delay: Duration::from_millis(180),
        }
    }
}

const RATIONALE_MAX_CHARS: usize = 160;

fn bounded_line(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    collapsed.chars().take(max_chars).collect()
}

/// Runs a plan end to end. Returns whether the plan was *attempted*: `false`
/// means the session was busy and the plan was dropped without side effects.
/// Per-step success is observable only via notices and logs.
pub async fn execute_plan(
    steps: &[ActionWire],
    task: &str,
    session: &mut ExecutionSession,
    auth: &AuthState,
    api: &dyn GameApi,
    invoker: &str,
    cfg: &ExecutorConfig,
) -> bool {
    if !session.begin(task) {
        info!(
            "plan.dropped_busy task={task} in_flight={:?}",
            session.current_task()
        );
        return false;
    }

    let steps = &steps[..steps.len().min(cfg.plan_cap)];
    info!("plan.started task={task} steps={}", steps.len());

    for (index, step) in steps.iter().enumerate() {
        run_step(index, step, auth, api, invoker, cfg).await;
        tokio::time::sleep(cfg.step_delay).await;
    }

    info!("plan.finished task={task}");
    session.finish();
    true
}

async fn run_step(
    index: usize,
    step: &ActionWire,
    auth: &AuthState,
    api: &dyn GameApi,
    invoker: &str,
    cfg: &ExecutorConfig,
) {
    // The agent moves between steps, so the distance bound is evaluated
    // against a fresh position right before each step runs.
    let position = match api.observe().await {
        Ok(obs) => obs.position,
        Err(err) => {
            warn!("plan.step.observe_failed index={index} err={err:#}");
            api.notify(&format!("skipping {}: world state unavailable", step.name))
                .await
                .ok();
            return;
        }
    };

    let validated = match validate_step(step, position, cfg.max_reach) {
        Ok(v) => v,
        Err(reason) => {
            info!("plan.step.rejected index={index} reason={reason}");
            api.notify(&format!("skipping {}: {reason}", step.name.trim()))
                .await
                .ok();
            return;
        }
    };

    if let Some(rationale) = validated.rationale.as_deref() {
        let line = bounded_line(rationale, RATIONALE_MAX_CHARS);
        if !line.is_empty() {
            api.notify(&line).await.ok();
        }
    }

    let ok = dispatch(&validated, invoker, auth, api).await;
    info!("plan.step.done index={index} name={} ok={ok}", validated.name);
}
