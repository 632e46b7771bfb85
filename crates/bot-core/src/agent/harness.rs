//! The two entry points that drive the pipeline: the periodic planning tick
//! and the chat-triggered path.
//!
//! Both are deterministic given their collaborators: no timers, threads, or
//! network clients are owned here, which keeps the flows testable with fakes.

use std::future::Future;
use std::pin::Pin;

use rand::Rng;
use serde_json::{Number, Value};
use tracing::info;

use super::auth::AuthState;
use super::commands::{parse_chat, ChatRequest};
use super::config::BotConfig;
use super::executor::{execute_plan, ExecutionSession, ExecutorConfig};
use super::extract::{extract, ExtractMode};
use super::game_api::{GameApi, Vec3};
use super::prompt::{build_chat_prompt, build_plan_prompt, PromptConfig};
use super::sanitize::sanitize_reply;
use super::scheduler::Scheduler;
use super::wire::ActionWire;

/// Boundary to the text-generation collaborator. The request carries a system
/// instruction plus a user instruction; the response is free text.
pub trait LlmClient: Send + Sync {
    fn complete<'a>(
        &'a self,
        system: String,
        prompt: String,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;
}

/// Owns every process-wide mutable flag: authorization state, the execution
/// session, and the scheduler switch. All mutation goes through named
/// operations on these fields, never ambient assignment.
#[derive(Debug)]
pub struct BotAgent {
    pub config: BotConfig,
    pub auth: AuthState,
    pub session: ExecutionSession,
    pub scheduler: Scheduler,
    pub prompt_cfg: PromptConfig,
    pub system_prompt: String,
    pub objective: String,
}

impl BotAgent {
    pub fn new(system_prompt: impl Into<String>, config: BotConfig) -> Self {
        let auth = config.auth_state();
        let scheduler = Scheduler::new(config.tick_period());
        Self {
            config,
            auth,
            session: ExecutionSession::new(),
            scheduler,
            prompt_cfg: PromptConfig::default(),
            system_prompt: system_prompt.into(),
            objective: "Explore and gather resources near your position.".to_string(),
        }
    }

    fn exec_cfg(&self, cap: usize) -> ExecutorConfig {
        ExecutorConfig {
            max_reach: self.config.max_reach,
            plan_cap: cap,
            step_delay: self.config.step_delay(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickReport {
    /// A plan was in flight; this tick was dropped, not queued.
    SkippedBusy,
    /// A plan was extracted and attempted.
    Planned { steps: usize, attempted: bool },
    /// Nothing usable came back from the model; a short wander ran instead.
    FallbackWander,
}

/// One planning pass: observe, prompt, extract, execute.
///
/// Model output that yields nothing degrades to a low-risk idle wander so the
/// periodic loop stays live; it is never an error.
pub async fn planning_tick(
    agent: &mut BotAgent,
    api: &dyn GameApi,
    llm: &dyn LlmClient,
) -> anyhow::Result<TickReport> {
    if agent.session.is_busy() {
        info!("tick.dropped_busy task={:?}", agent.session.current_task());
        return Ok(TickReport::SkippedBusy);
    }

    let obs = api.observe().await?;
    let prompt = build_plan_prompt(&obs, &agent.objective, &agent.prompt_cfg);
    let raw = llm.complete(agent.system_prompt.clone(), prompt).await?;

    // Display path is independent of extraction: echo the safe part, if any.
    let display = sanitize_reply(&raw);
    if !display.is_empty() {
        api.notify(&display).await.ok();
    }

    let invoker = agent.config.trusted_principal.clone();
    let steps = extract(&raw, ExtractMode::Plan, &invoker);
    if steps.is_empty() {
        let wander = wander_step(obs.position);
        let cfg = agent.exec_cfg(agent.config.plan_cap);
        execute_plan(
            &[wander],
            "wander",
            &mut agent.session,
            &agent.auth,
            api,
            &invoker,
            &cfg,
        )
        .await;
        return Ok(TickReport::FallbackWander);
    }

    let cfg = agent.exec_cfg(agent.config.plan_cap);
    let count = steps.len().min(cfg.plan_cap);
    let attempted = execute_plan(
        &steps,
        "plan",
        &mut agent.session,
        &agent.auth,
        api,
        &invoker,
        &cfg,
    )
    .await;
    Ok(TickReport::Planned {
        steps: count,
        attempted,
    })
}

fn wander_step(position: Vec3) -> ActionWire {
    let mut rng = rand::thread_rng();
    let dx: f64 = rng.gen_range(-4.0..=4.0);
    let dz: f64 = rng.gen_range(-4.0..=4.0);
    let mut step = ActionWire::named("goto");
    for (key, value) in [
        ("x", position.x + dx),
        ("y", position.y),
        ("z", position.z + dz),
    ] {
        if let Some(n) = Number::from_f64(value) {
            step.params.insert(key.to_string(), Value::Number(n));
        }
    }
    step
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    /// A trusted-principal directive changed authorization state.
    AuthApplied,
    /// An untrusted sender tried to toggle authorization; nothing happened.
    AuthIgnored,
    /// One or more actions were run (or dropped busy) on the sender's behalf.
    Executed { steps: usize, attempted: bool },
    /// Free chat that produced no actions; only the sanitized reply surfaced.
    Replied,
}

/// Handles one human chat line: authorization directives, the text command
/// surface, directive shorthand, or free chat forwarded to the model.
pub async fn handle_chat(
    agent: &mut BotAgent,
    api: &dyn GameApi,
    llm: &dyn LlmClient,
    sender: &str,
    message: &str,
) -> anyhow::Result<ChatOutcome> {
    match parse_chat(message) {
        ChatRequest::Auth(directive) => {
            if agent.auth.apply_directive(sender, directive) {
                api.notify(&auth_notice(&agent.auth)).await.ok();
                Ok(ChatOutcome::AuthApplied)
            } else {
                Ok(ChatOutcome::AuthIgnored)
            }
        }
        ChatRequest::Single(action) => {
            run_chat_steps(agent, api, sender, vec![action], "chat-command").await
        }
        ChatRequest::DirectiveLine => {
            let steps = extract(message, ExtractMode::Directive, sender);
            run_chat_steps(agent, api, sender, steps, "directive").await
        }
        ChatRequest::Free => {
            let obs = api.observe().await?;
            let prompt = build_chat_prompt(&obs, sender, message, &agent.prompt_cfg);
            let raw = llm.complete(agent.system_prompt.clone(), prompt).await?;

            let display = sanitize_reply(&raw);
            if !display.is_empty() {
                api.notify(&display).await.ok();
            }

            let steps = extract(&raw, ExtractMode::Actions, sender);
            if steps.is_empty() {
                return Ok(ChatOutcome::Replied);
            }
            run_chat_steps(agent, api, sender, steps, "chat-actions").await
        }
    }
}

fn auth_notice(auth: &AuthState) -> String {
    format!(
        "commands {} / elevated {}",
        if auth.commands_enabled() { "on" } else { "off" },
        if auth.elevated() { "on" } else { "off" },
    )
}

async fn run_chat_steps(
    agent: &mut BotAgent,
    api: &dyn GameApi,
    sender: &str,
    steps: Vec<ActionWire>,
    task: &str,
) -> anyhow::Result<ChatOutcome> {
    if steps.is_empty() {
        return Ok(ChatOutcome::Replied);
    }
    let cfg = agent.exec_cfg(agent.config.chat_action_cap);
    let count = steps.len().min(cfg.plan_cap);
    let attempted = execute_plan(
        &steps,
        task,
        &mut agent.session,
        &agent.auth,
        api,
        sender,
        &cfg,
    )
    .await;
    Ok(ChatOutcome::Executed {
        steps: count,
        attempted,
    })
}
