//! Agent core: turning unreliable model text into bounded, validated, safely
//! executed action sequences.
//!
//! The flow is raw text → [`sanitize`] (display) and, independently,
//! [`extract`] → [`validate`] → [`executor`] → [`dispatch`] → the external
//! [`game_api::GameApi`] collaborator (with raw commands gated by [`auth`]).
//! Nothing in here is fatal to the hosting process: every failure degrades to
//! "skip, notify, continue".

pub mod auth;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod executor;
pub mod extract;
pub mod game_api;
pub mod harness;
pub mod prompt;
pub mod sanitize;
pub mod scheduler;
pub mod validate;
pub mod wire;

pub use auth::{AuthDirective, AuthState};
pub use config::BotConfig;
pub use executor::{execute_plan, ExecutionSession, ExecutorConfig};
pub use extract::{extract, ExtractMode};
pub use game_api::{GameApi, Observation, Vec3};
pub use harness::{handle_chat, planning_tick, BotAgent, ChatOutcome, LlmClient, TickReport};
pub use sanitize::sanitize_reply;
pub use scheduler::{Scheduler, TickOutcome};
pub use validate::{validate_step, RejectReason, ValidatedStep};
pub use wire::{ActionKind, ActionWire};
