//! Capability dispatcher: routes a validated step to the collaborator's micro
//! primitives, compound helpers, or the authorization-gated raw command
//! channel.
//!
//! A raw command that fails authorization or execution gets exactly one more
//! chance: its payload is reinterpreted as a directive line and the recovered
//! actions are dispatched through a pass that performs no further fallback, so
//! adversarial command text cannot recurse.

use tracing::{debug, warn};

use super::auth::AuthState;
use super::extract::{extract, ExtractMode};
use super::game_api::{CompoundOp, GameApi, PrimitiveOp, Vec3};
use super::validate::ValidatedStep;
use super::wire::{canonical_name, classify, finite_coord, param_str, ActionKind, ActionWire};

/// Dispatches one validated step. Collaborator failures are swallowed into
/// `false`; this function never raises.
pub async fn dispatch(
    step: &ValidatedStep,
    invoker: &str,
    auth: &AuthState,
    api: &dyn GameApi,
) -> bool {
    match step.kind {
        ActionKind::Primitive => run_primitive(step, api).await,
        ActionKind::Compound => run_compound(step, invoker, api).await,
        ActionKind::Command => {
            if run_raw_command(step, auth, api).await {
                return true;
            }
            run_command_fallback(step, invoker, auth, api).await
        }
        ActionKind::Unknown => {
            api.notify(&format!("unknown action: {}", step.name))
                .await
                .ok();
            false
        }
    }
}

async fn run_primitive(step: &ValidatedStep, api: &dyn GameApi) -> bool {
    let target = match (
        finite_coord(&step.params, "x"),
        finite_coord(&step.params, "y"),
        finite_coord(&step.params, "z"),
    ) {
        (Some(x), Some(y), Some(z)) => Vec3 { x, y, z },
        _ => {
            api.notify(&format!("skipping {}: missing coordinates", step.name))
                .await
                .ok();
            return false;
        }
    };
    let op = match step.name.as_str() {
        "goto" => PrimitiveOp::Goto(target),
        "inspect" => PrimitiveOp::Inspect(target),
        // `dig` and `mine` both break the block at the coordinate.
        _ => PrimitiveOp::Break(target),
    };
    match api.primitive(op).await {
        Ok(ok) => ok,
        Err(err) => {
            warn!("dispatch.primitive.failed name={} err={err:#}", step.name);
            false
        }
    }
}

async fn run_compound(step: &ValidatedStep, invoker: &str, api: &dyn GameApi) -> bool {
    let player = param_str(&step.params, "player")
        .or_else(|| param_str(&step.params, "name"))
        .unwrap_or(invoker)
        .to_string();
    let op = match step.name.as_str() {
        "dropitems" => CompoundOp::DropItems { player },
        "gotoplayer" => CompoundOp::GotoPlayer { player },
        "ensureworkbench" => CompoundOp::EnsureWorkbench,
        "craftwoodpickaxe" => CompoundOp::CraftWoodPickaxe,
        "craftstonepickaxe" => CompoundOp::CraftStonePickaxe,
        _ => CompoundOp::Status,
    };
    match api.compound(op).await {
        Ok(ok) => ok,
        Err(err) => {
            warn!("dispatch.compound.failed name={} err={err:#}", step.name);
            false
        }
    }
}

fn command_payload(step: &ValidatedStep) -> Option<&str> {
    param_str(&step.params, "command")
        .or_else(|| param_str(&step.params, "cmd"))
        .or_else(|| param_str(&step.params, "text"))
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

async fn run_raw_command(step: &ValidatedStep, auth: &AuthState, api: &dyn GameApi) -> bool {
    let Some(payload) = command_payload(step) else {
        return false;
    };
    if !auth.authorize_command() {
        api.notify("commands are disabled").await.ok();
        return false;
    }
    match api.run_command(payload).await {
        Ok(ok) => ok,
        Err(err) => {
            warn!("dispatch.command.failed err={err:#}");
            false
        }
    }
}

/// One-level fallback: reinterpret the command payload as a directive line.
/// Returns the original failure (`false`) when nothing useful is recovered.
async fn run_command_fallback(
    step: &ValidatedStep,
    invoker: &str,
    auth: &AuthState,
    api: &dyn GameApi,
) -> bool {
    let Some(payload) = command_payload(step) else {
        return false;
    };
    let line = format!("//{payload}");
    let actions = extract(&line, ExtractMode::Directive, invoker);
    if actions.is_empty() {
        return false;
    }
    debug!("dispatch.command.fallback actions={}", actions.len());

    let mut any = false;
    for action in actions {
        if let Some(step) = reclassify(&action) {
            // No second fallback from here.
            any |= match step.kind {
                ActionKind::Primitive => run_primitive(&step, api).await,
                ActionKind::Compound => run_compound(&step, invoker, api).await,
                ActionKind::Command => run_raw_command(&step, auth, api).await,
                ActionKind::Unknown => false,
            };
        }
    }
    any
}

fn reclassify(action: &ActionWire) -> Option<ValidatedStep> {
    let name = canonical_name(&action.name);
    if name.is_empty() {
        return None;
    }
    Some(ValidatedStep {
        kind: classify(&name),
        name,
        params: action.params.clone(),
        rationale: action.rationale.clone(),
    })
}
