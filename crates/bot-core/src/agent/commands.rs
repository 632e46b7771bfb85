//! Human chat command surface: each line maps to at most one request before it
//! ever reaches the extraction pipeline.
//!
//! Grammar, small on purpose:
//! - `!elevated on|off`, `!commands on|off`   (trusted principal only)
//! - `<primitive> <x> <y> <z>`                where primitive ∈ {inspect, goto, dig, mine}
//! - `command <text>` / `cmd <text>`
//! - `//name(k=v, ...); name2(1, 2, 3)`       (handled by the directive strategy)
//! - anything else is free chat for the model

use serde_json::{Number, Value};

use super::auth::AuthDirective;
use super::wire::{ActionWire, PRIMITIVE_NAMES};

#[derive(Debug, Clone, PartialEq)]
pub enum ChatRequest {
    Auth(AuthDirective),
    /// A single pre-parsed action (primitive shorthand or raw command).
    Single(ActionWire),
    /// Directive-line shorthand; the caller re-parses via the pipeline.
    DirectiveLine,
    /// Free chat to forward on the actions path.
    Free,
}

pub fn parse_chat(line: &str) -> ChatRequest {
    let trimmed = line.trim();
    if trimmed.starts_with("//") {
        return ChatRequest::DirectiveLine;
    }
    if let Some(directive) = parse_auth_directive(trimmed) {
        return ChatRequest::Auth(directive);
    }
    if let Some(action) = parse_command_line(trimmed) {
        return ChatRequest::Single(action);
    }
    if let Some(action) = parse_primitive_line(trimmed) {
        return ChatRequest::Single(action);
    }
    ChatRequest::Free
}

fn parse_bool_word(word: &str) -> Option<bool> {
    match word.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_auth_directive(line: &str) -> Option<AuthDirective> {
    let rest = line.strip_prefix('!')?;
    let (verb, value) = rest.split_once(char::is_whitespace)?;
    let value = parse_bool_word(value.trim())?;
    match verb.to_ascii_lowercase().as_str() {
        "elevated" | "elevate" => Some(AuthDirective::SetElevated(value)),
        "commands" => Some(AuthDirective::SetCommandsEnabled(value)),
        _ => None,
    }
}

fn parse_command_line(line: &str) -> Option<ActionWire> {
    let (verb, rest) = line.split_once(char::is_whitespace)?;
    let payload = rest.trim();
    if payload.is_empty() {
        return None;
    }
    match verb.to_ascii_lowercase().as_str() {
        "command" | "cmd" => Some(ActionWire::command(payload)),
        _ => None,
    }
}

fn parse_primitive_line(line: &str) -> Option<ActionWire> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 4 {
        return None;
    }
    let name = tokens[0].to_ascii_lowercase();
    if !PRIMITIVE_NAMES.contains(&name.as_str()) {
        return None;
    }
    let mut action = ActionWire::named(name);
    for (key, token) in ["x", "y", "z"].into_iter().zip(&tokens[1..]) {
        let n = token.parse::<f64>().ok()?;
        action
            .params
            .insert(key.to_string(), Value::Number(Number::from_f64(n)?));
    }
    Some(action)
}
