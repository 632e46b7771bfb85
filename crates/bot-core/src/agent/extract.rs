//! Text extraction pipeline: ordered strategies that turn arbitrary model text
//! into candidate actions.
//!
//! Strategies run in a fixed priority order and the first one that yields a
//! non-empty, schema-valid result wins:
//!
//! 1. fenced JSON block carrying the expected top-level key
//! 2. inline JSON located by brace-scanning around the expected key
//! 3. structured free text (`Action: <name> ... Params: {...}`) plus
//!    JSON-style / call-style command patterns, deduplicated
//! 4. directive-line shorthand (`//name(k=v, ...); name2(...)`)
//!
//! Total function: malformed or empty input yields an empty vector, never a
//! panic or an error.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Number, Value};

use super::wire::{ActionWire, ActionsWire, PlanWire};

const FENCE: &str = "```";
const DIRECTIVE_MARKER: &str = "//";

/// Which wire schema the caller expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// Planning path: `{ "plan": { "steps": [...] } }`.
    Plan,
    /// Chat-triggered path: `{ "actions": [...] }`.
    Actions,
    /// Directive-line shorthand only.
    Directive,
}

/// Runs the strategy chain. `invoker` fills `USERNAME`/`USER`/`PLAYER`
/// placeholder values in free-text params.
pub fn extract(text: &str, mode: ExtractMode, invoker: &str) -> Vec<ActionWire> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    if mode == ExtractMode::Directive {
        return directive_actions(text);
    }

    let actions = fenced_json_actions(text, mode);
    if !actions.is_empty() {
        return actions;
    }
    let actions = inline_json_actions(text, mode);
    if !actions.is_empty() {
        return actions;
    }
    let actions = freetext_actions(text, invoker);
    if !actions.is_empty() {
        return actions;
    }
    directive_actions(text)
}

fn parse_with_key(json: &str, mode: ExtractMode) -> Vec<ActionWire> {
    let steps = match mode {
        ExtractMode::Plan => serde_json::from_str::<PlanWire>(json)
            .map(|w| w.plan.steps)
            .unwrap_or_default(),
        ExtractMode::Actions => serde_json::from_str::<ActionsWire>(json)
            .map(|w| w.actions)
            .unwrap_or_default(),
        ExtractMode::Directive => Vec::new(),
    };
    steps
        .into_iter()
        .filter(|s| !s.name.trim().is_empty())
        .collect()
}

/// Strategy 1: the first fenced region whose contents parse under the expected
/// key. An optional language tag on the opening fence line is skipped.
fn fenced_json_actions(text: &str, mode: ExtractMode) -> Vec<ActionWire> {
    let mut rest = text;
    while let Some(open) = rest.find(FENCE) {
        let after_open = &rest[open + FENCE.len()..];
        let Some(close) = after_open.find(FENCE) else {
            break;
        };
        let region = strip_language_tag(&after_open[..close]);
        let actions = parse_with_key(region.trim(), mode);
        if !actions.is_empty() {
            return actions;
        }
        rest = &after_open[close + FENCE.len()..];
    }
    Vec::new()
}

fn strip_language_tag(region: &str) -> &str {
    let Some(nl) = region.find('\n') else {
        return region;
    };
    let first_line = region[..nl].trim();
    let is_tag = !first_line.is_empty()
        && first_line
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if is_tag {
        &region[nl + 1..]
    } else {
        region
    }
}

/// Strategy 2: find the expected key as a literal substring, walk back to the
/// nearest `{`, then scan forward balancing braces to capture the object.
fn inline_json_actions(text: &str, mode: ExtractMode) -> Vec<ActionWire> {
    let needle = match mode {
        ExtractMode::Plan => "\"plan\"",
        ExtractMode::Actions => "\"actions\"",
        ExtractMode::Directive => return Vec::new(),
    };
    let Some(key_at) = text.find(needle) else {
        return Vec::new();
    };
    let Some(start) = text[..key_at].rfind('{') else {
        return Vec::new();
    };
    let Some(object) = scan_balanced_object(&text[start..]) else {
        return Vec::new();
    };
    parse_with_key(object, mode)
}

/// Captures a balanced `{...}` prefix, tracking string/escape state so braces
/// inside values don't confuse the depth count.
fn scan_balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[..i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

fn action_block_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)action\s*:\s*"?([a-z][a-z0-9_]*)"?.*?params\s*:\s*(\{[^{}]*\})"#).ok()
    })
    .as_ref()
}

fn command_json_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)"(?:command|runcommand)"\s*:\s*"([^"]+)""#).ok())
        .as_ref()
}

fn command_call_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\b(?:command|runcommand)\s*\(\s*"?([^)"]+?)"?\s*\)"#).ok())
        .as_ref()
}

/// Strategy 3: `Action: <name> ... Params: {...}` blocks plus loose command
/// mentions in either JSON style or call style. Duplicates recovered from both
/// patterns collapse on a name + payload composite key.
fn freetext_actions(text: &str, invoker: &str) -> Vec<ActionWire> {
    let mut out = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    if let Some(re) = action_block_re() {
        for caps in re.captures_iter(text) {
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let blob = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            if name.is_empty() {
                continue;
            }
            let mut params = serde_json::from_str::<Map<String, Value>>(blob)
                .unwrap_or_else(|_| permissive_params(blob));
            substitute_placeholders(&mut params, invoker);
            let action = ActionWire {
                name: name.to_string(),
                params,
                rationale: None,
            };
            if seen.insert(dedup_key(&action)) {
                out.push(action);
            }
        }
    }

    for re in [command_json_re(), command_call_re()].into_iter().flatten() {
        for caps in re.captures_iter(text) {
            let payload = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            if payload.is_empty() {
                continue;
            }
            let action = ActionWire::command(payload);
            if seen.insert(dedup_key(&action)) {
                out.push(action);
            }
        }
    }

    out
}

fn dedup_key(action: &ActionWire) -> String {
    let payload = super::wire::param_str(&action.params, "command")
        .map(str::to_string)
        .unwrap_or_else(|| Value::Object(action.params.clone()).to_string());
    format!("{}|{}", action.name.to_ascii_lowercase(), payload)
}

/// Permissive `key=value` / `key:"value"` splitter used when the params blob is
/// not valid JSON. Values that parse as numbers are coerced.
fn permissive_params(blob: &str) -> Map<String, Value> {
    let inner = blob.trim().trim_start_matches('{').trim_end_matches('}');
    let mut params = Map::new();
    for piece in inner.split(',') {
        let Some((key, value)) = piece.split_once('=').or_else(|| piece.split_once(':')) else {
            continue;
        };
        let key = key.trim().trim_matches('"').trim_matches('\'');
        if key.is_empty() {
            continue;
        }
        let value = value.trim().trim_matches('"').trim_matches('\'');
        params.insert(key.to_string(), coerce_value(value));
    }
    params
}

fn coerce_value(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<f64>() {
        if let Some(num) = Number::from_f64(n) {
            return Value::Number(num);
        }
    }
    Value::String(raw.to_string())
}

fn substitute_placeholders(params: &mut Map<String, Value>, invoker: &str) {
    for value in params.values_mut() {
        let Value::String(s) = value else { continue };
        if matches!(s.as_str(), "USERNAME" | "USER" | "PLAYER") {
            *value = Value::String(invoker.to_string());
        }
    }
}

/// Strategy 4: `//name(k=v, ...); other(1, 2, 3)` shorthand. Bare numeric args
/// fill `x`, `y`, `z` positionally in order of appearance.
fn directive_actions(text: &str) -> Vec<ActionWire> {
    let Some(marker) = text.find(DIRECTIVE_MARKER) else {
        return Vec::new();
    };
    let rest = &text[marker + DIRECTIVE_MARKER.len()..];
    let line = rest.lines().next().unwrap_or(rest);

    let mut out = Vec::new();
    for tuple in line.split(';') {
        if let Some(action) = parse_directive_tuple(tuple) {
            out.push(action);
        }
    }
    out
}

fn parse_directive_tuple(tuple: &str) -> Option<ActionWire> {
    let tuple = tuple.trim();
    if tuple.is_empty() {
        return None;
    }

    let (name, args) = match tuple.split_once('(') {
        Some((name, rest)) => (name.trim(), rest.rfind(')').map(|i| &rest[..i]).unwrap_or(rest)),
        None => (tuple, ""),
    };
    if name.is_empty() {
        return None;
    }

    let mut params = Map::new();
    let positional = ["x", "y", "z"];
    let mut next_positional = 0usize;
    for arg in args.split(',') {
        let arg = arg.trim();
        if arg.is_empty() {
            continue;
        }
        if let Some((key, value)) = arg.split_once('=') {
            let key = key.trim().trim_matches('"').trim_matches('\'');
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !key.is_empty() {
                params.insert(key.to_string(), coerce_value(value));
            }
        } else if let Ok(n) = arg.parse::<f64>() {
            if next_positional < positional.len() {
                if let Some(num) = Number::from_f64(n) {
                    params.insert(positional[next_positional].to_string(), Value::Number(num));
                    next_positional += 1;
                }
            }
        }
    }

    Some(ActionWire {
        name: name.to_string(),
        params,
        rationale: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const INVOKER: &str = "Steve";

    #[test]
    fn empty_and_garbage_inputs_yield_empty() {
        for text in [
            "",
            "   ",
            "no structure here",
            "{{{{{{",
            "}}}}{{",
            "{\"plan\": {\"steps\": [",
            "```json\n{\"plan\":",
            "\u{fffd}\u{0}garbage\u{7f}",
        ] {
            assert!(
                extract(text, ExtractMode::Plan, INVOKER).is_empty(),
                "expected empty for {text:?}"
            );
        }
    }

    #[test]
    fn extraction_is_idempotent() {
        let text = "prose {\"plan\":{\"steps\":[{\"name\":\"dig\",\"params\":{\"x\":1,\"y\":2,\"z\":3}}]}} more";
        let a = extract(text, ExtractMode::Plan, INVOKER);
        let b = extract(text, ExtractMode::Plan, INVOKER);
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn fenced_plan_wins_over_directive_line() {
        let text = "```json\n{\"plan\":{\"steps\":[{\"name\":\"inspect\",\"params\":{\"x\":1,\"y\":2,\"z\":3}}]}}\n```\n//dig(x=5,y=5,z=5)";
        let actions = extract(text, ExtractMode::Plan, INVOKER);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "inspect");
        assert_eq!(actions[0].params.get("x"), Some(&json!(1)));
        assert_eq!(actions[0].params.get("y"), Some(&json!(2)));
        assert_eq!(actions[0].params.get("z"), Some(&json!(3)));
    }

    #[test]
    fn fenced_block_without_tag_parses() {
        let text = "```\n{\"actions\":[{\"name\":\"status\"}]}\n```";
        let actions = extract(text, ExtractMode::Actions, INVOKER);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "status");
    }

    #[test]
    fn inline_json_is_found_amid_prose() {
        let text = "Sure! I'll do this: {\"plan\":{\"steps\":[{\"name\":\"goto\",\"params\":{\"x\":10,\"y\":64,\"z\":-3}}]}} Sound good?";
        let actions = extract(text, ExtractMode::Plan, INVOKER);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "goto");
    }

    #[test]
    fn inline_scan_survives_braces_inside_strings() {
        let text = "{\"actions\":[{\"name\":\"command\",\"params\":{\"command\":\"/say {hi}\"}}]}";
        let actions = extract(text, ExtractMode::Actions, INVOKER);
        assert_eq!(actions.len(), 1);
        assert_eq!(
            actions[0].params.get("command"),
            Some(&json!("/say {hi}"))
        );
    }

    #[test]
    fn freetext_block_with_json_params() {
        let text = "Action: goto\nParams: {\"x\": 4, \"y\": 64, \"z\": 9}";
        let actions = extract(text, ExtractMode::Plan, INVOKER);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "goto");
        assert_eq!(actions[0].params.get("y"), Some(&json!(64)));
    }

    #[test]
    fn freetext_falls_back_to_permissive_splitter() {
        let text = "Action: gotoplayer Params: {player=USERNAME, speed=2}";
        let actions = extract(text, ExtractMode::Actions, INVOKER);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].params.get("player"), Some(&json!("Steve")));
        assert_eq!(actions[0].params.get("speed"), Some(&json!(2.0)));
    }

    #[test]
    fn freetext_command_patterns_deduplicate() {
        let text = r#"run "command": "/time set day" or command("/time set day") either way"#;
        let actions = extract(text, ExtractMode::Actions, INVOKER);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "command");
        assert_eq!(
            actions[0].params.get("command"),
            Some(&json!("/time set day"))
        );
    }

    #[test]
    fn directive_line_keyword_args() {
        let actions = extract("//dig(x=5, y=12, z=-4)", ExtractMode::Directive, INVOKER);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "dig");
        assert_eq!(actions[0].params.get("x"), Some(&json!(5.0)));
        assert_eq!(actions[0].params.get("z"), Some(&json!(-4.0)));
    }

    #[test]
    fn directive_line_positional_args_fill_xyz() {
        let actions = extract("//goto(1, 2, 3); status", ExtractMode::Directive, INVOKER);
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].params.get("x"), Some(&json!(1.0)));
        assert_eq!(actions[0].params.get("y"), Some(&json!(2.0)));
        assert_eq!(actions[0].params.get("z"), Some(&json!(3.0)));
        assert_eq!(actions[1].name, "status");
        assert!(actions[1].params.is_empty());
    }

    #[test]
    fn directive_line_strips_quotes_and_coerces() {
        let actions = extract(
            "chat says //gotoplayer(player=\"Alex\"); goto(x=1,y=2,z=3)",
            ExtractMode::Directive,
            INVOKER,
        );
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].params.get("player"), Some(&json!("Alex")));
        assert_eq!(actions[1].params.get("y"), Some(&json!(2.0)));
    }

    #[test]
    fn plan_mode_ignores_actions_key_and_vice_versa() {
        let actions_msg = "{\"actions\":[{\"name\":\"status\"}]}";
        assert!(extract(actions_msg, ExtractMode::Plan, INVOKER).is_empty());
        let plan_msg = "{\"plan\":{\"steps\":[{\"name\":\"status\"}]}}";
        assert!(extract(plan_msg, ExtractMode::Actions, INVOKER).is_empty());
    }

    #[test]
    fn steps_with_empty_names_are_filtered() {
        let text = "{\"plan\":{\"steps\":[{\"name\":\"\"},{\"name\":\"goto\",\"params\":{\"x\":1,\"y\":2,\"z\":3}}]}}";
        let actions = extract(text, ExtractMode::Plan, INVOKER);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "goto");
    }

    #[test]
    fn deeply_nested_braces_do_not_panic() {
        let mut text = String::from("{\"plan\":");
        for _ in 0..200 {
            text.push('{');
        }
        assert!(extract(&text, ExtractMode::Plan, INVOKER).is_empty());
    }
}
