use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One atomic instruction recovered from model or chat text.
///
/// `name` is matched case-insensitively after canonicalization; `params` keys are
/// free-form but geometry-bound actions require numeric `x`/`y`/`z`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ActionWire {
    pub name: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub rationale: Option<String>,
}

impl ActionWire {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Map::new(),
            rationale: None,
        }
    }

    /// Builds the single-payload command action used by the chat surface.
    pub fn command(payload: impl Into<String>) -> Self {
        let mut params = Map::new();
        params.insert("command".to_string(), Value::String(payload.into()));
        Self {
            name: "command".to_string(),
            params,
            rationale: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct PlanSteps {
    #[serde(default)]
    pub steps: Vec<ActionWire>,
}

/// Planning-path wire message: `{ "plan": { "steps": [...] } }`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PlanWire {
    pub plan: PlanSteps,
}

/// Chat-triggered wire message: `{ "actions": [...] }`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ActionsWire {
    pub actions: Vec<ActionWire>,
}

/// Geometry-bound micro primitives, constrained by the per-step distance check.
pub const PRIMITIVE_NAMES: [&str; 4] = ["inspect", "goto", "dig", "mine"];

/// Higher-level helper routines delegated to the game collaborator.
pub const COMPOUND_NAMES: [&str; 6] = [
    "dropitems",
    "gotoplayer",
    "ensureworkbench",
    "craftwoodpickaxe",
    "craftstonepickaxe",
    "status",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Primitive,
    Compound,
    Command,
    Unknown,
}

/// Lowercases, trims, and folds aliases onto their canonical action name.
pub fn canonical_name(raw: &str) -> String {
    let name = raw.trim().to_ascii_lowercase();
    match name.as_str() {
        "goto_coords" | "move" => "goto".to_string(),
        "crafttable" => "ensureworkbench".to_string(),
        "woodpick" => "craftwoodpickaxe".to_string(),
        "stonepick" => "craftstonepickaxe".to_string(),
        "runcommand" => "command".to_string(),
        _ => name,
    }
}

/// Classifies a canonical name into its capability class.
pub fn classify(canonical: &str) -> ActionKind {
    if PRIMITIVE_NAMES.contains(&canonical) {
        ActionKind::Primitive
    } else if COMPOUND_NAMES.contains(&canonical) {
        ActionKind::Compound
    } else if canonical == "command" {
        ActionKind::Command
    } else {
        ActionKind::Unknown
    }
}

/// Reads a finite numeric param, coercing numeric strings the way the
/// extraction layer does for free text.
pub fn finite_coord(params: &Map<String, Value>, key: &str) -> Option<f64> {
    let v = match params.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

pub fn param_str<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    match params.get(key)? {
        Value::String(s) => Some(s.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_name_folds_aliases() {
        assert_eq!(canonical_name("GOTO_COORDS"), "goto");
        assert_eq!(canonical_name(" Move "), "goto");
        assert_eq!(canonical_name("CraftTable"), "ensureworkbench");
        assert_eq!(canonical_name("woodpick"), "craftwoodpickaxe");
        assert_eq!(canonical_name("stonepick"), "craftstonepickaxe");
        assert_eq!(canonical_name("runCommand"), "command");
        assert_eq!(canonical_name("dig"), "dig");
    }

    #[test]
    fn classify_covers_all_sets() {
        assert_eq!(classify("goto"), ActionKind::Primitive);
        assert_eq!(classify("mine"), ActionKind::Primitive);
        assert_eq!(classify("dropitems"), ActionKind::Compound);
        assert_eq!(classify("status"), ActionKind::Compound);
        assert_eq!(classify("command"), ActionKind::Command);
        assert_eq!(classify("flyaway"), ActionKind::Unknown);
    }

    #[test]
    fn finite_coord_accepts_numbers_and_numeric_strings() {
        let mut params = Map::new();
        params.insert("x".to_string(), json!(4.5));
        params.insert("y".to_string(), json!("64"));
        params.insert("z".to_string(), json!("not a number"));
        assert_eq!(finite_coord(&params, "x"), Some(4.5));
        assert_eq!(finite_coord(&params, "y"), Some(64.0));
        assert_eq!(finite_coord(&params, "z"), None);
        assert_eq!(finite_coord(&params, "w"), None);
    }

    #[test]
    fn plan_wire_tolerates_missing_fields() {
        let plan: PlanWire = serde_json::from_str(
            r#"{"plan":{"steps":[{"name":"goto","params":{"x":1,"y":2,"z":3}}]}}"#,
        )
        .unwrap();
        assert_eq!(plan.plan.steps.len(), 1);
        assert_eq!(plan.plan.steps[0].name, "goto");
        assert!(plan.plan.steps[0].rationale.is_none());

        let bare: ActionWire = serde_json::from_str(r#"{"name":"status"}"#).unwrap();
        assert!(bare.params.is_empty());
    }
}
