use std::fmt;

use serde_json::{Map, Value};

use super::game_api::Vec3;
use super::wire::{canonical_name, classify, finite_coord, ActionKind, ActionWire};

/// Why a step was rejected. Reason strings are stable: they surface on the
/// notice channel and tests match on them.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    MissingName,
    MissingCoordinates,
    OutOfRange { distance: f64, max: f64 },
    UnsupportedStep(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingName => write!(f, "missing action name"),
            RejectReason::MissingCoordinates => write!(f, "missing coordinates"),
            RejectReason::OutOfRange { distance, max } => {
                write!(f, "out of range: {distance:.1} > {max:.1}")
            }
            RejectReason::UnsupportedStep(name) => {
                write!(f, "unsupported step type: {name}")
            }
        }
    }
}

impl std::error::Error for RejectReason {}

/// A step that passed validation. Immutable from here on: the executor never
/// rewrites `params` after this point.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedStep {
    pub name: String,
    pub kind: ActionKind,
    pub params: Map<String, Value>,
    pub rationale: Option<String>,
}

/// Validates one step against the whitelist and the per-step distance bound.
///
/// The distance is evaluated against `agent_pos` at the moment the step is
/// about to execute, not once for the whole plan. Never panics.
pub fn validate_step(
    step: &ActionWire,
    agent_pos: Vec3,
    max_distance: f64,
) -> Result<ValidatedStep, RejectReason> {
    if step.name.trim().is_empty() {
        return Err(RejectReason::MissingName);
    }
    let name = canonical_name(&step.name);
    let kind = classify(&name);

    if kind == ActionKind::Primitive {
        let target = match (
            finite_coord(&step.params, "x"),
            finite_coord(&step.params, "y"),
            finite_coord(&step.params, "z"),
        ) {
            (Some(x), Some(y), Some(z)) => Vec3 { x, y, z },
            _ => return Err(RejectReason::MissingCoordinates),
        };
        let distance = agent_pos.distance_to(target);
        if distance > max_distance {
            return Err(RejectReason::OutOfRange {
                distance,
                max: max_distance,
            });
        }
    }

    if kind == ActionKind::Unknown {
        return Err(RejectReason::UnsupportedStep(name));
    }

    Ok(ValidatedStep {
        name,
        kind,
        params: step.params.clone(),
        rationale: step.rationale.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(name: &str, coords: Option<(f64, f64, f64)>) -> ActionWire {
        let mut s = ActionWire::named(name);
        if let Some((x, y, z)) = coords {
            s.params.insert("x".to_string(), json!(x));
            s.params.insert("y".to_string(), json!(y));
            s.params.insert("z".to_string(), json!(z));
        }
        s
    }

    const ORIGIN: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[test]
    fn in_range_goto_is_accepted_and_normalized() {
        let v = validate_step(&step("GoTo", Some((5.0, 0.0, 5.0))), ORIGIN, 10.0).unwrap();
        assert_eq!(v.name, "goto");
        assert_eq!(v.kind, ActionKind::Primitive);
    }

    #[test]
    fn out_of_range_goto_is_rejected() {
        let err = validate_step(&step("goto", Some((20.0, 0.0, 0.0))), ORIGIN, 10.0).unwrap_err();
        assert!(matches!(err, RejectReason::OutOfRange { .. }));
        assert!(err.to_string().starts_with("out of range"));
    }

    #[test]
    fn primitive_without_coordinates_is_rejected() {
        let err = validate_step(&step("dig", None), ORIGIN, 10.0).unwrap_err();
        assert_eq!(err, RejectReason::MissingCoordinates);
        assert_eq!(err.to_string(), "missing coordinates");

        let mut partial = step("dig", None);
        partial.params.insert("x".to_string(), json!(1));
        partial.params.insert("y".to_string(), json!(2));
        let err = validate_step(&partial, ORIGIN, 10.0).unwrap_err();
        assert_eq!(err, RejectReason::MissingCoordinates);
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let mut s = step("mine", None);
        s.params.insert("x".to_string(), json!("NaN"));
        s.params.insert("y".to_string(), json!(1));
        s.params.insert("z".to_string(), json!(1));
        let err = validate_step(&s, ORIGIN, 10.0).unwrap_err();
        assert_eq!(err, RejectReason::MissingCoordinates);
    }

    #[test]
    fn unsupported_name_is_rejected_with_stable_reason() {
        let err = validate_step(&step("flyaway", Some((1.0, 1.0, 1.0))), ORIGIN, 10.0).unwrap_err();
        assert_eq!(err, RejectReason::UnsupportedStep("flyaway".to_string()));
        assert!(err.to_string().starts_with("unsupported step type"));
    }

    #[test]
    fn empty_name_is_rejected_first() {
        let err = validate_step(&step("  ", None), ORIGIN, 10.0).unwrap_err();
        assert_eq!(err, RejectReason::MissingName);
    }

    #[test]
    fn compound_and_command_skip_the_geometry_rules() {
        let v = validate_step(&step("status", None), ORIGIN, 10.0).unwrap();
        assert_eq!(v.kind, ActionKind::Compound);
        let v = validate_step(&ActionWire::command("/time set day"), ORIGIN, 10.0).unwrap();
        assert_eq!(v.kind, ActionKind::Command);
    }

    #[test]
    fn aliases_resolve_before_whitelist_checks() {
        let v = validate_step(&step("goto_coords", Some((3.0, 0.0, 4.0))), ORIGIN, 10.0).unwrap();
        assert_eq!(v.name, "goto");
        let v = validate_step(&step("crafttable", None), ORIGIN, 10.0).unwrap();
        assert_eq!(v.name, "ensureworkbench");
    }

    #[test]
    fn distance_uses_the_current_agent_position() {
        let here = Vec3 {
            x: 18.0,
            y: 0.0,
            z: 0.0,
        };
        // Same target rejected from the origin but accepted once the agent moved.
        let s = step("goto", Some((20.0, 0.0, 0.0)));
        assert!(validate_step(&s, ORIGIN, 10.0).is_err());
        assert!(validate_step(&s, here, 10.0).is_ok());
    }
}
