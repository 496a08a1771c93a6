// crates/gatekit-eval/src/conditions.rs
// ============================================================================
// Module: Gatekit Condition Evaluation
// Description: Resolves one condition's value source and applies its
// operator.
// Purpose: §4.E "Condition evaluation" table and field-resolution rules.
// Dependencies: gatekit-core
// ============================================================================

//! ## Overview
//! [`evaluate_condition`] resolves the value a condition's `type` names
//! (§4.E's table), then hands it to [`crate::comparator::evaluate_operator`]
//! — except for the two cases that bypass the generic comparator entirely:
//! `user_bucket` with `any`/`none` (pre-built integer set membership) and
//! `in_segment_list`/`not_in_segment_list` (id-list token membership).
//! `pass_gate`/`fail_gate` recurse back into gate evaluation through a
//! caller-supplied closure, keeping this module free of a direct dependency
//! on [`crate::evaluator::Evaluator`].

use gatekit_core::EvalResult;
use gatekit_core::SecondaryExposure;
use gatekit_core::clock::Clock;
use gatekit_core::hashing::id_list_token;
use gatekit_core::hashing::user_bucket_value;
use gatekit_core::interfaces::IpCountryLookup;
use gatekit_core::interfaces::UserAgentLookup;
use gatekit_core::snapshot::Snapshot;
use gatekit_core::spec::Condition;
use gatekit_core::spec::ConditionType;
use gatekit_core::user::User;
use gatekit_core::value::DynamicValue;
use serde_json::Value;
use serde_json::json;

use crate::comparator::evaluate_operator;
use crate::error::EvaluatorError;
use crate::tristate::TriState;

/// The "segment:" prefix that exempts a `pass_gate`/`fail_gate` target from
/// generating a secondary exposure (§4.E).
const SEGMENT_PREFIX: &str = "segment:";

/// Outcome of evaluating one condition.
pub struct ConditionOutcome {
    /// Whether the condition holds, fails, or is unsupported.
    pub state: TriState,
    /// A secondary exposure produced by a `pass_gate`/`fail_gate`
    /// evaluation, if any.
    pub secondary_exposure: Option<SecondaryExposure>,
    /// Whether this condition resolved a dependent gate outside the
    /// `segment:` namespace (feeds the analytical-gates telemetry flag).
    pub is_analytical_gate: bool,
}

impl ConditionOutcome {
    const fn simple(state: TriState) -> Self {
        Self {
            state,
            secondary_exposure: None,
            is_analytical_gate: false,
        }
    }
}

/// Evaluates one condition against `user` within `snapshot`.
///
/// `eval_gate` is invoked for `pass_gate`/`fail_gate` conditions to
/// recursively resolve a dependent gate; the caller is responsible for
/// recursion-depth bookkeeping before invoking this function.
pub fn evaluate_condition(
    condition: &Condition,
    user: &User,
    snapshot: &Snapshot,
    clock: &dyn Clock,
    ip_lookup: Option<&dyn IpCountryLookup>,
    ua_lookup: Option<&dyn UserAgentLookup>,
    target_app_id: Option<&str>,
    mut eval_gate: impl FnMut(&str) -> Result<EvalResult, EvaluatorError>,
) -> Result<ConditionOutcome, EvaluatorError> {
    match condition.condition_type {
        ConditionType::Public => Ok(ConditionOutcome::simple(TriState::True)),
        ConditionType::PassGate | ConditionType::FailGate => {
            evaluate_dependent_gate(condition, &mut eval_gate)
        }
        ConditionType::UserBucket => Ok(ConditionOutcome::simple(evaluate_user_bucket(condition, user))),
        ConditionType::UnitId => {
            let unit_id = user.unit_id(condition.id_type.as_str());
            let value = DynamicValue::String(unit_id);
            Ok(ConditionOutcome::simple(apply_operator(condition, &value)))
        }
        ConditionType::CurrentTime => {
            let value = DynamicValue::Int64(clock.unix_seconds());
            Ok(ConditionOutcome::simple(apply_operator(condition, &value)))
        }
        ConditionType::TargetApp => {
            let app_id = target_app_id.map(str::to_string).unwrap_or_default();
            let value = DynamicValue::String(app_id);
            Ok(ConditionOutcome::simple(apply_operator(condition, &value)))
        }
        ConditionType::EnvironmentField => {
            let field = condition.field.as_deref().unwrap_or_default();
            let resolved = user.environment.get(field).cloned();
            Ok(ConditionOutcome::simple(apply_optional_string(condition, resolved)))
        }
        ConditionType::UserField => {
            let field = condition.field.as_deref().unwrap_or_default();
            let resolved = user.resolve_field(field);
            Ok(ConditionOutcome::simple(apply_optional_json(condition, resolved)))
        }
        ConditionType::IpBased => {
            let field = condition.field.as_deref().unwrap_or_default();
            let resolved = user
                .resolve_field(field)
                .or_else(|| resolve_ip_derived(field, user, ip_lookup));
            Ok(ConditionOutcome::simple(apply_optional_json(condition, resolved)))
        }
        ConditionType::UaBased => {
            let field = condition.field.as_deref().unwrap_or_default();
            let resolved = user
                .resolve_field(field)
                .or_else(|| resolve_ua_derived(field, user, ua_lookup));
            Ok(ConditionOutcome::simple(apply_optional_json(condition, resolved)))
        }
        ConditionType::Unrecognized => Ok(ConditionOutcome::simple(TriState::Unknown)),
    }
    .map(|outcome| attach_segment_list_override(condition, user, snapshot, outcome))
}

/// Handles `pass_gate`/`fail_gate` by recursing into gate evaluation and
/// producing the resulting secondary exposure (unless the target is a
/// `segment:`-prefixed internal gate).
fn evaluate_dependent_gate(
    condition: &Condition,
    eval_gate: &mut impl FnMut(&str) -> Result<EvalResult, EvaluatorError>,
) -> Result<ConditionOutcome, EvaluatorError> {
    let Some(target_name) = condition.target_value.as_str() else {
        return Ok(ConditionOutcome::simple(TriState::Unknown));
    };
    let result = eval_gate(target_name)?;
    let wants_pass = condition.condition_type == ConditionType::PassGate;
    let state = TriState::from(result.value == wants_pass);

    let is_segment = target_name.starts_with(SEGMENT_PREFIX);
    let secondary_exposure = if is_segment {
        None
    } else {
        Some(SecondaryExposure {
            gate: target_name.to_string(),
            gate_value: result.value.to_string(),
            rule_id: result.rule_id.as_str().to_string(),
        })
    };

    Ok(ConditionOutcome {
        state,
        secondary_exposure,
        // Propagates transitively: a gate that itself depends on a
        // non-segment gate still counts, even if this hop is a segment.
        is_analytical_gate: !is_segment || result.evaluation_details.has_seen_analytical_gates,
    })
}

/// Evaluates a `user_bucket` condition, preferring the pre-built integer
/// membership set for `any`/`none` operators over generic string
/// comparison (§4.E).
fn evaluate_user_bucket(condition: &Condition, user: &User) -> TriState {
    let salt = condition
        .additional_values
        .get("salt")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let unit_id = user.unit_id(condition.id_type.as_str());
    let key = format!("{salt}.{unit_id}");
    let bucket = user_bucket_value(&key);

    if let Some(set) = &condition.user_bucket_set {
        let is_member = set.contains(&bucket);
        return match condition.operator.as_deref() {
            Some("any") => TriState::from(is_member),
            Some("none") => TriState::from(!is_member),
            _ => TriState::Unknown,
        };
    }

    let value = DynamicValue::Int64(bucket);
    apply_operator(condition, &value)
}

/// Applies a condition's operator to a resolved value.
fn apply_operator(condition: &Condition, value: &DynamicValue) -> TriState {
    let Some(operator) = condition.operator.as_deref() else {
        return TriState::Unknown;
    };
    evaluate_operator(operator, value, &condition.target_value, condition.compiled_pattern.as_deref())
}

fn apply_optional_string(condition: &Condition, resolved: Option<String>) -> TriState {
    apply_optional_json(condition, resolved.map(Value::String))
}

fn apply_optional_json(condition: &Condition, resolved: Option<Value>) -> TriState {
    match resolved {
        Some(value) => apply_operator(condition, &DynamicValue::from_json(&value)),
        // The field genuinely doesn't exist on this user; that's a failed
        // condition, not an unsupported one (§4.E), so the rule just
        // doesn't match rather than aborting the whole spec.
        None => TriState::False,
    }
}

fn resolve_ip_derived(field: &str, user: &User, lookup: Option<&dyn IpCountryLookup>) -> Option<Value> {
    if !field.eq_ignore_ascii_case("country") {
        return None;
    }
    let ip = user.ip.as_deref()?;
    let lookup = lookup?;
    lookup.lookup_country(ip).map(Value::String)
}

fn resolve_ua_derived(field: &str, user: &User, lookup: Option<&dyn UserAgentLookup>) -> Option<Value> {
    let user_agent = user.user_agent.as_deref()?;
    let lookup = lookup?;
    let normalized = field.to_ascii_lowercase();
    match normalized.as_str() {
        "os" | "osname" => lookup.lookup_os(user_agent).map(Value::String),
        "browser" | "browsername" => lookup.lookup_browser(user_agent).map(Value::String),
        _ => None,
    }
}

/// Overrides the resolved state for `in_segment_list`/`not_in_segment_list`
/// operators, which compare the unit id's membership token against an
/// id-list named in `target_value` rather than anything the generic
/// comparator can express.
fn attach_segment_list_override(
    condition: &Condition,
    user: &User,
    snapshot: &Snapshot,
    outcome: ConditionOutcome,
) -> ConditionOutcome {
    let Some(operator) = condition.operator.as_deref() else {
        return outcome;
    };
    let wants_membership = match operator {
        "in_segment_list" => true,
        "not_in_segment_list" => false,
        _ => return outcome,
    };
    let Some(list_name) = condition.target_value.as_str() else {
        return ConditionOutcome::simple(TriState::Unknown);
    };
    let unit_id = user.unit_id(condition.id_type.as_str());
    let token = id_list_token(&unit_id);
    let state = match snapshot.get_id_list(list_name) {
        Some(list) => TriState::from(list.contains_token(&token) == wants_membership),
        None => TriState::from(!wants_membership),
    };
    ConditionOutcome {
        state,
        secondary_exposure: outcome.secondary_exposure,
        is_analytical_gate: outcome.is_analytical_gate,
    }
}

/// Builds the gate-value JSON a condition that resolves `public` would
/// otherwise need; kept here so downstream callers needing a quick
/// "always-on" condition snippet have a single source (used by tests and
/// the demo fixture only).
#[must_use]
pub fn always_true_target() -> Value {
    json!(true)
}

#[cfg(test)]
mod tests {
    use gatekit_core::clock::SystemClock;
    use gatekit_core::identifiers::IdType;

    use super::*;

    fn user_field_condition(field: &str, operator: &str, target: Value) -> Condition {
        Condition {
            condition_type: ConditionType::UserField,
            operator: Some(operator.to_string()),
            field: Some(field.to_string()),
            target_value: target,
            additional_values: Value::Null,
            id_type: IdType::new(""),
            user_bucket_set: None,
            compiled_pattern: None,
        }
    }

    #[test]
    fn missing_user_field_fails_rather_than_unsupported() {
        let condition = user_field_condition("plan", "eq", json!("pro"));
        let user = User::with_user_id("u1");
        let snapshot = Snapshot::default();
        let clock = SystemClock;
        let outcome = evaluate_condition(&condition, &user, &snapshot, &clock, None, None, None, |_| {
            unreachable!("no pass_gate/fail_gate condition in this test")
        })
        .expect("no recursion, no error path");
        assert_eq!(outcome.state, TriState::False);
    }

    #[test]
    fn unrecognized_condition_type_stays_unsupported() {
        let condition = user_field_condition("plan", "eq", json!("pro"));
        let mut condition = condition;
        condition.condition_type = ConditionType::Unrecognized;
        let user = User::with_user_id("u1");
        let snapshot = Snapshot::default();
        let clock = SystemClock;
        let outcome = evaluate_condition(&condition, &user, &snapshot, &clock, None, None, None, |_| {
            unreachable!("no pass_gate/fail_gate condition in this test")
        })
        .expect("no recursion, no error path");
        assert_eq!(outcome.state, TriState::Unknown);
    }
}
