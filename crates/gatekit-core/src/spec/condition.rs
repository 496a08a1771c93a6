// crates/gatekit-core/src/spec/condition.rs
// ============================================================================
// Module: Gatekit Condition Model
// Description: Wire and installed representations of a rule condition.
// Purpose: §3 DATA MODEL "Condition", §4.B pre-parse contract for
// `user_bucket` membership sets and `str_matches` patterns.
// Dependencies: regex, serde_json
// ============================================================================

//! ## Overview
//! [`WireCondition`] is the literal wire shape; [`Condition`] is the
//! installed, pre-computed form the evaluator actually consults.
//! Pre-computation happens once, at spec-install time
//! ([`Condition::from_wire`]), never per evaluation call:
//! - `any`/`none` conditions of type `user_bucket` get a pre-built `i64`
//!   membership set from the declared bucket array.
//! - `str_matches` conditions get a pre-compiled [`regex::Regex`].

use std::collections::BTreeSet;
use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::identifiers::IdType;

/// The condition kinds recognized by the evaluator (§4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    /// Always evaluates to true.
    Public,
    /// Recursive gate evaluation, requiring the target to pass.
    PassGate,
    /// Recursive gate evaluation, requiring the target to fail.
    FailGate,
    /// User's IP-derived attribute (directly present or via lookup).
    IpBased,
    /// User's User-Agent-derived attribute.
    UaBased,
    /// An arbitrary top-level or custom user attribute.
    UserField,
    /// A key in `user.environment`.
    EnvironmentField,
    /// The current wall-clock time.
    CurrentTime,
    /// The precomputed bucketing value for this user/salt/idType.
    UserBucket,
    /// The resolved unit id itself.
    UnitId,
    /// The resolved target application id.
    TargetApp,
    /// Any other condition type the current evaluator version does not
    /// recognize; always yields `unsupported = true`.
    #[serde(other)]
    Unrecognized,
}

/// The wire (pre-installation) shape of a condition, exactly mirroring the
/// JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireCondition {
    /// Condition kind.
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    /// Comparator/operator name, if any (absence means "exists"-style
    /// conditions like `public`).
    #[serde(default)]
    pub operator: Option<String>,
    /// Field name consulted for `user_field`/`environment_field` conditions.
    #[serde(default)]
    pub field: Option<String>,
    /// Comparison target: scalar, list, or arbitrary JSON.
    #[serde(default)]
    pub target_value: Value,
    /// Auxiliary values (e.g. `salt` for `user_bucket`).
    #[serde(default)]
    pub additional_values: Value,
    /// Id type used for bucketing-flavored conditions.
    #[serde(default)]
    pub id_type: IdType,
}

/// The installed, pre-computed form of a condition.
///
/// # Invariants
/// - `user_bucket_set` is populated only when `operator` is `any`/`none` and
///   `condition_type` is [`ConditionType::UserBucket`]; the evaluator MUST
///   consult it rather than re-deriving membership from `target_value`.
/// - `compiled_pattern` is populated only for `operator == "str_matches"`;
///   the evaluator MUST consult it rather than recompiling per call.
#[derive(Debug, Clone)]
pub struct Condition {
    /// Condition kind.
    pub condition_type: ConditionType,
    /// Comparator/operator name.
    pub operator: Option<String>,
    /// Field name for field-oriented conditions.
    pub field: Option<String>,
    /// Comparison target value.
    pub target_value: Value,
    /// Auxiliary values (e.g. bucketing salt).
    pub additional_values: Value,
    /// Id type used for bucketing-flavored conditions.
    pub id_type: IdType,
    /// Pre-built integer membership set for `any`/`none` + `user_bucket`.
    pub user_bucket_set: Option<Arc<BTreeSet<i64>>>,
    /// Pre-compiled pattern for `str_matches`.
    pub compiled_pattern: Option<Arc<Regex>>,
}

impl Condition {
    /// Installs a [`WireCondition`], performing the one-time §4.B
    /// pre-computation.
    #[must_use]
    pub fn from_wire(wire: WireCondition) -> Self {
        let user_bucket_set = build_user_bucket_set(&wire);
        let compiled_pattern = build_compiled_pattern(&wire);
        Self {
            condition_type: wire.condition_type,
            operator: wire.operator,
            field: wire.field,
            target_value: wire.target_value,
            additional_values: wire.additional_values,
            id_type: wire.id_type,
            user_bucket_set,
            compiled_pattern,
        }
    }
}

/// Builds the pre-parsed `any`/`none` membership set for `user_bucket`
/// conditions, casting each declared bucket value to `i64`.
fn build_user_bucket_set(wire: &WireCondition) -> Option<Arc<BTreeSet<i64>>> {
    if wire.condition_type != ConditionType::UserBucket {
        return None;
    }
    let is_set_operator = matches!(wire.operator.as_deref(), Some("any") | Some("none"));
    if !is_set_operator {
        return None;
    }
    let Value::Array(items) = &wire.target_value else {
        return None;
    };
    let set: BTreeSet<i64> = items
        .iter()
        .filter_map(|item| item.as_i64().or_else(|| item.as_f64().map(|float| float as i64)))
        .collect();
    Some(Arc::new(set))
}

/// Compiles the `str_matches` pattern once, at install time.
fn build_compiled_pattern(wire: &WireCondition) -> Option<Arc<Regex>> {
    if wire.operator.as_deref() != Some("str_matches") {
        return None;
    }
    let pattern = wire.target_value.as_str()?;
    Regex::new(pattern).ok().map(Arc::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_user_bucket_set_for_any_operator() {
        let wire = WireCondition {
            condition_type: ConditionType::UserBucket,
            operator: Some("any".to_string()),
            field: None,
            target_value: json!([1, 2, 3]),
            additional_values: json!({}),
            id_type: IdType::new(""),
        };
        let condition = Condition::from_wire(wire);
        let set = condition.user_bucket_set.expect("set built");
        assert!(set.contains(&2));
        assert!(!set.contains(&99));
    }

    #[test]
    fn compiles_str_matches_pattern() {
        let wire = WireCondition {
            condition_type: ConditionType::UserField,
            operator: Some("str_matches".to_string()),
            field: Some("email".to_string()),
            target_value: json!("^a.*z$"),
            additional_values: json!({}),
            id_type: IdType::new(""),
        };
        let condition = Condition::from_wire(wire);
        let pattern = condition.compiled_pattern.expect("pattern compiled");
        assert!(pattern.is_match("abcz"));
        assert!(!pattern.is_match("zzza"));
    }

    #[test]
    fn non_bucket_condition_has_no_precomputed_set() {
        let wire = WireCondition {
            condition_type: ConditionType::Public,
            operator: None,
            field: None,
            target_value: Value::Null,
            additional_values: Value::Null,
            id_type: IdType::new(""),
        };
        let condition = Condition::from_wire(wire);
        assert!(condition.user_bucket_set.is_none());
        assert!(condition.compiled_pattern.is_none());
    }
}
