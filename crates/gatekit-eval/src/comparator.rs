// crates/gatekit-eval/src/comparator.rs
// ============================================================================
// Module: Gatekit Comparator Evaluation
// Description: Operator dispatch for condition evaluation.
// Purpose: §4.E "Operators" table.
// Dependencies: gatekit-core (value coercion, version comparison, temporal
// parsing), regex
// ============================================================================

//! ## Overview
//! Every operator except `in_segment_list`/`not_in_segment_list` (which
//! needs a snapshot-backed id-list lookup, handled in
//! [`crate::conditions`]) is dispatched here. An operator name this crate
//! does not recognize returns [`TriState::Unknown`] — that is a spec-shape
//! problem the caller must mark `unsupported`. A *recognized* operator
//! given a value it cannot meaningfully compare (wrong shape, absent,
//! non-numeric where a number is required, …) returns [`TriState::False`]:
//! per §4.E, an incomparable value just means the condition does not hold,
//! it is not a reason to abandon the rest of the spec.

use std::cmp::Ordering;

use gatekit_core::DynamicValue;
use gatekit_core::time_parse::compare_temporal;
use gatekit_core::value::compare_numeric;
use gatekit_core::version::compare_versions;
use regex::Regex;
use serde_json::Value;

use crate::tristate::TriState;

/// Dispatches a named operator against a resolved field value and the
/// condition's target value.
#[must_use]
pub fn evaluate_operator(
    operator: &str,
    value: &DynamicValue,
    target: &Value,
    compiled_pattern: Option<&Regex>,
) -> TriState {
    match operator {
        "gt" => numeric_ordering(value, target, Ordering::is_gt),
        "gte" => numeric_ordering(value, target, Ordering::is_ge),
        "lt" => numeric_ordering(value, target, Ordering::is_lt),
        "lte" => numeric_ordering(value, target, Ordering::is_le),
        "version_gt" => version_ordering(value, target, Ordering::is_gt),
        "version_gte" => version_ordering(value, target, Ordering::is_ge),
        "version_lt" => version_ordering(value, target, Ordering::is_lt),
        "version_lte" => version_ordering(value, target, Ordering::is_le),
        "version_eq" => version_ordering(value, target, Ordering::is_eq),
        "version_neq" => version_ordering(value, target, |o| !o.is_eq()),
        "any" => set_membership(value, target, false, true),
        "none" => set_membership(value, target, false, false),
        "any_case_sensitive" => set_membership(value, target, true, true),
        "none_case_sensitive" => set_membership(value, target, true, false),
        "array_contains_any" => array_contains(value, target, ArrayMode::Any),
        "array_contains_all" => array_contains(value, target, ArrayMode::All),
        "array_contains_none" => array_contains(value, target, ArrayMode::None),
        "not_array_contains_all" => negate(array_contains(value, target, ArrayMode::All)),
        "str_starts_with_any" => str_with_any(value, target, |haystack, needle| {
            haystack.starts_with(needle)
        }),
        "str_ends_with_any" => {
            str_with_any(value, target, |haystack, needle| haystack.ends_with(needle))
        }
        "str_contains_any" => {
            str_with_any(value, target, |haystack, needle| haystack.contains(needle))
        }
        "str_contains_none" => negate(str_with_any(value, target, |haystack, needle| {
            haystack.contains(needle)
        })),
        "str_matches" => str_matches(value, compiled_pattern),
        "eq" => deep_equals(value, target),
        "neq" => negate(deep_equals(value, target)),
        "before" => temporal_ordering(value, target, Ordering::is_lt),
        "after" => temporal_ordering(value, target, Ordering::is_gt),
        "on" => temporal_ordering(value, target, Ordering::is_eq),
        _ => TriState::Unknown,
    }
}

fn negate(state: TriState) -> TriState {
    match state {
        TriState::True => TriState::False,
        TriState::False => TriState::True,
        TriState::Unknown => TriState::Unknown,
    }
}

fn numeric_ordering(
    value: &DynamicValue,
    target: &Value,
    predicate: impl Fn(Ordering) -> bool,
) -> TriState {
    let target = DynamicValue::from_json(target);
    match compare_numeric(value, &target) {
        Some(ordering) => TriState::from(predicate(ordering)),
        None => TriState::False,
    }
}

fn version_ordering(
    value: &DynamicValue,
    target: &Value,
    predicate: impl Fn(Ordering) -> bool,
) -> TriState {
    let (Some(left), Some(right)) = (as_str(value), target.as_str()) else {
        return TriState::False;
    };
    TriState::from(predicate(compare_versions(left, right)))
}

fn temporal_ordering(
    value: &DynamicValue,
    target: &Value,
    predicate: impl Fn(Ordering) -> bool,
) -> TriState {
    let (Some(left), Some(right)) = (as_str(value), target.as_str()) else {
        return TriState::False;
    };
    match compare_temporal(left, right) {
        Some(ordering) => TriState::from(predicate(ordering)),
        None => TriState::False,
    }
}

fn as_str(value: &DynamicValue) -> Option<&str> {
    match value {
        DynamicValue::String(text) => Some(text.as_str()),
        _ => None,
    }
}

/// `any`/`none` set-membership, optionally case-sensitive.
fn set_membership(value: &DynamicValue, target: &Value, case_sensitive: bool, want_any: bool) -> TriState {
    let Value::Array(candidates) = target else {
        return TriState::False;
    };
    let rendered = gatekit_core::value::coerce_string(value);
    let rendered = if case_sensitive { rendered } else { rendered.to_ascii_lowercase() };
    let is_member = candidates.iter().any(|candidate| {
        let Some(candidate) = candidate.as_str() else {
            return false;
        };
        if case_sensitive {
            candidate == rendered
        } else {
            candidate.eq_ignore_ascii_case(&rendered)
        }
    });
    TriState::from(is_member == want_any)
}

/// Mode for [`array_contains`].
enum ArrayMode {
    Any,
    All,
    None,
}

fn array_contains(value: &DynamicValue, target: &Value, mode: ArrayMode) -> TriState {
    let DynamicValue::List(items) = value else {
        return TriState::False;
    };
    let Value::Array(candidates) = target else {
        return TriState::False;
    };
    let rendered: Vec<String> = items.iter().map(gatekit_core::value::coerce_string).collect();
    let candidate_strings: Vec<&str> = candidates.iter().filter_map(Value::as_str).collect();

    let outcome = match mode {
        ArrayMode::Any => candidate_strings.iter().any(|c| rendered.iter().any(|r| r == c)),
        ArrayMode::All => candidate_strings.iter().all(|c| rendered.iter().any(|r| r == c)),
        ArrayMode::None => !candidate_strings.iter().any(|c| rendered.iter().any(|r| r == c)),
    };
    TriState::from(outcome)
}

fn str_with_any(
    value: &DynamicValue,
    target: &Value,
    predicate: impl Fn(&str, &str) -> bool,
) -> TriState {
    let Value::Array(candidates) = target else {
        return TriState::False;
    };
    let haystack = gatekit_core::value::coerce_string(value).to_ascii_lowercase();
    let matched = candidates.iter().any(|candidate| {
        candidate
            .as_str()
            .is_some_and(|needle| predicate(&haystack, &needle.to_ascii_lowercase()))
    });
    TriState::from(matched)
}

fn str_matches(value: &DynamicValue, compiled_pattern: Option<&Regex>) -> TriState {
    let Some(pattern) = compiled_pattern else {
        return TriState::False;
    };
    let haystack = gatekit_core::value::coerce_string(value);
    TriState::from(pattern.is_match(&haystack))
}

/// Deep-equal comparison with the `nil` target matching `""`/`nil` rule
/// from §4.E.
fn deep_equals(value: &DynamicValue, target: &Value) -> TriState {
    if target.is_null() {
        let is_nil_like = matches!(value, DynamicValue::Null)
            || matches!(value, DynamicValue::String(text) if text.is_empty());
        return TriState::from(is_nil_like);
    }
    if let Some(ordering) = compare_numeric(value, &DynamicValue::from_json(target)) {
        return TriState::from(ordering.is_eq());
    }
    let rendered = gatekit_core::value::coerce_string(value);
    let target_rendered = gatekit_core::value::coerce_string(&DynamicValue::from_json(target));
    TriState::from(rendered == target_rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn gt_compares_numerically() {
        let value = DynamicValue::Int64(10);
        assert_eq!(evaluate_operator("gt", &value, &json!(5), None), TriState::True);
        assert_eq!(evaluate_operator("gt", &value, &json!(20), None), TriState::False);
    }

    #[test]
    fn version_eq_ignores_prerelease_suffix() {
        let value = DynamicValue::String("1.2.3-beta".to_string());
        assert_eq!(evaluate_operator("version_eq", &value, &json!("1.2.3"), None), TriState::True);
    }

    #[test]
    fn any_case_sensitive_requires_exact_case() {
        let value = DynamicValue::String("Pro".to_string());
        assert_eq!(
            evaluate_operator("any_case_sensitive", &value, &json!(["pro", "free"]), None),
            TriState::False
        );
        assert_eq!(evaluate_operator("any", &value, &json!(["pro", "free"]), None), TriState::True);
    }

    #[test]
    fn eq_treats_null_target_as_empty_string() {
        let value = DynamicValue::String(String::new());
        assert_eq!(evaluate_operator("eq", &value, &Value::Null, None), TriState::True);
    }

    #[test]
    fn unknown_operator_is_unknown() {
        let value = DynamicValue::Int64(1);
        assert_eq!(evaluate_operator("not_a_real_operator", &value, &json!(1), None), TriState::Unknown);
    }

    #[test]
    fn str_matches_uses_precompiled_pattern() {
        let pattern = Regex::new("^a.*z$").expect("compiles");
        let value = DynamicValue::String("abcz".to_string());
        assert_eq!(evaluate_operator("str_matches", &value, &Value::Null, Some(&pattern)), TriState::True);
    }

    #[test]
    fn array_contains_all_requires_every_candidate() {
        let value = DynamicValue::List(vec![
            DynamicValue::String("a".to_string()),
            DynamicValue::String("b".to_string()),
        ]);
        assert_eq!(
            evaluate_operator("array_contains_all", &value, &json!(["a", "b"]), None),
            TriState::True
        );
        assert_eq!(
            evaluate_operator("array_contains_all", &value, &json!(["a", "c"]), None),
            TriState::False
        );
    }
}
