// crates/gatekit-core/src/value.rs
// ============================================================================
// Module: Gatekit Dynamic Value
// Description: Tagged value type for user attributes and condition target
// values, plus the numeric/string coercion routines that operate over it.
// Purpose: Give condition evaluation a single dynamically-typed currency
// instead of matching on `serde_json::Value` shapes ad hoc at every call site.
// Dependencies: bigdecimal, serde_json
// ============================================================================

//! ## Overview
//! User attributes and condition `targetValue`s are dynamically typed in the
//! wire format: a field might be a number, a numeric string, a list, or
//! absent entirely. [`DynamicValue`] gives evaluation code one type to match
//! on, and [`coerce_numeric`]/[`coerce_string`] implement the permissive
//! coercions the comparator operators rely on.

use std::cmp::Ordering;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::Value;

/// A dynamically-typed scalar or collection value.
///
/// # Invariants
/// - `Int64` and `Float64` are kept distinct only to preserve round-trip
///   fidelity; comparisons between them always go through [`coerce_numeric`].
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicValue {
    /// Absence of a value (missing field, JSON `null`).
    Null,
    /// A boolean scalar.
    Bool(bool),
    /// A signed 64-bit integer scalar.
    Int64(i64),
    /// A floating point scalar.
    Float64(f64),
    /// A UTF-8 string scalar.
    String(String),
    /// An ordered list of dynamic values.
    List(Vec<DynamicValue>),
    /// An arbitrary JSON object, kept as-is for structural comparators.
    Object(Value),
}

impl DynamicValue {
    /// Converts a `serde_json::Value` into a [`DynamicValue`].
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(*flag),
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Self::Int64(int)
                } else {
                    Self::Float64(number.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(text) => Self::String(text.clone()),
            Value::Array(items) => {
                Self::List(items.iter().map(DynamicValue::from_json).collect())
            }
            object @ Value::Object(_) => Self::Object(object.clone()),
        }
    }

    /// Returns true if this value is [`DynamicValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Coerces a [`DynamicValue`] into a [`BigDecimal`] for decimal-aware
/// numeric comparison.
///
/// Accepts integers, floats, and numeric strings. Returns `None` when
/// neither operand is representable as a number, matching the "failure if
/// neither side is numeric" contract.
#[must_use]
pub fn coerce_numeric(value: &DynamicValue) -> Option<BigDecimal> {
    match value {
        DynamicValue::Int64(int) => BigDecimal::from_str(&int.to_string()).ok(),
        DynamicValue::Float64(float) => {
            if float.is_finite() {
                BigDecimal::from_str(&float.to_string()).ok()
            } else {
                None
            }
        }
        DynamicValue::String(text) => BigDecimal::from_str(text.trim()).ok(),
        DynamicValue::Bool(_) | DynamicValue::Null | DynamicValue::List(_) | DynamicValue::Object(_) => {
            None
        }
    }
}

/// Orders two dynamic values numerically, or returns `None` when either side
/// fails to coerce to a number.
#[must_use]
pub fn compare_numeric(left: &DynamicValue, right: &DynamicValue) -> Option<Ordering> {
    let left = coerce_numeric(left)?;
    let right = coerce_numeric(right)?;
    Some(left.cmp(&right))
}

/// Renders a [`DynamicValue`] to a string using the SDK's permissive string
/// coercion: booleans render as `"true"`/`"false"`, numbers render in their
/// shortest round-trip form, lists render comma-joined, and `Null` renders
/// as the empty string.
#[must_use]
pub fn coerce_string(value: &DynamicValue) -> String {
    match value {
        DynamicValue::Null => String::new(),
        DynamicValue::Bool(flag) => flag.to_string(),
        DynamicValue::Int64(int) => int.to_string(),
        DynamicValue::Float64(float) => format_shortest_round_trip(*float),
        DynamicValue::String(text) => text.clone(),
        DynamicValue::List(items) => {
            items.iter().map(coerce_string).collect::<Vec<_>>().join(",")
        }
        DynamicValue::Object(value) => value.to_string(),
    }
}

/// Formats a float using Rust's shortest round-trip `Display` impl, which
/// matches the "shortest round-trip" string coercion contract.
fn format_shortest_round_trip(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "guarded by the fract()==0.0 and magnitude check above"
        )]
        let as_int = value as i64;
        as_int.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_numeric_string_and_number_equal() {
        let from_string = DynamicValue::String("42".to_string());
        let from_number = DynamicValue::Int64(42);
        assert_eq!(compare_numeric(&from_string, &from_number), Some(Ordering::Equal));
    }

    #[test]
    fn non_numeric_fails_to_coerce() {
        let value = DynamicValue::from_json(&json!("not-a-number"));
        assert!(coerce_numeric(&value).is_none());
    }

    #[test]
    fn coerce_string_matches_contract() {
        assert_eq!(coerce_string(&DynamicValue::Null), "");
        assert_eq!(coerce_string(&DynamicValue::Bool(true)), "true");
        assert_eq!(coerce_string(&DynamicValue::Float64(1.0)), "1");
        assert_eq!(
            coerce_string(&DynamicValue::List(vec![
                DynamicValue::Int64(1),
                DynamicValue::Int64(2)
            ])),
            "1,2"
        );
    }
}
