// crates/gatekit-core/src/version.rs
// ============================================================================
// Module: Gatekit Version Comparison
// Description: Dotted-component version string comparison for the
// `version_{gt,gte,lt,lte,eq,neq}` condition operators.
// Purpose: Match the source SDK's lenient version comparator exactly.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Version comparisons strip any `-suffix` (pre-release/build metadata),
//! then compare dot-separated components lexicographically as signed
//! 64-bit integers, zero-padding the shorter side. Non-numeric components
//! compare as `0` to stay permissive rather than fail the whole comparison.

use std::cmp::Ordering;

/// Strips a trailing `-suffix` (first `-` onward) from a version string.
fn strip_suffix(version: &str) -> &str {
    version.split('-').next().unwrap_or(version)
}

/// Compares two version strings per the SDK's lenient contract.
///
/// # Invariants
/// - The shorter component list is zero-padded, so `"1.2"` equals `"1.2.0"`.
/// - Non-numeric components parse as `0` rather than failing the comparison.
#[must_use]
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let left = strip_suffix(left);
    let right = strip_suffix(right);

    let left_parts: Vec<i64> = left.split('.').map(parse_component).collect();
    let right_parts: Vec<i64> = right.split('.').map(parse_component).collect();
    let len = left_parts.len().max(right_parts.len());

    for index in 0..len {
        let left_value = left_parts.get(index).copied().unwrap_or(0);
        let right_value = right_parts.get(index).copied().unwrap_or(0);
        match left_value.cmp(&right_value) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Parses a single dotted version component, defaulting non-numeric
/// components to `0`.
fn parse_component(component: &str) -> i64 {
    component.trim().parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prerelease_suffix() {
        assert_eq!(compare_versions("1.2.3-beta", "1.2.3"), Ordering::Equal);
    }

    #[test]
    fn pads_shorter_side_with_zeros() {
        assert_eq!(compare_versions("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.2", "1.2.1"), Ordering::Less);
    }

    #[test]
    fn compares_numerically_not_lexicographically() {
        assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
    }

    #[test]
    fn non_numeric_components_do_not_panic() {
        assert_eq!(compare_versions("1.x.0", "1.0.0"), Ordering::Equal);
    }
}
