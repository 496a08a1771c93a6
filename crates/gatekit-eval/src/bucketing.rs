// crates/gatekit-eval/src/bucketing.rs
// ============================================================================
// Module: Gatekit Bucketing
// Description: Deterministic percentage-based rule bucketing.
// Purpose: §4.E `eval` step 2, `passPercent`.
// Dependencies: gatekit-core (hashing)
// ============================================================================

//! ## Overview
//! `passPercent` decides whether one user passes one rule, deterministically
//! and without any external state: the same `(spec.salt, rule, user)` triple
//! always buckets the same way, which is what makes experiment assignment
//! reproducible across calls and replays.

use gatekit_core::hashing::PASS_PERCENTAGE_MODULUS;
use gatekit_core::hashing::pass_percentage_bucket;
use gatekit_core::spec::ConfigSpec;
use gatekit_core::spec::Rule;
use gatekit_core::user::User;

/// Computes whether `user` passes `rule` within `spec`, per §4.E:
/// `salt_input := spec.salt + "." + (rule.salt or rule.id) + "." +
/// unitID(user, rule.idType)`, then `(H(salt_input) mod 10000) <
/// passPercentage * 100`, with the `0`/`100` fast paths.
#[must_use]
pub fn pass_percent(user: &User, rule: &Rule, spec: &ConfigSpec) -> bool {
    if rule.pass_percentage <= 0.0 {
        return false;
    }
    if rule.pass_percentage >= 100.0 {
        return true;
    }

    let unit_id = user.unit_id(rule.id_type.as_str());
    let salt_input = format!("{}.{}.{}", spec.salt, rule.salt_or_id(), unit_id);
    let bucket = pass_percentage_bucket(&salt_input);
    let threshold = (rule.pass_percentage * 100.0) as u64;
    bucket < threshold.min(PASS_PERCENTAGE_MODULUS)
}
