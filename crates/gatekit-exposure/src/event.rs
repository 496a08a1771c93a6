// crates/gatekit-exposure/src/event.rs
// ============================================================================
// Module: Gatekit Exposure Event
// Description: The wire shape of one exposure event and its dedup key.
// Purpose: §4.F "Exposure logger".
// Dependencies: gatekit-core, serde_jcs
// ============================================================================

//! ## Overview
//! An exposure event's dedup key is `kind || name || ruleID ||
//! canonical(secondaryExposures) || user-identity-subset` (§4.F): two
//! evaluations of the same spec, for users sharing the same identity
//! subset, that landed on the same rule with the same dependent-gate
//! exposures, are the same observable event and should only be reported
//! once per flush window. `canonical` is RFC 8785 canonical JSON via
//! `serde_jcs`, so key order and float rendering can never cause spurious
//! duplicates.

use gatekit_core::SecondaryExposure;
use gatekit_core::result::EvaluationDetails;
use gatekit_core::user::User;
use serde::Serialize;
use serde_json::Value;

/// The kind of spec an exposure event was recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureKind {
    /// A feature-gate check.
    Gate,
    /// A dynamic-config read.
    Config,
    /// An experiment read.
    Experiment,
    /// A layer read.
    Layer,
}

impl ExposureKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Gate => "gate",
            Self::Config => "config",
            Self::Experiment => "experiment",
            Self::Layer => "layer",
        }
    }
}

/// One exposure event, queued for background flush.
#[derive(Debug, Clone, Serialize)]
pub struct ExposureEvent {
    /// Which kind of spec was read.
    pub kind: ExposureKind,
    /// Spec name.
    pub name: String,
    /// Matched rule id (or sentinel).
    pub rule_id: String,
    /// String-rendered boolean/JSON value, for display purposes only.
    pub value: Value,
    /// Dependent-gate exposures accumulated during evaluation.
    pub secondary_exposures: Vec<SecondaryExposure>,
    /// Evaluation provenance.
    pub evaluation_details: EvaluationDetails,
    /// The user the evaluation ran for.
    #[serde(skip)]
    pub user: User,
    /// Wall-clock time the event was recorded.
    pub time: i64,
    /// Set when this event came from `manually_log_exposure` rather than an
    /// automatic `check_gate`/`get_dynamic_config`/etc. read (§4.F).
    pub is_manual_exposure: bool,
}

impl ExposureEvent {
    /// Computes this event's dedup key (§4.F).
    #[must_use]
    pub fn dedup_key(&self) -> String {
        let canonical_exposures = serde_jcs::to_string(&self.secondary_exposures).unwrap_or_default();
        let identity = user_identity_subset(&self.user);
        format!("{}||{}||{}||{canonical_exposures}||{identity}", self.kind.as_str(), self.name, self.rule_id)
    }
}

/// The identity subset a dedup key is keyed on: `userID` plus every custom
/// id, sorted for determinism (§4.F). Deliberately excludes everything else
/// (email, IP, custom attributes) so unrelated attribute churn on the same
/// logical user does not defeat dedup.
fn user_identity_subset(user: &User) -> String {
    let mut parts = vec![format!("userID={}", user.user_id)];
    for (id_type, value) in &user.custom_ids {
        parts.push(format!("{id_type}={value}"));
    }
    parts.sort_unstable();
    parts.join(",")
}

#[cfg(test)]
mod tests {
    use gatekit_core::result::EvalReason;
    use gatekit_core::result::SnapshotSource;
    use serde_json::json;

    use super::*;

    fn sample_event(user_id: &str) -> ExposureEvent {
        ExposureEvent {
            kind: ExposureKind::Gate,
            name: "my_gate".to_string(),
            rule_id: "rule_1".to_string(),
            value: json!(true),
            secondary_exposures: Vec::new(),
            evaluation_details: EvaluationDetails {
                source: SnapshotSource::Network,
                reason: EvalReason::Rule,
                config_sync_time: 1,
                init_time: 1,
                server_time: 1,
                has_seen_analytical_gates: false,
            },
            user: User::with_user_id(user_id),
            time: 1,
            is_manual_exposure: false,
        }
    }

    #[test]
    fn dedup_key_differs_by_user() {
        assert_ne!(sample_event("a").dedup_key(), sample_event("b").dedup_key());
    }

    #[test]
    fn dedup_key_is_stable_for_same_inputs() {
        assert_eq!(sample_event("a").dedup_key(), sample_event("a").dedup_key());
    }
}
