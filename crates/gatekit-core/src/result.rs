// crates/gatekit-core/src/result.rs
// ============================================================================
// Module: Gatekit Evaluation Result
// Description: The typed outcome of one gate/config/experiment/layer
// evaluation.
// Purpose: §3 DATA MODEL "EvalResult".
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`EvalResult`] is the single value every evaluator entry point returns.
//! It is deliberately "fat": it carries both the value itself and enough
//! provenance (`rule_id`, `evaluation_details`, secondary exposures) for the
//! exposure logger to build a complete exposure event without re-running
//! evaluation.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::identifiers::GroupName;
use crate::identifiers::IdType;
use crate::identifiers::RuleId;
use crate::identifiers::SpecName;

/// Where the snapshot currently being evaluated against came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapshotSource {
    /// No snapshot has been installed yet.
    #[default]
    Uninitialized,
    /// Installed via a live network fetch.
    Network,
    /// A network fetch reported no changes (payload accepted, unchanged).
    NetworkNotModified,
    /// Installed from caller-supplied bootstrap values.
    Bootstrap,
    /// Installed from a user-supplied data adapter.
    DataAdapter,
}

/// Why a particular [`EvalResult`] has the value it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EvalReason {
    /// A local override short-circuited evaluation.
    LocalOverride,
    /// The spec name was not found in the snapshot.
    Unrecognized,
    /// The spec is disabled.
    Disabled,
    /// No rule matched; the spec's default value was used.
    Default,
    /// A rule matched.
    Rule,
    /// A condition type/operator was not recognized.
    Unsupported,
    /// The result was reconstructed from a persisted (sticky) value.
    Persisted,
    /// The spec store has not completed initialization.
    NetworkNotModified,
}

/// Flattened evaluation provenance, embedded in exposure events (§4.F).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvaluationDetails {
    /// Snapshot source at the time of evaluation.
    pub source: SnapshotSource,
    /// Why the result has the value it has.
    pub reason: EvalReason,
    /// The snapshot's `lastSyncTime`.
    pub config_sync_time: i64,
    /// The snapshot's `initialSyncTime`.
    pub init_time: i64,
    /// Wall-clock time the evaluation ran at.
    pub server_time: i64,
    /// Whether this evaluation resolved a `pass_gate`/`fail_gate` condition
    /// outside the `segment:` namespace anywhere in its call tree (§4.E
    /// analytical-gates telemetry).
    pub has_seen_analytical_gates: bool,
}

/// One dependent-gate evaluation performed while computing a primary
/// result (§4.E `pass_gate`/`fail_gate`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryExposure {
    /// Name of the dependent gate.
    pub gate: String,
    /// String-rendered boolean value the dependent gate produced.
    pub gate_value: String,
    /// Rule id the dependent gate matched.
    pub rule_id: String,
}

/// The outcome of one `evalGate`/`evalConfig`/`evalLayer` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalResult {
    /// Boolean value (gates; always `false` for non-gate specs at the
    /// top level, though a gate's `jsonValue` mirrors it for convenience).
    pub value: bool,
    /// JSON object value (dynamic configs/layers).
    pub json_value: Value,
    /// Matched rule id, or a sentinel (`"default"`, `"disabled"`,
    /// `"override"`, `""`).
    pub rule_id: RuleId,
    /// Matched rule's group name, if any.
    pub group_name: Option<GroupName>,
    /// Id type used for bucketing.
    pub id_type: IdType,
    /// Deduplicated dependent-gate exposures accumulated for this result,
    /// including any delegated config's exposures.
    pub secondary_exposures: Vec<SecondaryExposure>,
    /// Exposures accumulated before delegation was applied (§8 scenario 3).
    pub undelegated_secondary_exposures: Vec<SecondaryExposure>,
    /// Name of a dynamic config this rule delegated to, if any.
    pub config_delegate: Option<SpecName>,
    /// Parameter names owned by the delegate (layer delegation).
    pub explicit_parameters: Vec<String>,
    /// Flattened evaluation provenance.
    pub evaluation_details: EvaluationDetails,
    /// Whether the matched rule is an experiment group (drives sticky
    /// save/delete).
    pub is_experiment_group: Option<bool>,
    /// Opaque device metadata carried through from UA-derived conditions.
    pub derived_device_metadata: Option<Value>,
    /// Set when a condition type/operator was not recognized; short-
    /// circuits the owning spec's evaluation with `reason = unsupported`.
    pub unsupported: bool,
}

impl EvalResult {
    /// Builds the canonical "unrecognized spec name" result (§4.E).
    #[must_use]
    pub fn unrecognized(details: EvaluationDetails) -> Self {
        Self {
            value: false,
            json_value: json!({}),
            rule_id: RuleId::new(""),
            group_name: None,
            id_type: IdType::new(""),
            secondary_exposures: Vec::new(),
            undelegated_secondary_exposures: Vec::new(),
            config_delegate: None,
            explicit_parameters: Vec::new(),
            evaluation_details: EvaluationDetails {
                reason: EvalReason::Unrecognized,
                ..details
            },
            is_experiment_group: None,
            derived_device_metadata: None,
            unsupported: false,
        }
    }

    /// Builds the canonical local-override result (§4.E).
    #[must_use]
    pub fn local_override(value: bool, json_value: Value, details: EvaluationDetails) -> Self {
        Self {
            value,
            json_value,
            rule_id: RuleId::new("override"),
            group_name: None,
            id_type: IdType::new(""),
            secondary_exposures: Vec::new(),
            undelegated_secondary_exposures: Vec::new(),
            config_delegate: None,
            explicit_parameters: Vec::new(),
            evaluation_details: EvaluationDetails {
                reason: EvalReason::LocalOverride,
                ..details
            },
            is_experiment_group: None,
            derived_device_metadata: None,
            unsupported: false,
        }
    }

    /// Builds the canonical "unsupported condition" result (§4.E/§7).
    #[must_use]
    pub fn unsupported(details: EvaluationDetails) -> Self {
        Self {
            value: false,
            json_value: json!({}),
            rule_id: RuleId::new(""),
            group_name: None,
            id_type: IdType::new(""),
            secondary_exposures: Vec::new(),
            undelegated_secondary_exposures: Vec::new(),
            config_delegate: None,
            explicit_parameters: Vec::new(),
            evaluation_details: EvaluationDetails {
                reason: EvalReason::Unsupported,
                ..details
            },
            is_experiment_group: None,
            derived_device_metadata: None,
            unsupported: true,
        }
    }
}

/// Appends `exposure` to `exposures` unless an exposure with the same
/// `(gate, gate_value, rule_id)` triple is already present, preserving
/// first-occurrence order (§3 invariants, §5 ordering guarantees).
pub fn dedup_push_secondary_exposure(
    exposures: &mut Vec<SecondaryExposure>,
    exposure: SecondaryExposure,
) {
    if !exposures.contains(&exposure) {
        exposures.push(exposure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_push_preserves_first_occurrence_order() {
        let mut exposures = Vec::new();
        let first = SecondaryExposure {
            gate: "G1".to_string(),
            gate_value: "true".to_string(),
            rule_id: "r1".to_string(),
        };
        let duplicate = first.clone();
        let second = SecondaryExposure {
            gate: "G2".to_string(),
            gate_value: "false".to_string(),
            rule_id: "r2".to_string(),
        };
        dedup_push_secondary_exposure(&mut exposures, first.clone());
        dedup_push_secondary_exposure(&mut exposures, second.clone());
        dedup_push_secondary_exposure(&mut exposures, duplicate);
        assert_eq!(exposures, vec![first, second]);
    }
}
