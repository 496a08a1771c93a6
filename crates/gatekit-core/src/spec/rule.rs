// crates/gatekit-core/src/spec/rule.rs
// ============================================================================
// Module: Gatekit Rule Model
// Description: Wire and installed representations of one rule within a
// ConfigSpec.
// Purpose: §3 DATA MODEL "Rule".
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! A rule's `conditions` must all pass for the rule to match (§4.E). Its
//! `return_value` is already a parsed `serde_json::Value` by the time
//! [`Rule::from_wire`] runs (Rust's `serde_json` deserializer parses eagerly,
//! unlike the source SDK's raw-bytes-until-needed representation), so the
//! pre-parse contract in §4.B is satisfied by construction; `Rule` keeps the
//! parsed value as a plain field rather than re-deserializing per
//! evaluation.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::identifiers::GroupName;
use crate::identifiers::IdType;
use crate::identifiers::RuleId;
use crate::identifiers::SpecName;
use crate::spec::condition::Condition;
use crate::spec::condition::WireCondition;

/// Wire shape of a rule, exactly mirroring the JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRule {
    /// Unique id within the owning spec's rule list.
    pub id: RuleId,
    /// Human label, often an experiment group name.
    #[serde(default)]
    pub group_name: Option<GroupName>,
    /// Per-rule salt; falls back to `id` when absent (§4.E `eval`).
    #[serde(default)]
    pub salt: Option<String>,
    /// Percentage of bucketed traffic, in `[0, 100]`, that passes this rule.
    pub pass_percentage: f64,
    /// All-must-pass condition list.
    #[serde(default)]
    pub conditions: Vec<WireCondition>,
    /// JSON object returned for dynamic-config/layer specs when this rule
    /// matches.
    #[serde(default)]
    pub return_value: Value,
    /// Id type this rule buckets on.
    #[serde(default)]
    pub id_type: IdType,
    /// Name of a dynamic config this rule delegates its result to.
    #[serde(default)]
    pub config_delegate: Option<SpecName>,
    /// Whether matching this rule counts as landing in an experiment group
    /// (drives persisted/sticky save behavior, §4.E).
    #[serde(default)]
    pub is_experiment_group: Option<bool>,
}

/// Installed form of a rule, identical in shape to [`WireRule`] today but
/// kept as a distinct type so future pre-computation (mirroring
/// [`Condition`]) has a natural home without perturbing the wire contract.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Unique id within the owning spec's rule list.
    pub id: RuleId,
    /// Human label, often an experiment group name.
    pub group_name: Option<GroupName>,
    /// Per-rule salt; falls back to `id` when absent.
    pub salt: Option<String>,
    /// Percentage of bucketed traffic, in `[0, 100]`, that passes this rule.
    pub pass_percentage: f64,
    /// All-must-pass condition list, pre-computed.
    pub conditions: Vec<Condition>,
    /// Pre-parsed return value JSON.
    pub return_value: Value,
    /// Id type this rule buckets on.
    pub id_type: IdType,
    /// Name of a dynamic config this rule delegates its result to.
    pub config_delegate: Option<SpecName>,
    /// Whether matching this rule counts as landing in an experiment group.
    pub is_experiment_group: Option<bool>,
}

impl Rule {
    /// Installs a [`WireRule`], pre-computing each of its conditions.
    #[must_use]
    pub fn from_wire(wire: WireRule) -> Self {
        Self {
            id: wire.id,
            group_name: wire.group_name,
            salt: wire.salt,
            pass_percentage: wire.pass_percentage,
            conditions: wire.conditions.into_iter().map(Condition::from_wire).collect(),
            return_value: wire.return_value,
            id_type: wire.id_type,
            config_delegate: wire.config_delegate,
            is_experiment_group: wire.is_experiment_group,
        }
    }

    /// Returns the salt input component for this rule: its explicit `salt`
    /// if non-empty, otherwise its `id` (§4.E `eval` step 2).
    #[must_use]
    pub fn salt_or_id(&self) -> &str {
        match &self.salt {
            Some(salt) if !salt.is_empty() => salt.as_str(),
            _ => self.id.as_str(),
        }
    }
}
