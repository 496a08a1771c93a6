// crates/gatekit-core/src/spec/config_spec.rs
// ============================================================================
// Module: Gatekit ConfigSpec Model
// Description: Wire and installed representations of one rule set (gate,
// dynamic config, or layer).
// Purpose: §3 DATA MODEL "ConfigSpec".
// Dependencies: serde_json
// ============================================================================

//! Wire and installed representations of one rule set (gate, dynamic
//! config, or layer).

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::identifiers::SpecName;
use crate::spec::rule::Rule;
use crate::spec::rule::WireRule;

/// The three spec kinds a [`ConfigSpec`] can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecType {
    /// A named boolean rule set.
    FeatureGate,
    /// A named rule set returning a JSON object.
    DynamicConfig,
    /// A rule set that may delegate to an allocated experiment.
    Layer,
    /// Internal/reserved variants the evaluator should treat conservatively.
    #[serde(other)]
    Other,
}

/// Wire shape of a config spec, exactly mirroring the JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireConfigSpec {
    /// Unique name within its kind's namespace.
    pub name: SpecName,
    /// Spec kind.
    #[serde(rename = "type")]
    pub spec_type: SpecType,
    /// Salt mixed into every rule's bucketing hash input.
    #[serde(default)]
    pub salt: String,
    /// Whether the spec is active at all; disabled specs always return the
    /// default value (§4.E `eval` step 1).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ordered list of rules, evaluated in order until one matches.
    #[serde(default)]
    pub rules: Vec<WireRule>,
    /// Default value returned when disabled or no rule matches.
    #[serde(default)]
    pub default_value: Value,
    /// Default id type for rules that do not specify their own.
    #[serde(default)]
    pub id_type: String,
    /// Opaque entity classification string, passed through untouched.
    #[serde(default)]
    pub entity: Option<String>,
    /// Parameter names owned by an allocated experiment (layer delegation).
    #[serde(default)]
    pub explicit_parameters: BTreeSet<String>,
    /// Whether this spec is an active experiment (enables sticky/persisted
    /// behavior, §4.E).
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Whether this layer shares parameters across its allocated
    /// experiments.
    #[serde(default)]
    pub has_shared_params: bool,
    /// Application ids this spec targets; empty means "all".
    #[serde(default)]
    pub target_app_ids: Vec<String>,
}

const fn default_true() -> bool {
    true
}

/// Installed form of a config spec: rules (and their conditions) have been
/// pre-computed via [`Rule::from_wire`]/`Condition::from_wire`.
///
/// # Invariants
/// - Immutable once installed into a [`crate::snapshot::Snapshot`]; updates
///   always replace the whole spec, never mutate it in place.
#[derive(Debug, Clone)]
pub struct ConfigSpec {
    /// Unique name within its kind's namespace.
    pub name: SpecName,
    /// Spec kind.
    pub spec_type: SpecType,
    /// Salt mixed into every rule's bucketing hash input.
    pub salt: String,
    /// Whether the spec is active at all.
    pub enabled: bool,
    /// Ordered, pre-computed rule list.
    pub rules: Vec<Rule>,
    /// Pre-parsed default value.
    pub default_value: Value,
    /// Default id type for rules that do not specify their own.
    pub id_type: String,
    /// Opaque entity classification string.
    pub entity: Option<String>,
    /// Parameter names owned by an allocated experiment.
    pub explicit_parameters: BTreeSet<String>,
    /// Whether this spec is an active experiment.
    pub is_active: Option<bool>,
    /// Whether this layer shares parameters across allocated experiments.
    pub has_shared_params: bool,
    /// Application ids this spec targets; empty means "all".
    pub target_app_ids: Vec<String>,
}

impl ConfigSpec {
    /// Installs a [`WireConfigSpec`], pre-computing every rule and
    /// condition it contains.
    #[must_use]
    pub fn from_wire(wire: WireConfigSpec) -> Self {
        Self {
            name: wire.name,
            spec_type: wire.spec_type,
            salt: wire.salt,
            enabled: wire.enabled,
            rules: wire.rules.into_iter().map(Rule::from_wire).collect(),
            default_value: wire.default_value,
            id_type: wire.id_type,
            entity: wire.entity,
            explicit_parameters: wire.explicit_parameters,
            is_active: wire.is_active,
            has_shared_params: wire.has_shared_params,
            target_app_ids: wire.target_app_ids,
        }
    }

    /// Returns true when this spec is an actively-running experiment
    /// eligible for sticky/persisted evaluation (§4.E).
    #[must_use]
    pub fn is_active_experiment(&self) -> bool {
        self.spec_type == SpecType::DynamicConfig && self.is_active == Some(true)
    }
}
