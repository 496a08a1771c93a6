// crates/gatekit-core/src/spec/mod.rs
// ============================================================================
// Module: Gatekit Spec Model
// Description: Wire payload shapes and the installed spec model they parse
// into.
// Purpose: §4.B Spec model, §6 External Interfaces wire shapes.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! This module owns the boundary between "what the network/data-adapter
//! sends" ([`WireSpecPayload`] and friends) and "what the evaluator reads"
//! ([`ConfigSpec`]/[`Rule`]/[`Condition`]). Installing a payload
//! (`gatekit-store`'s job) walks every wire type through its `from_wire`
//! constructor exactly once per snapshot build.

pub mod condition;
pub mod config_spec;
pub mod id_list;
pub mod rule;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

pub use condition::Condition;
pub use condition::ConditionType;
pub use condition::WireCondition;
pub use config_spec::ConfigSpec;
pub use config_spec::SpecType;
pub use config_spec::WireConfigSpec;
pub use id_list::IdList;
pub use rule::Rule;
pub use rule::WireRule;

/// The `download_config_specs` wire response (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireSpecPayload {
    /// Whether this payload carries changes relative to the caller's
    /// `sinceTime`.
    pub has_updates: bool,
    /// Server time this payload was generated at.
    pub time: i64,
    /// Feature gate specs.
    #[serde(default)]
    pub feature_gates: Vec<WireConfigSpec>,
    /// Dynamic config specs.
    #[serde(default)]
    pub dynamic_configs: Vec<WireConfigSpec>,
    /// Layer specs.
    #[serde(default)]
    pub layer_configs: Vec<WireConfigSpec>,
    /// Layer name → allocated experiment names (inverse index source).
    #[serde(default)]
    pub layers: BTreeMap<String, Vec<String>>,
    /// Id list names known to the server, value unused by the evaluator.
    #[serde(default)]
    pub id_lists: BTreeMap<String, bool>,
    /// SDK key → application id (plaintext).
    #[serde(default)]
    pub sdk_keys_to_app_ids: BTreeMap<String, String>,
    /// DJB2(SDK key) → application id.
    #[serde(default)]
    pub hashed_sdk_keys_to_app_ids: BTreeMap<String, String>,
    /// DJB2 of the SDK key the server used to build this payload, if it
    /// chooses to report one (§4.C SDK-key verification).
    #[serde(default)]
    pub hashed_sdk_key_used: Option<String>,
}

/// One entry in the `get_id_lists` directory response (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdListDirectoryEntry {
    /// List name.
    pub name: String,
    /// Cumulative byte size the server has available.
    pub size: u64,
    /// Content URL for byte-range fetches.
    pub url: String,
    /// Server-reported creation time.
    pub creation_time: i64,
    /// Content identity; changes trigger a reset (§4.D).
    pub file_id: String,
}

/// The full `get_id_lists` directory response: name → metadata.
pub type IdListDirectory = BTreeMap<String, IdListDirectoryEntry>;
