// crates/gatekit-core/src/snapshot.rs
// ============================================================================
// Module: Gatekit Snapshot
// Description: The full, immutable store state read by one evaluation call.
// Purpose: §3 DATA MODEL "Snapshot".
// Dependencies: none (consumes crate::spec, crate::hashing)
// ============================================================================

//! ## Overview
//! A [`Snapshot`] is produced atomically from a [`crate::spec::WireSpecPayload`]
//! and never mutated in place: the spec store always builds a brand new
//! snapshot off-lock and swaps a pointer to install it (§5). Evaluators
//! capture one `Arc<Snapshot>` at call entry and use it for the whole call.

use std::collections::BTreeMap;

use crate::hashing::djb2;
use crate::identifiers::SpecName;
use crate::result::SnapshotSource;
use crate::spec::ConfigSpec;
use crate::spec::IdList;
use crate::spec::SpecType;
use crate::spec::WireSpecPayload;

/// The full, immutable state a single evaluation call runs against.
///
/// # Invariants
/// - `last_sync_time` is non-decreasing across successive installed
///   snapshots (enforced by the spec store, not this type).
/// - Once constructed, a `Snapshot` is never mutated; updates always build
///   a new one.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Feature gates by name.
    pub gates: BTreeMap<String, ConfigSpec>,
    /// Dynamic configs (including experiments) by name.
    pub dynamic_configs: BTreeMap<String, ConfigSpec>,
    /// Layers by name.
    pub layers: BTreeMap<String, ConfigSpec>,
    /// Experiment name → owning layer name inverse index.
    pub experiment_to_layer: BTreeMap<String, String>,
    /// SDK key → application id (plaintext).
    pub sdk_key_to_app_id: BTreeMap<String, String>,
    /// DJB2(SDK key) → application id.
    pub hashed_sdk_key_to_app_id: BTreeMap<String, String>,
    /// Id lists by name.
    pub id_lists: BTreeMap<String, IdList>,
    /// Time the most recent successful sync reported.
    pub last_sync_time: i64,
    /// Time of the very first successful sync this process performed.
    pub initial_sync_time: i64,
    /// Where this snapshot's spec data came from.
    pub source: SnapshotSource,
}

impl Snapshot {
    /// Builds a snapshot from a wire payload, installing every contained
    /// spec via its `from_wire` constructor exactly once (§4.B). `id_lists`
    /// and `initial_sync_time` are carried over from the caller since the
    /// spec payload and the id-list directory are fetched independently
    /// (§4.C step 5).
    #[must_use]
    pub fn install(
        payload: WireSpecPayload,
        source: SnapshotSource,
        id_lists: BTreeMap<String, IdList>,
        initial_sync_time: i64,
    ) -> Self {
        let mut experiment_to_layer = BTreeMap::new();
        for (layer_name, experiments) in &payload.layers {
            for experiment in experiments {
                experiment_to_layer.insert(experiment.clone(), layer_name.clone());
            }
        }

        Self {
            gates: install_specs(payload.feature_gates),
            dynamic_configs: install_specs(payload.dynamic_configs),
            layers: install_specs(payload.layer_configs),
            experiment_to_layer,
            sdk_key_to_app_id: payload.sdk_keys_to_app_ids,
            hashed_sdk_key_to_app_id: payload.hashed_sdk_keys_to_app_ids,
            id_lists,
            last_sync_time: payload.time,
            initial_sync_time,
            source,
        }
    }

    /// Looks up a feature gate by name.
    #[must_use]
    pub fn get_gate(&self, name: &str) -> Option<&ConfigSpec> {
        self.gates.get(name)
    }

    /// Looks up a dynamic config (or experiment) by name.
    #[must_use]
    pub fn get_dynamic_config(&self, name: &str) -> Option<&ConfigSpec> {
        self.dynamic_configs.get(name)
    }

    /// Looks up a layer by name.
    #[must_use]
    pub fn get_layer(&self, name: &str) -> Option<&ConfigSpec> {
        self.layers.get(name)
    }

    /// Resolves the layer name an experiment is allocated under, if any.
    #[must_use]
    pub fn get_experiment_layer(&self, experiment_name: &str) -> Option<&str> {
        self.experiment_to_layer.get(experiment_name).map(String::as_str)
    }

    /// Looks up an id list by name.
    #[must_use]
    pub fn get_id_list(&self, name: &str) -> Option<&IdList> {
        self.id_lists.get(name)
    }

    /// Returns the application id the snapshot's default key resolves to,
    /// preferring a plaintext match.
    #[must_use]
    pub fn app_id_for_sdk_key(&self, sdk_key: &str) -> Option<&str> {
        if let Some(app_id) = self.sdk_key_to_app_id.get(sdk_key) {
            return Some(app_id.as_str());
        }
        let hashed = djb2(sdk_key).to_string();
        self.hashed_sdk_key_to_app_id.get(&hashed).map(String::as_str)
    }

    /// Verifies a payload's reported `hashed_sdk_key_used` against
    /// `DJB2(sdk_key)` (§4.C SDK-key verification). Returns `true` when no
    /// hash was reported (nothing to verify) or when it matches.
    #[must_use]
    pub fn verify_sdk_key_hash(sdk_key: &str, hashed_sdk_key_used: Option<&str>) -> bool {
        match hashed_sdk_key_used {
            None => true,
            Some(expected) => djb2(sdk_key).to_string() == expected,
        }
    }

    /// Resolves a dynamic config spec's kind-qualified lookup, used by
    /// `evalConfig`'s delegate resolution (which only ever targets dynamic
    /// configs, never gates or layers, per §4.E).
    #[must_use]
    pub fn resolve_delegate(&self, name: &SpecName) -> Option<&ConfigSpec> {
        self.dynamic_configs
            .get(name.as_str())
            .filter(|spec| spec.spec_type == SpecType::DynamicConfig)
    }
}

/// Installs a vector of wire specs into a name-keyed map.
fn install_specs(wire: Vec<crate::spec::WireConfigSpec>) -> BTreeMap<String, ConfigSpec> {
    wire.into_iter()
        .map(|spec| (spec.name.as_str().to_string(), ConfigSpec::from_wire(spec)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_sdk_key_hash_accepts_missing_hash() {
        assert!(Snapshot::verify_sdk_key_hash("secret-key", None));
    }

    #[test]
    fn verify_sdk_key_hash_detects_mismatch() {
        assert!(!Snapshot::verify_sdk_key_hash("secret-key", Some("not-a-real-hash")));
        let real = djb2("secret-key").to_string();
        assert!(Snapshot::verify_sdk_key_hash("secret-key", Some(&real)));
    }
}
