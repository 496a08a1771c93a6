// crates/gatekit-eval/src/persisted.rs
// ============================================================================
// Module: Gatekit Persisted-Storage Mediator
// Description: Wraps a user-supplied PersistentStorage behind panic
// isolation and key derivation.
// Purpose: §4.G "Persisted-storage mediator".
// Dependencies: gatekit-core
// ============================================================================

//! ## Overview
//! The evaluator never calls [`PersistentStorage`] directly: every load,
//! save, and delete goes through [`PersistedMediator`], which derives the
//! `unitID:idType` storage key and wraps the call in
//! [`std::panic::catch_unwind`] so a misbehaving user-supplied storage
//! implementation degrades to "sticky behavior unavailable" rather than
//! taking the whole evaluation down (§7 error boundary).

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;

use gatekit_core::SecondaryExposure;
use gatekit_core::interfaces::PersistentStorage;
use gatekit_core::interfaces::StickyValues;
use gatekit_core::user::User;
use serde_json::Value;

/// Wraps a [`PersistentStorage`] implementation with key derivation and
/// panic isolation.
pub struct PersistedMediator<'a> {
    storage: &'a dyn PersistentStorage,
}

impl<'a> PersistedMediator<'a> {
    /// Wraps `storage`.
    #[must_use]
    pub const fn new(storage: &'a dyn PersistentStorage) -> Self {
        Self { storage }
    }

    /// Derives the storage key for a user/idType pair: `unitID:idType`
    /// (§4.G).
    #[must_use]
    pub fn storage_key(user: &User, id_type: &str) -> String {
        format!("{}:{id_type}", user.unit_id(id_type))
    }

    /// Loads all sticky values for `user` bucketed on `id_type`. Returns an
    /// empty map on any storage error or panic, rather than failing the
    /// evaluation.
    #[must_use]
    pub fn load(&self, user: &User, id_type: &str) -> BTreeMap<String, StickyValues> {
        let key = Self::storage_key(user, id_type);
        let storage = self.storage;
        std::panic::catch_unwind(AssertUnwindSafe(|| storage.load(&key)))
            .ok()
            .and_then(Result::ok)
            .unwrap_or_default()
    }

    /// Persists `values` for `config_name` under `user`/`id_type`. Failures
    /// and panics are swallowed: losing a sticky write degrades gracefully
    /// to re-bucketing on the next call, it does not fail the evaluation
    /// that produced the value.
    pub fn save(&self, user: &User, id_type: &str, config_name: &str, values: StickyValues) {
        let key = Self::storage_key(user, id_type);
        let storage = self.storage;
        let _ = std::panic::catch_unwind(AssertUnwindSafe(|| storage.save(&key, config_name, values)));
    }

    /// Removes `config_name`'s sticky values for `user`/`id_type`.
    pub fn delete(&self, user: &User, id_type: &str, config_name: &str) {
        let key = Self::storage_key(user, id_type);
        let storage = self.storage;
        let _ = std::panic::catch_unwind(AssertUnwindSafe(|| storage.delete(&key, config_name)));
    }
}

/// Converts a [`StickyValues`] row into the canonical zero-exposures-lost
/// shape the evaluator expects, reconstructing its [`SecondaryExposure`]
/// lists untouched (§4.G: persisted results replay exactly as recorded,
/// they are never re-derived).
#[must_use]
pub fn sticky_values_json(values: &StickyValues) -> Value {
    values.json_value.clone()
}

/// Returns `true` when a rule landing a user in an experiment group should
/// be persisted: the owning spec is an active experiment and the rule
/// counts as an experiment group (§4.E/§4.G).
#[must_use]
pub fn should_persist(is_active_experiment: bool, is_experiment_group: Option<bool>) -> bool {
    is_active_experiment && is_experiment_group == Some(true)
}

/// Copies exposures out of a loaded [`StickyValues`] row for replay.
#[must_use]
pub fn sticky_secondary_exposures(values: &StickyValues) -> Vec<SecondaryExposure> {
    values.secondary_exposures.clone()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use gatekit_core::interfaces::PersistentStorageError;
    use serde_json::json;

    use super::*;

    struct PanickingStorage;

    impl PersistentStorage for PanickingStorage {
        fn load(&self, _user_key: &str) -> Result<BTreeMap<String, StickyValues>, PersistentStorageError> {
            panic!("boom");
        }

        fn save(&self, _user_key: &str, _config_name: &str, _values: StickyValues) -> Result<(), PersistentStorageError> {
            panic!("boom");
        }

        fn delete(&self, _user_key: &str, _config_name: &str) -> Result<(), PersistentStorageError> {
            panic!("boom");
        }
    }

    #[derive(Default)]
    struct InMemoryStorage {
        rows: Mutex<BTreeMap<String, BTreeMap<String, StickyValues>>>,
    }

    impl PersistentStorage for InMemoryStorage {
        fn load(&self, user_key: &str) -> Result<BTreeMap<String, StickyValues>, PersistentStorageError> {
            Ok(self.rows.lock().expect("lock").get(user_key).cloned().unwrap_or_default())
        }

        fn save(&self, user_key: &str, config_name: &str, values: StickyValues) -> Result<(), PersistentStorageError> {
            self.rows
                .lock()
                .expect("lock")
                .entry(user_key.to_string())
                .or_default()
                .insert(config_name.to_string(), values);
            Ok(())
        }

        fn delete(&self, user_key: &str, config_name: &str) -> Result<(), PersistentStorageError> {
            if let Some(row) = self.rows.lock().expect("lock").get_mut(user_key) {
                row.remove(config_name);
            }
            Ok(())
        }
    }

    fn sample_values() -> StickyValues {
        StickyValues {
            value: true,
            json_value: json!({"k": "v"}),
            rule_id: "rule_1".to_string(),
            group_name: Some("Test".to_string()),
            secondary_exposures: Vec::new(),
            undelegated_secondary_exposures: Vec::new(),
            config_delegate: None,
            explicit_parameters: Vec::new(),
            time: 1000,
        }
    }

    #[test]
    fn panicking_storage_degrades_to_empty_load() {
        let storage = PanickingStorage;
        let mediator = PersistedMediator::new(&storage);
        let result = mediator.load(&User::with_user_id("u1"), "userID");
        assert!(result.is_empty());
    }

    #[test]
    fn panicking_storage_save_does_not_propagate() {
        let storage = PanickingStorage;
        let mediator = PersistedMediator::new(&storage);
        mediator.save(&User::with_user_id("u1"), "userID", "exp", sample_values());
    }

    #[test]
    fn round_trips_through_in_memory_storage() {
        let storage = InMemoryStorage::default();
        let mediator = PersistedMediator::new(&storage);
        let user = User::with_user_id("u1");
        mediator.save(&user, "userID", "exp", sample_values());
        let loaded = mediator.load(&user, "userID");
        assert_eq!(loaded.get("exp").map(|v| v.rule_id.as_str()), Some("rule_1"));
    }
}
