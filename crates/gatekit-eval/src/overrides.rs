// crates/gatekit-eval/src/overrides.rs
// ============================================================================
// Module: Gatekit Local Overrides
// Description: Caller-supplied overrides that short-circuit evaluation.
// Purpose: §5 "a separate lock protects user-supplied overrides".
// Dependencies: gatekit-core, std::sync
// ============================================================================

//! ## Overview
//! Overrides are test/ops affordances, not part of the evaluated spec data:
//! they live behind their own `RwLock`, distinct from the snapshot pointer,
//! so setting an override never contends with (or waits on) a spec sync in
//! flight (§5).

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde_json::Value;

/// One caller-registered override for a single spec name.
#[derive(Debug, Clone)]
pub enum Override {
    /// Forces a gate's boolean result.
    Gate(bool),
    /// Forces a dynamic config/experiment/layer's JSON result.
    Config(Value),
}

/// Thread-safe store of local overrides, keyed by spec name.
#[derive(Debug, Default)]
pub struct OverrideStore {
    entries: RwLock<BTreeMap<String, Override>>,
}

impl OverrideStore {
    /// Creates an empty override store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a gate override.
    pub fn override_gate(&self, name: impl Into<String>, value: bool) {
        self.entries.write().expect("override lock poisoned").insert(name.into(), Override::Gate(value));
    }

    /// Registers (or replaces) a dynamic config/experiment/layer override.
    pub fn override_config(&self, name: impl Into<String>, value: Value) {
        self.entries.write().expect("override lock poisoned").insert(name.into(), Override::Config(value));
    }

    /// Removes a single override.
    pub fn remove(&self, name: &str) {
        self.entries.write().expect("override lock poisoned").remove(name);
    }

    /// Removes every registered override.
    pub fn clear(&self) {
        self.entries.write().expect("override lock poisoned").clear();
    }

    /// Looks up an override for `name`, if one is registered.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Override> {
        self.entries.read().expect("override lock poisoned").get(name).cloned()
    }
}
