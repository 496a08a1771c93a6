// crates/gatekit-store/src/config.rs
// ============================================================================
// Module: Gatekit Store Configuration
// Description: Tunables for the background spec/id-list sync loops.
// Purpose: §4.C / §5 "background poller" defaults.
// Dependencies: none
// ============================================================================

//! Tunables for the background spec/id-list sync loops.

use std::time::Duration;

/// Default interval between config-spec sync attempts (§4.C).
pub const DEFAULT_CONFIG_SYNC_INTERVAL: Duration = Duration::from_secs(10);
/// Default interval between id-list directory sync attempts (§4.D).
pub const DEFAULT_ID_LIST_SYNC_INTERVAL: Duration = Duration::from_secs(60);

/// Tunables for [`crate::store::SpecStore::initialize`] and its background
/// pollers.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// How often the background thread re-fetches config specs.
    pub config_sync_interval: Duration,
    /// How often the background thread re-syncs the id-list directory.
    pub id_list_sync_interval: Duration,
    /// Caller-supplied bootstrap payload JSON, used when no data adapter or
    /// network fetch has completed yet (§4.C step 1).
    pub bootstrap_values: Option<String>,
    /// Whether id lists should be synced at all; some deployments use no
    /// id-list-backed gates and can skip this entirely.
    pub enable_id_lists: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            config_sync_interval: DEFAULT_CONFIG_SYNC_INTERVAL,
            id_list_sync_interval: DEFAULT_ID_LIST_SYNC_INTERVAL,
            bootstrap_values: None,
            enable_id_lists: true,
        }
    }
}
