// crates/gatekit-store/src/error.rs
// ============================================================================
// Module: Gatekit Store Errors
// Description: Typed failures from store initialization and sync.
// Purpose: §7 ERROR HANDLING DESIGN.
// Dependencies: thiserror, gatekit-core
// ============================================================================

//! Typed failures from store initialization and sync.

use thiserror::Error;

use gatekit_core::interfaces::DataAdapterError;
use gatekit_core::interfaces::TransportError;

/// Errors [`crate::store::SpecStore::initialize`] can return.
#[derive(Debug, Error)]
pub enum StoreInitError {
    /// No data adapter, no bootstrap values, and the initial network fetch
    /// failed — the store has nothing to evaluate against (§4.C step 1-3).
    #[error("no spec source available: {0}")]
    NoSpecSource(String),
    /// The background poller thread failed to spawn.
    #[error("failed to spawn background sync thread: {0}")]
    ThreadSpawnFailed(String),
    /// The bootstrap payload supplied in [`crate::config::StoreOptions`]
    /// could not be parsed.
    #[error("failed to parse bootstrap payload: {0}")]
    InvalidBootstrap(String),
}

impl From<TransportError> for StoreInitError {
    fn from(err: TransportError) -> Self {
        Self::NoSpecSource(err.to_string())
    }
}

impl From<DataAdapterError> for StoreInitError {
    fn from(err: DataAdapterError) -> Self {
        Self::NoSpecSource(err.to_string())
    }
}
