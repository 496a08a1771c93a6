// crates/gatekit-core/src/interfaces.rs
// ============================================================================
// Module: Gatekit External Collaborator Interfaces
// Description: Trait contracts for transport, data-adapter, persistent-
// storage, UA/IP lookup, and observability.
// Purpose: §4.H / §6 EXTERNAL INTERFACES.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Per the workspace's non-goals, this crate specifies these collaborators
//! as trait contracts only — no concrete HTTP client, SQL-backed data
//! adapter, or UA parser ships here. Each trait mirrors the teacher's
//! `EvidenceProvider`/`Dispatcher`/`RunStateStore` shape: a narrow method
//! set plus a dedicated `thiserror` error enum, with default no-op/None
//! implementations where the spec allows a collaborator to be absent.

use thiserror::Error;

use crate::spec::IdListDirectory;
use crate::spec::WireSpecPayload;

// ============================================================================
// SECTION: Transport
// ============================================================================

/// Errors a [`Transport`] implementation may report.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Transient fetch failure (5xx, timeout, DNS) — §7 `NetworkFailure`.
    #[error("network request failed: {0}")]
    NetworkFailure(String),
    /// The response body could not be parsed as the expected payload.
    #[error("failed to parse response: {0}")]
    ParseFailure(String),
}

/// Network access the spec store and id-list manager need. Retry/backoff/
/// gzip policy is entirely the implementation's concern (§1 non-goals).
pub trait Transport: Send + Sync {
    /// Fetches a spec payload, requesting only changes since `since_time`
    /// when the transport supports conditional fetches (`0` for a full
    /// fetch).
    fn download_config_specs(&self, since_time: i64) -> Result<WireSpecPayload, TransportError>;

    /// Fetches the current id-list directory.
    fn get_id_lists(&self) -> Result<IdListDirectory, TransportError>;

    /// Fetches a byte range of one id-list's content, starting at
    /// `range_start` bytes into the file.
    fn get_id_list(&self, url: &str, range_start: u64) -> Result<Vec<u8>, TransportError>;

    /// Posts an arbitrary JSON body to `path` (used by the exposure logger
    /// to flush events upstream; response body is opaque here).
    fn post(&self, path: &str, body: &[u8]) -> Result<(), TransportError>;
}

// ============================================================================
// SECTION: Data adapter
// ============================================================================

/// Errors a [`DataAdapter`] implementation may report.
#[derive(Debug, Error)]
pub enum DataAdapterError {
    /// The adapter failed to read or write its backing store.
    #[error("data adapter failure: {0}")]
    AdapterFailure(String),
}

/// Recognized [`DataAdapter`] key for the cached spec payload.
pub const DATA_ADAPTER_SPEC_CACHE_KEY: &str = "statsig.cache";
/// Recognized [`DataAdapter`] key for the id-list directory.
pub const DATA_ADAPTER_ID_LIST_DIRECTORY_KEY: &str = "statsig.id_lists";

/// Returns the [`DataAdapter`] key for one id-list's content.
#[must_use]
pub fn data_adapter_id_list_key(name: &str) -> String {
    format!("statsig.id_lists::{name}")
}

/// A pluggable cache/sync-of-record for spec payloads and id-list content
/// (§6). The core never assumes a particular backing store.
pub trait DataAdapter: Send + Sync {
    /// Called once before the adapter is used for reads or writes.
    fn initialize(&self) -> Result<(), DataAdapterError>;

    /// Called once during client shutdown.
    fn shutdown(&self) -> Result<(), DataAdapterError>;

    /// Reads a raw string value for `key`, if present.
    fn get(&self, key: &str) -> Result<Option<String>, DataAdapterError>;

    /// Writes a raw string value for `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), DataAdapterError>;

    /// Whether this adapter should be consulted for background polling
    /// updates to `key` (as opposed to only being used for initial load).
    fn should_be_used_for_querying_updates(&self, key: &str) -> bool;
}

// ============================================================================
// SECTION: Persistent storage
// ============================================================================

/// Errors a [`PersistentStorage`] implementation may report.
#[derive(Debug, Error)]
pub enum PersistentStorageError {
    /// The backing store failed to read or write.
    #[error("persistent storage failure: {0}")]
    AdapterFailure(String),
}

/// Serialized sticky evaluation result, persisted per §4.E/§6.
#[derive(Debug, Clone)]
pub struct StickyValues {
    /// Gate value (unused for dynamic configs, kept for shape parity).
    pub value: bool,
    /// JSON object value.
    pub json_value: serde_json::Value,
    /// Matched rule id at the time of persistence.
    pub rule_id: String,
    /// Matched rule's group name.
    pub group_name: Option<String>,
    /// Secondary exposures at the time of persistence.
    pub secondary_exposures: Vec<crate::result::SecondaryExposure>,
    /// Undelegated secondary exposures at the time of persistence.
    pub undelegated_secondary_exposures: Vec<crate::result::SecondaryExposure>,
    /// Delegate config name, if the persisted result was delegated.
    pub config_delegate: Option<String>,
    /// Explicit parameter names from the delegate, if any.
    pub explicit_parameters: Vec<String>,
    /// The `configSyncTime` in effect when this value was persisted.
    pub time: i64,
}

/// A user-supplied sticky-values capability, wrapped by the §4.G mediator
/// rather than called directly by the evaluator.
pub trait PersistentStorage: Send + Sync {
    /// Loads all persisted config-name → sticky-values entries for a user
    /// key (`unitID:idType`, §4.G).
    fn load(
        &self,
        user_key: &str,
    ) -> Result<std::collections::BTreeMap<String, StickyValues>, PersistentStorageError>;

    /// Persists one config's sticky values for a user key.
    fn save(
        &self,
        user_key: &str,
        config_name: &str,
        values: StickyValues,
    ) -> Result<(), PersistentStorageError>;

    /// Removes one config's persisted sticky values for a user key.
    fn delete(&self, user_key: &str, config_name: &str) -> Result<(), PersistentStorageError>;
}

// ============================================================================
// SECTION: UA / IP lookups
// ============================================================================

/// Opaque IP→country lookup capability (§1 non-goals: no implementation
/// ships here).
pub trait IpCountryLookup: Send + Sync {
    /// Resolves an IP address to an ISO country code, if known.
    fn lookup_country(&self, ip: &str) -> Option<String>;
}

/// Opaque User-Agent parsing capability (§1 non-goals: no implementation
/// ships here).
pub trait UserAgentLookup: Send + Sync {
    /// Resolves a raw User-Agent string to an OS family/version label.
    fn lookup_os(&self, user_agent: &str) -> Option<String>;

    /// Resolves a raw User-Agent string to a browser family/version label.
    fn lookup_browser(&self, user_agent: &str) -> Option<String>;
}

// ============================================================================
// SECTION: Observability
// ============================================================================

/// Diagnostics/event sink (§1 non-goals: diagnostics emission is an
/// external collaborator; this crate only defines where it plugs in).
pub trait ObservabilityClient: Send + Sync {
    /// Records a named diagnostic counter/gauge increment.
    fn record(&self, metric: &str, value: f64);

    /// Reports an error signature once per unique occurrence, per the §7
    /// error-boundary "deduped by error signature" contract.
    fn report_error(&self, signature: &str, message: &str);
}

/// An [`ObservabilityClient`] that discards everything, used as the default
/// when a caller does not configure one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObservabilityClient;

impl ObservabilityClient for NoopObservabilityClient {
    fn record(&self, _metric: &str, _value: f64) {}

    fn report_error(&self, _signature: &str, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_adapter_id_list_key_is_namespaced() {
        assert_eq!(data_adapter_id_list_key("my_list"), "statsig.id_lists::my_list");
    }

    #[test]
    fn noop_observability_client_does_not_panic() {
        let client = NoopObservabilityClient;
        client.record("metric", 1.0);
        client.report_error("sig", "message");
    }
}
