// crates/gatekit-client/src/config.rs
// ============================================================================
// Module: Gatekit Client Options
// Description: Programmatic configuration for Client::new.
// Purpose: §6 "No CLI, environment variables, or config files are part of
// the core" — configuration is an explicit options struct plus builder.
// Dependencies: gatekit-store, gatekit-exposure
// ============================================================================

//! ## Overview
//! `ClientOptions` is the only configuration surface this crate exposes. It
//! carries no parsing of its own; every field is set programmatically,
//! mirroring the teacher's `CompositeBrokerBuilder` shape.

use std::time::Duration;

use gatekit_exposure::DEFAULT_FLUSH_INTERVAL;
use gatekit_exposure::DEFAULT_MAX_QUEUE_SIZE;
use gatekit_store::StoreOptions;

/// Default time [`crate::client::Client::new`] will wait for the initial
/// spec fetch before surfacing an uninitialized client.
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(3);

/// Programmatic configuration for [`crate::client::Client::new`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Spec store tuning (sync intervals, bootstrap values, id lists).
    pub store: StoreOptions,
    /// Exposure queue bound before a synchronous flush is forced.
    pub exposure_max_queue_size: usize,
    /// Interval between background exposure flushes.
    pub exposure_flush_interval: Duration,
    /// How long [`crate::client::Client::new`] waits for the initial spec
    /// fetch before giving up and returning an uninitialized client (§5
    /// "Cancellation/timeout").
    pub init_timeout: Duration,
    /// Suppresses all exposure logging when set, including through
    /// `manually_log_exposure`'s own call sites upstream of the logger
    /// (§4.F; the logger itself always dedups/queues what it is given).
    pub disable_log_exposures: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            store: StoreOptions::default(),
            exposure_max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            exposure_flush_interval: DEFAULT_FLUSH_INTERVAL,
            init_timeout: DEFAULT_INIT_TIMEOUT,
            disable_log_exposures: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = ClientOptions::default();
        assert_eq!(options.exposure_max_queue_size, 1000);
        assert_eq!(options.exposure_flush_interval, Duration::from_secs(60));
        assert_eq!(options.init_timeout, Duration::from_secs(3));
        assert!(!options.disable_log_exposures);
    }
}
