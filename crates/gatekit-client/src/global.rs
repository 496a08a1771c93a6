// crates/gatekit-client/src/global.rs
// ============================================================================
// Module: Gatekit Global Client Handle
// Description: Process-wide optional singleton over Client.
// Purpose: §9 "a thin wrapper backed by a once-cell".
// Dependencies: (none beyond std)
// ============================================================================

//! ## Overview
//! The source SDK keeps a package-level singleton client. Here that is an
//! explicit opt-in: [`initialize`] installs a [`Client`] into a
//! [`std::sync::OnceLock`], and [`instance`] hands back a reference to it.
//! Nothing in [`crate::client::Client`] itself depends on this module —
//! callers who prefer to own their handle directly can ignore it entirely.

use std::sync::OnceLock;

use crate::client::Client;

static GLOBAL_CLIENT: OnceLock<Client> = OnceLock::new();

/// Installs `client` as the process-wide instance. Returns the client back
/// (unwrapped) if one was already installed, since a `OnceLock` accepts only
/// its first write.
pub fn initialize(client: Client) -> Result<(), Client> {
    GLOBAL_CLIENT.set(client)
}

/// Returns the process-wide instance, if [`initialize`] has been called.
#[must_use]
pub fn instance() -> Option<&'static Client> {
    GLOBAL_CLIENT.get()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use gatekit_core::clock::FakeClock;
    use gatekit_core::interfaces::NoopObservabilityClient;
    use gatekit_core::interfaces::TransportError;
    use gatekit_core::spec::IdListDirectory;
    use gatekit_core::spec::WireSpecPayload;
    use gatekit_core::interfaces::Transport;
    use gatekit_store::StoreOptions;

    use super::*;
    use crate::config::ClientOptions;

    struct EmptyTransport;

    impl Transport for EmptyTransport {
        fn download_config_specs(&self, _since_time: i64) -> Result<WireSpecPayload, TransportError> {
            Ok(WireSpecPayload {
                has_updates: false,
                time: 0,
                feature_gates: Vec::new(),
                dynamic_configs: Vec::new(),
                layer_configs: Vec::new(),
                layers: std::collections::BTreeMap::new(),
                id_lists: std::collections::BTreeMap::new(),
                sdk_keys_to_app_ids: std::collections::BTreeMap::new(),
                hashed_sdk_keys_to_app_ids: std::collections::BTreeMap::new(),
                hashed_sdk_key_used: None,
            })
        }

        fn get_id_lists(&self) -> Result<IdListDirectory, TransportError> {
            Ok(IdListDirectory::new())
        }

        fn get_id_list(&self, _url: &str, _range_start: u64) -> Result<Vec<u8>, TransportError> {
            Ok(Vec::new())
        }

        fn post(&self, _path: &str, _body: &[u8]) -> Result<(), TransportError> {
            Ok(())
        }
    }

    // `GLOBAL_CLIENT` is process-wide; a successful `initialize` from any
    // test in this binary makes `instance()` permanently `Some` for the
    // rest of the process, which is the property this test relies on.
    #[test]
    fn instance_is_populated_after_initialize_succeeds_somewhere_in_the_process() {
        let client = Client::with_collaborators(
            "secret",
            ClientOptions {
                store: StoreOptions {
                    config_sync_interval: Duration::from_secs(3600),
                    id_list_sync_interval: Duration::from_secs(3600),
                    bootstrap_values: None,
                    enable_id_lists: false,
                },
                init_timeout: Duration::from_secs(5),
                ..ClientOptions::default()
            },
            Arc::new(EmptyTransport),
            None,
            None,
            Arc::new(FakeClock::new(1_700_000_000_000)),
            Arc::new(NoopObservabilityClient),
        )
        .expect("initializes");

        let _ = initialize(client);
        assert!(instance().is_some());
    }
}
