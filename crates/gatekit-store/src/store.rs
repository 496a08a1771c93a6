// crates/gatekit-store/src/store.rs
// ============================================================================
// Module: Gatekit Spec Store
// Description: Initialization order, background sync loops, and the
// snapshot read API.
// Purpose: §4.C "Spec store".
// Dependencies: gatekit-core, std::thread
// ============================================================================

//! ## Overview
//! [`SpecStore`] owns the single [`Snapshot`] a process evaluates against.
//! [`SpecStore::initialize`] follows §4.C's order: data adapter, then
//! caller-supplied bootstrap, then a live network fetch, falling back
//! through each source until one succeeds; it then starts two background
//! threads (config sync, id-list sync) that each swap in a freshly-built
//! snapshot without ever holding the read lock while fetching (§5).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;

use gatekit_core::clock::Clock;
use gatekit_core::interfaces::DataAdapter;
use gatekit_core::interfaces::DATA_ADAPTER_SPEC_CACHE_KEY;
use gatekit_core::interfaces::Transport;
use gatekit_core::result::SnapshotSource;
use gatekit_core::snapshot::Snapshot;
use gatekit_core::spec::IdList;
use gatekit_core::spec::WireSpecPayload;

use crate::config::StoreOptions;
use crate::error::StoreInitError;
use crate::id_list_manager::sync_id_lists;

/// Owns the live [`Snapshot`] and the background threads that keep it
/// current.
pub struct SpecStore {
    snapshot: RwLock<Arc<Snapshot>>,
    transport: Arc<dyn Transport>,
    data_adapter: Option<Arc<dyn DataAdapter>>,
    #[allow(dead_code, reason = "retained for parity with the source SDK's store handle shape")]
    clock: Arc<dyn Clock>,
    sdk_key: String,
    shutdown: Arc<AtomicBool>,
    threads: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl SpecStore {
    /// Runs §4.C's initialization order and starts the background sync
    /// threads.
    pub fn initialize(
        sdk_key: impl Into<String>,
        transport: Arc<dyn Transport>,
        data_adapter: Option<Arc<dyn DataAdapter>>,
        clock: Arc<dyn Clock>,
        options: &StoreOptions,
    ) -> Result<Arc<Self>, StoreInitError> {
        let initial_sync_time = clock.unix_seconds();
        let snapshot = bootstrap_snapshot(&transport, data_adapter.as_deref(), options, initial_sync_time)?;

        let store = Arc::new(Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            transport,
            data_adapter,
            clock,
            sdk_key: sdk_key.into(),
            shutdown: Arc::new(AtomicBool::new(false)),
            threads: std::sync::Mutex::new(Vec::new()),
        });

        store.spawn_config_sync_thread(options.config_sync_interval)?;
        if options.enable_id_lists {
            store.spawn_id_list_sync_thread(options.id_list_sync_interval)?;
        }

        Ok(store)
    }

    /// Returns the currently installed snapshot. Cheap: an `Arc` clone
    /// under a brief read lock, never held across a fetch (§5).
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read().expect("snapshot lock poisoned"))
    }

    /// Signals both background threads to stop, joins them, then invokes
    /// the data adapter's shutdown hook if one is configured (§5).
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let mut threads = self.threads.lock().expect("threads lock poisoned");
        for handle in threads.drain(..) {
            let _ = handle.join();
        }
        if let Some(adapter) = &self.data_adapter {
            if let Err(err) = adapter.shutdown() {
                tracing::warn!(error = %err, "data adapter shutdown hook failed");
            }
        }
    }

    fn spawn_config_sync_thread(self: &Arc<Self>, interval: std::time::Duration) -> Result<(), StoreInitError> {
        let store = Arc::clone(self);
        let handle = thread::Builder::new()
            .name("gatekit-config-sync".to_string())
            .spawn(move || config_sync_loop(&store, interval))
            .map_err(|err| StoreInitError::ThreadSpawnFailed(err.to_string()))?;
        self.threads.lock().expect("threads lock poisoned").push(handle);
        Ok(())
    }

    fn spawn_id_list_sync_thread(self: &Arc<Self>, interval: std::time::Duration) -> Result<(), StoreInitError> {
        let store = Arc::clone(self);
        let handle = thread::Builder::new()
            .name("gatekit-id-list-sync".to_string())
            .spawn(move || id_list_sync_loop(&store, interval))
            .map_err(|err| StoreInitError::ThreadSpawnFailed(err.to_string()))?;
        self.threads.lock().expect("threads lock poisoned").push(handle);
        Ok(())
    }

    /// Fetches and installs one fresh config-spec snapshot, preserving the
    /// currently held id lists untouched (the id-list thread owns those).
    fn sync_config_once(&self) {
        let current = self.snapshot();
        match self.transport.download_config_specs(current.last_sync_time) {
            Ok(payload) => {
                if !Snapshot::verify_sdk_key_hash(&self.sdk_key, payload.hashed_sdk_key_used.as_deref()) {
                    tracing::warn!("sdk key hash verification failed; discarding payload");
                    return;
                }
                self.install_payload(payload, &current);
            }
            Err(err) => {
                tracing::warn!(error = %err, "config spec sync failed; keeping prior snapshot");
            }
        }
    }

    fn install_payload(&self, payload: WireSpecPayload, current: &Snapshot) {
        if payload.time < current.last_sync_time {
            tracing::warn!(
                payload_time = payload.time,
                current_sync_time = current.last_sync_time,
                "discarding out-of-order config payload"
            );
            return;
        }

        if !payload.has_updates {
            // A not-modified response carries no (or stale placeholder)
            // spec data; keep the installed specs exactly as they are and
            // only retag source/sync time.
            let mut next = current.clone();
            next.source = SnapshotSource::NetworkNotModified;
            next.last_sync_time = payload.time;
            *self.snapshot.write().expect("snapshot lock poisoned") = Arc::new(next);
            return;
        }

        if let Some(adapter) = &self.data_adapter {
            if let Ok(serialized) = serde_json::to_string(&payload) {
                let _ = adapter.set(DATA_ADAPTER_SPEC_CACHE_KEY, &serialized);
            }
        }
        let next = Snapshot::install(payload, SnapshotSource::Network, current.id_lists.clone(), current.initial_sync_time);
        *self.snapshot.write().expect("snapshot lock poisoned") = Arc::new(next);
    }

    fn sync_id_lists_once(&self) {
        let current = self.snapshot();
        let directory = match self.transport.get_id_lists() {
            Ok(directory) => directory,
            Err(err) => {
                tracing::warn!(error = %err, "id list directory sync failed; keeping prior lists");
                return;
            }
        };
        let updated = sync_id_lists(self.transport.as_ref(), &directory, current.id_lists.clone());
        let mut next = (*current).clone();
        next.id_lists = updated;
        *self.snapshot.write().expect("snapshot lock poisoned") = Arc::new(next);
    }
}

fn config_sync_loop(store: &Arc<SpecStore>, interval: std::time::Duration) {
    while !store.shutdown.load(Ordering::SeqCst) {
        thread::sleep(interval);
        if store.shutdown.load(Ordering::SeqCst) {
            break;
        }
        store.sync_config_once();
    }
}

fn id_list_sync_loop(store: &Arc<SpecStore>, interval: std::time::Duration) {
    while !store.shutdown.load(Ordering::SeqCst) {
        thread::sleep(interval);
        if store.shutdown.load(Ordering::SeqCst) {
            break;
        }
        store.sync_id_lists_once();
    }
}

/// §4.C steps 1-6: data adapter, then bootstrap, then network, each
/// attempted in order until one yields a usable payload.
fn bootstrap_snapshot(
    transport: &Arc<dyn Transport>,
    data_adapter: Option<&dyn DataAdapter>,
    options: &StoreOptions,
    initial_sync_time: i64,
) -> Result<Snapshot, StoreInitError> {
    if let Some(adapter) = data_adapter {
        adapter.initialize()?;
        if let Some(cached) = adapter.get(DATA_ADAPTER_SPEC_CACHE_KEY)? {
            if let Ok(payload) = serde_json::from_str::<WireSpecPayload>(&cached) {
                return Ok(Snapshot::install(payload, SnapshotSource::DataAdapter, BTreeMap::new(), initial_sync_time));
            }
        }
    }

    if let Some(bootstrap) = &options.bootstrap_values {
        let payload: WireSpecPayload = serde_json::from_str(bootstrap)
            .map_err(|err| StoreInitError::InvalidBootstrap(err.to_string()))?;
        return Ok(Snapshot::install(payload, SnapshotSource::Bootstrap, BTreeMap::new(), initial_sync_time));
    }

    let payload = transport.download_config_specs(0)?;
    let id_lists: BTreeMap<String, IdList> = if options.enable_id_lists {
        let directory = transport.get_id_lists()?;
        sync_id_lists(transport.as_ref(), &directory, BTreeMap::new())
    } else {
        BTreeMap::new()
    };
    Ok(Snapshot::install(payload, SnapshotSource::Network, id_lists, initial_sync_time))
}
