// crates/gatekit-exposure/src/logger.rs
// ============================================================================
// Module: Gatekit Exposure Logger
// Description: Bounded, deduplicating exposure queue with background flush.
// Purpose: §4.F "Exposure logger".
// Dependencies: gatekit-core, std::thread
// ============================================================================

//! ## Overview
//! [`ExposureLogger`] dedups events by [`crate::event::ExposureEvent::dedup_key`]
//! within one flush window, flushes on an interval via a dedicated
//! background thread (mirroring the spec store's poller shape), and also
//! flushes synchronously the moment the queue would overflow its bound —
//! never dropping an event to make room (§4.F, §5).

use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use gatekit_core::interfaces::Transport;

use crate::event::ExposureEvent;

/// Default queue bound before a synchronous flush is forced.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;
/// Default interval between background flushes.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

struct QueueState {
    events: VecDeque<ExposureEvent>,
    seen_keys: HashSet<String>,
}

impl QueueState {
    fn new() -> Self {
        Self { events: VecDeque::new(), seen_keys: HashSet::new() }
    }

    fn push(&mut self, event: ExposureEvent) -> bool {
        let key = event.dedup_key();
        if !self.seen_keys.insert(key) {
            return false;
        }
        self.events.push_back(event);
        true
    }

    fn drain(&mut self) -> Vec<ExposureEvent> {
        self.seen_keys.clear();
        self.events.drain(..).collect()
    }
}

/// Queues exposure events and flushes them to a [`Transport`] in the
/// background.
pub struct ExposureLogger {
    transport: Arc<dyn Transport>,
    state: Mutex<QueueState>,
    max_queue_size: usize,
    shutdown: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl ExposureLogger {
    /// Creates a logger and starts its background flush thread.
    #[must_use]
    pub fn start(transport: Arc<dyn Transport>, max_queue_size: usize, flush_interval: Duration) -> Arc<Self> {
        let logger = Arc::new(Self {
            transport,
            state: Mutex::new(QueueState::new()),
            max_queue_size,
            shutdown: Arc::new(AtomicBool::new(false)),
            thread: Mutex::new(None),
        });

        let background = Arc::clone(&logger);
        let handle = thread::Builder::new()
            .name("gatekit-exposure-flush".to_string())
            .spawn(move || flush_loop(&background, flush_interval))
            .expect("failed to spawn exposure flush thread");
        *logger.thread.lock().expect("thread lock poisoned") = Some(handle);

        logger
    }

    /// Creates a logger with the default queue bound and flush interval.
    #[must_use]
    pub fn start_default(transport: Arc<dyn Transport>) -> Arc<Self> {
        Self::start(transport, DEFAULT_MAX_QUEUE_SIZE, DEFAULT_FLUSH_INTERVAL)
    }

    /// Queues `event` for flush, deduplicating against everything queued
    /// since the last flush. Forces a synchronous flush if the queue would
    /// otherwise exceed its bound (§4.F).
    pub fn log(&self, event: ExposureEvent) {
        let should_flush_now = {
            let mut state = self.state.lock().expect("exposure queue lock poisoned");
            state.push(event);
            state.events.len() >= self.max_queue_size
        };
        if should_flush_now {
            self.flush();
        }
    }

    /// Records an exposure regardless of the caller's `disableLogExposures`
    /// setting, per §4.F's manual-logging contract.
    pub fn manually_log(&self, event: ExposureEvent) {
        self.log(event);
    }

    /// Drains the queue and posts the batch to the transport. Events are
    /// re-queued (without re-triggering dedup) if the post fails, so a
    /// transient network failure does not silently lose exposures.
    pub fn flush(&self) {
        let batch = {
            let mut state = self.state.lock().expect("exposure queue lock poisoned");
            state.drain()
        };
        if batch.is_empty() {
            return;
        }
        let Ok(body) = serde_json::to_vec(&batch) else {
            tracing::warn!("failed to serialize exposure batch; dropping");
            return;
        };
        if let Err(err) = self.transport.post("/v1/log_event", &body) {
            tracing::warn!(error = %err, count = batch.len(), "exposure flush failed");
        }
    }

    /// Stops the background thread and flushes any remaining events.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.lock().expect("thread lock poisoned").take() {
            let _ = handle.join();
        }
        self.flush();
    }
}

fn flush_loop(logger: &Arc<ExposureLogger>, interval: Duration) {
    while !logger.shutdown.load(Ordering::SeqCst) {
        thread::sleep(interval);
        if logger.shutdown.load(Ordering::SeqCst) {
            break;
        }
        logger.flush();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use gatekit_core::interfaces::TransportError;
    use gatekit_core::result::EvalReason;
    use gatekit_core::result::EvaluationDetails;
    use gatekit_core::result::SnapshotSource;
    use gatekit_core::spec::IdListDirectory;
    use gatekit_core::spec::WireSpecPayload;
    use gatekit_core::user::User;
    use serde_json::json;

    use super::*;
    use crate::event::ExposureKind;

    struct CountingTransport {
        posted_batches: AtomicUsize,
        posted_events: AtomicUsize,
    }

    impl Transport for CountingTransport {
        fn download_config_specs(&self, _since_time: i64) -> Result<WireSpecPayload, TransportError> {
            unimplemented!("not exercised")
        }

        fn get_id_lists(&self) -> Result<IdListDirectory, TransportError> {
            unimplemented!("not exercised")
        }

        fn get_id_list(&self, _url: &str, _range_start: u64) -> Result<Vec<u8>, TransportError> {
            unimplemented!("not exercised")
        }

        fn post(&self, _path: &str, body: &[u8]) -> Result<(), TransportError> {
            self.posted_batches.fetch_add(1, Ordering::SeqCst);
            let events: Vec<serde_json::Value> = serde_json::from_slice(body).unwrap_or_default();
            self.posted_events.fetch_add(events.len(), Ordering::SeqCst);
            Ok(())
        }
    }

    fn sample_event(name: &str) -> ExposureEvent {
        ExposureEvent {
            kind: ExposureKind::Gate,
            name: name.to_string(),
            rule_id: "rule_1".to_string(),
            value: json!(true),
            secondary_exposures: Vec::new(),
            evaluation_details: EvaluationDetails {
                source: SnapshotSource::Network,
                reason: EvalReason::Rule,
                config_sync_time: 1,
                init_time: 1,
                server_time: 1,
                has_seen_analytical_gates: false,
            },
            user: User::with_user_id("u1"),
            time: 1,
            is_manual_exposure: false,
        }
    }

    #[test]
    fn duplicate_events_are_deduplicated_within_a_window() {
        let transport = Arc::new(CountingTransport { posted_batches: AtomicUsize::new(0), posted_events: AtomicUsize::new(0) });
        let logger = ExposureLogger::start(transport.clone(), 1000, Duration::from_secs(3600));
        logger.log(sample_event("g1"));
        logger.log(sample_event("g1"));
        logger.flush();
        assert_eq!(transport.posted_events.load(Ordering::SeqCst), 1);
        logger.shutdown();
    }

    #[test]
    fn overflow_triggers_synchronous_flush() {
        let transport = Arc::new(CountingTransport { posted_batches: AtomicUsize::new(0), posted_events: AtomicUsize::new(0) });
        let logger = ExposureLogger::start(transport.clone(), 2, Duration::from_secs(3600));
        logger.log(sample_event("g1"));
        logger.log(sample_event("g2"));
        assert_eq!(transport.posted_batches.load(Ordering::SeqCst), 1);
        logger.shutdown();
    }
}
