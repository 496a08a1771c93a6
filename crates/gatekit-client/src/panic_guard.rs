// crates/gatekit-client/src/panic_guard.rs
// ============================================================================
// Module: Gatekit Panic Guard
// Description: The public-entry-point error boundary (§7).
// Dependencies: gatekit-core
// ============================================================================

//! ## Overview
//! Every [`crate::client::Client`] public entry point runs its evaluation
//! through [`PanicGuard::run`] rather than calling the evaluator directly.
//! A panic is caught, its message deduped by signature for the lifetime of
//! the process, reported once through the configured
//! [`gatekit_core::interfaces::ObservabilityClient`], and converted into
//! `None` so the caller can substitute a safe default (§7 "deduped by error
//! signature within a process").

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::Mutex;

use gatekit_core::interfaces::ObservabilityClient;

/// Captures and dedupes panics from the evaluation path.
pub struct PanicGuard {
    seen_signatures: Mutex<HashSet<String>>,
    observability: Arc<dyn ObservabilityClient>,
}

impl PanicGuard {
    /// Builds a guard reporting through `observability`.
    #[must_use]
    pub fn new(observability: Arc<dyn ObservabilityClient>) -> Self {
        Self {
            seen_signatures: Mutex::new(HashSet::new()),
            observability,
        }
    }

    /// Runs `body`, catching any panic. Returns `None` on panic after
    /// reporting it (once per unique signature); returns `Some` otherwise.
    ///
    /// `body` need not be [`std::panic::UnwindSafe`] itself: it is wrapped
    /// in [`AssertUnwindSafe`] here because the client facade's own state
    /// (trait-object collaborators behind `Arc`) does not infer that
    /// marker, and a caught panic never leaves that state half-written.
    pub fn run<T>(&self, label: &str, body: impl FnOnce() -> T) -> Option<T> {
        match std::panic::catch_unwind(AssertUnwindSafe(body)) {
            Ok(value) => Some(value),
            Err(payload) => {
                let message = panic_message(&payload);
                let signature = format!("{label}: {message}");
                self.report_once(&signature, &message);
                None
            }
        }
    }

    fn report_once(&self, signature: &str, message: &str) {
        let is_new = self
            .seen_signatures
            .lock()
            .expect("panic signature set lock poisoned")
            .insert(signature.to_string());
        if is_new {
            tracing::error!(signature = %signature, "panic captured at client error boundary");
            self.observability.report_error(signature, message);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
