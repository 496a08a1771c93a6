// crates/gatekit-exposure/src/lib.rs
// ============================================================================
// Crate: gatekit-exposure
// Description: Bounded, deduplicating exposure-event queue with background flush.
// Dependencies: gatekit-core, serde_jcs, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! `gatekit-exposure` owns the exposure pipeline described in §4.F: build an
//! [`event::ExposureEvent`] from an evaluation result, hand it to
//! [`logger::ExposureLogger::log`], and the logger takes care of
//! deduplication, batching, and background delivery to the configured
//! [`gatekit_core::interfaces::Transport`].

pub mod error;
pub mod event;
pub mod logger;

pub use error::ExposureLoggerError;
pub use event::ExposureEvent;
pub use event::ExposureKind;
pub use logger::DEFAULT_FLUSH_INTERVAL;
pub use logger::DEFAULT_MAX_QUEUE_SIZE;
pub use logger::ExposureLogger;
