// crates/gatekit-exposure/src/error.rs
// ============================================================================
// Module: Gatekit Exposure Errors
// Description: Error types surfaced by the exposure logger.
// ============================================================================

//! Error types surfaced by the exposure logger.

use thiserror::Error;

/// Errors the exposure logger can surface to a caller.
///
/// The background flush path never propagates these; it logs and keeps the
/// batch queued for the next attempt. This type exists for callers that
/// flush synchronously and want to observe failures directly.
#[derive(Debug, Error)]
pub enum ExposureLoggerError {
    /// The event batch could not be serialized for transport.
    #[error("failed to serialize exposure batch: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The transport rejected the batch.
    #[error("transport rejected exposure batch: {0}")]
    Transport(#[from] gatekit_core::interfaces::TransportError),
}
