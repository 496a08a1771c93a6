// crates/gatekit-client/src/error.rs
// ============================================================================
// Module: Gatekit Client Errors
// Description: The client facade's aggregated error type.
// Purpose: §7 "A top-level ClientError aggregates via #[from]".
// Dependencies: gatekit-store, thiserror
// ============================================================================

//! The client facade's aggregated error type.

use thiserror::Error;

/// Errors [`crate::client::Client::new`] can surface. Evaluation itself
/// never returns this type — the error boundary converts evaluation-time
/// failures into safe default results instead (§7).
///
/// Exceeding `ClientOptions::init_timeout` is not one of these: per §5 the
/// client is still returned, evaluating against an uninitialized snapshot
/// until the background fetch that is still running installs a real one.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The spec store failed to initialize from any configured source.
    #[error("spec store failed to initialize: {0}")]
    Init(#[from] gatekit_store::StoreInitError),
}
