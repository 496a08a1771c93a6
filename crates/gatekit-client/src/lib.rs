// crates/gatekit-client/src/lib.rs
// ============================================================================
// Crate: gatekit-client
// Description: The public facade — wires spec store, evaluator, overrides,
// persisted storage, and exposure logging behind a single handle.
// Dependencies: gatekit-core, gatekit-eval, gatekit-exposure, gatekit-store
// ============================================================================

//! ## Overview
//! `gatekit-client` is the crate applications depend on directly. Everything
//! else in this workspace is a collaborator it composes:
//! [`gatekit_store::SpecStore`] for spec/id-list sync,
//! [`gatekit_eval::evaluator::Evaluator`] for rule evaluation,
//! [`gatekit_eval::overrides::OverrideStore`] for local overrides,
//! [`gatekit_eval::persisted::PersistedMediator`] for sticky/persisted
//! experiments, and [`gatekit_exposure::ExposureLogger`] for exposure
//! delivery. [`client::Client`] is the only type most callers construct
//! directly; [`global`] offers a process-wide singleton for callers that
//! prefer a free-function API (§9).

pub mod client;
pub mod config;
pub mod error;
pub mod global;
pub mod panic_guard;

pub use client::Client;
pub use config::ClientOptions;
pub use error::ClientError;
