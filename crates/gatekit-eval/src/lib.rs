// crates/gatekit-eval/src/lib.rs
// ============================================================================
// Crate: gatekit-eval
// Description: The recursive rule/condition evaluation engine.
// Dependencies: gatekit-core, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! `gatekit-eval` turns one [`gatekit_core::snapshot::Snapshot`] plus one
//! [`gatekit_core::user::User`] into an [`gatekit_core::EvalResult`]. It has
//! no knowledge of networking, storage, or exposure logging — those are
//! `gatekit-store`, `gatekit-exposure`, and `gatekit-client`'s concerns. The
//! [`evaluator::Evaluator`] entry point is the whole public surface most
//! callers need; [`overrides::OverrideStore`] and [`persisted::PersistedMediator`]
//! are composed in by `gatekit-client`.

pub mod bucketing;
pub mod comparator;
pub mod conditions;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod overrides;
pub mod persisted;
pub mod tristate;

pub use context::EvalContext;
pub use context::MAX_RECURSION_DEPTH;
pub use error::EvaluatorError;
pub use evaluator::Evaluator;
