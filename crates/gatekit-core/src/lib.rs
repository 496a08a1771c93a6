// crates/gatekit-core/src/lib.rs
// ============================================================================
// Crate: gatekit-core
// Description: Core types, hashing, coercion, and external-collaborator
// interfaces shared by every other Gatekit crate.
// Dependencies: base64, bigdecimal, regex, serde, serde_jcs, serde_json,
// sha2, thiserror, time
// ============================================================================

//! ## Overview
//! `gatekit-core` has no dependency on any other Gatekit crate: it is the
//! vocabulary layer. `gatekit-store` builds [`snapshot::Snapshot`]s from
//! network/adapter data, `gatekit-eval` evaluates them, and
//! `gatekit-exposure` logs the results — all against the types defined here.

pub mod clock;
pub mod hashing;
pub mod identifiers;
pub mod interfaces;
pub mod result;
pub mod snapshot;
pub mod spec;
pub mod time_parse;
pub mod user;
pub mod value;
pub mod version;

pub use clock::Clock;
pub use clock::SystemClock;
pub use result::EvalResult;
pub use result::EvaluationDetails;
pub use result::SecondaryExposure;
pub use snapshot::Snapshot;
pub use user::User;
pub use value::DynamicValue;
