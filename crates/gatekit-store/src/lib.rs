// crates/gatekit-store/src/lib.rs
// ============================================================================
// Crate: gatekit-store
// Description: Background-synced spec store and id-list manager.
// Dependencies: gatekit-core, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! `gatekit-store` is the only crate that talks to [`gatekit_core::interfaces::Transport`]
//! and [`gatekit_core::interfaces::DataAdapter`]. [`store::SpecStore`] is its
//! public surface: construct one via [`store::SpecStore::initialize`], read
//! the live snapshot via [`store::SpecStore::snapshot`], and call
//! [`store::SpecStore::shutdown`] to stop its background threads.

pub mod config;
pub mod error;
pub mod id_list_manager;
pub mod store;

pub use config::StoreOptions;
pub use error::StoreInitError;
pub use store::SpecStore;
