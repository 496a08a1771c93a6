// crates/gatekit-eval/src/context.rs
// ============================================================================
// Module: Gatekit Evaluation Context
// Description: Per-call mutable evaluation state.
// Purpose: §4.E "evalContext".
// Dependencies: gatekit-core
// ============================================================================

//! ## Overview
//! One [`EvalContext`] is created per public entry-point call and threaded
//! through the whole recursive evaluation. It is never shared across calls.

use std::collections::BTreeMap;

use gatekit_core::hashing::NameHashAlgorithm;
use gatekit_core::interfaces::StickyValues;

/// Maximum recursion depth before evaluation is considered an
/// [`crate::error::EvaluatorError::RecursionLimitExceeded`] (§3 invariants,
/// §7 `EvaluationOverflow`).
pub const MAX_RECURSION_DEPTH: u32 = 300;

/// Per-call evaluation state, threaded through one recursive evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    /// SDK client key the caller authenticated with, if any.
    pub client_key: Option<String>,
    /// Target application id resolved for this call.
    pub target_app_id: Option<String>,
    /// Name-hashing strategy selected for exposure/initialize output.
    pub name_hash_algorithm: Option<NameHashAlgorithm>,
    /// Sticky values supplied by the caller for this call, keyed by config
    /// name. `None` means "no sticky behavior this call" (§4.E).
    pub persisted_values: Option<BTreeMap<String, StickyValues>>,
    /// Whether exposure logging should be suppressed for this call.
    pub disable_log_exposures: bool,
    /// Current recursion depth; incremented on each nested gate/config/layer
    /// evaluation.
    pub depth: u32,
}

impl EvalContext {
    /// Creates a fresh top-level context (depth zero).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a context representing one additional level of recursion,
    /// or `None` once [`MAX_RECURSION_DEPTH`] would be exceeded.
    #[must_use]
    pub fn nested(&self) -> Option<Self> {
        if self.depth >= MAX_RECURSION_DEPTH {
            return None;
        }
        Some(Self {
            depth: self.depth + 1,
            ..self.clone()
        })
    }
}
