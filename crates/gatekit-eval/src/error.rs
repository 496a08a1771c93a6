// crates/gatekit-eval/src/error.rs
// ============================================================================
// Module: Gatekit Evaluator Errors
// Description: Typed failures the evaluator can return.
// Purpose: §7 ERROR HANDLING DESIGN (EvaluationOverflow).
// Dependencies: thiserror
// ============================================================================

//! Typed failures the evaluator can return.

use thiserror::Error;

/// Errors the evaluator can return from a top-level entry point.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvaluatorError {
    /// Recursion depth exceeded [`crate::context::MAX_RECURSION_DEPTH`]
    /// (§7 `EvaluationOverflow`). Represented as a typed error rather than
    /// an actual panic; the public-call boundary (`gatekit-client`) is
    /// still responsible for converting any error into a safe default.
    #[error("evaluation recursion limit exceeded")]
    RecursionLimitExceeded,
}
