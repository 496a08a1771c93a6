// crates/gatekit-core/src/clock.rs
// ============================================================================
// Module: Gatekit Clock
// Description: Injectable wall-clock access.
// Purpose: Give the `current_time` condition, id-list `creationTime`
// comparisons, and the spec store's sync-time bookkeeping a real clock
// without hard-coding `SystemTime::now()` at every call site.
// Dependencies: none
// ============================================================================

//! ## Overview
//! This crate's evaluation model is not built around deterministic replay of
//! caller-supplied logical timestamps: `current_time` conditions and
//! id-list `creationTime` comparisons need actual wall-clock time. [`Clock`]
//! is the seam that makes that dependency explicit and swappable in tests,
//! rather than reaching for `SystemTime::now()` directly throughout the
//! evaluator and spec store.

use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Source of wall-clock time for components that need it.
///
/// # Invariants
/// - `unix_millis` is monotonic non-decreasing for [`SystemClock`]; fakes
///   used in tests are free to violate this to exercise edge cases.
pub trait Clock: Send + Sync {
    /// Returns the current time as Unix epoch milliseconds.
    fn unix_millis(&self) -> i64;

    /// Returns the current time as Unix epoch seconds (used by the
    /// `current_time` condition, §4.E).
    fn unix_seconds(&self) -> i64 {
        self.unix_millis() / 1000
    }
}

/// [`Clock`] backed by [`SystemTime::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_millis(&self) -> i64 {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
    }
}

/// [`Clock`] with an explicitly settable, atomically-stored time, for tests
/// that need deterministic or advancing wall-clock behavior.
#[derive(Debug)]
pub struct FakeClock {
    millis: AtomicI64,
}

impl FakeClock {
    /// Creates a fake clock fixed at `unix_millis`.
    #[must_use]
    pub const fn new(unix_millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(unix_millis),
        }
    }

    /// Advances the fake clock by `delta_millis` (may be negative).
    pub fn advance(&self, delta_millis: i64) {
        self.millis.fetch_add(delta_millis, Ordering::SeqCst);
    }

    /// Sets the fake clock to an absolute value.
    pub fn set(&self, unix_millis: i64) {
        self.millis.store(unix_millis, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn unix_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_advances() {
        let clock = FakeClock::new(1_000);
        clock.advance(500);
        assert_eq!(clock.unix_millis(), 1_500);
    }

    #[test]
    fn system_clock_returns_plausible_time() {
        let clock = SystemClock;
        // Any time after 2020-01-01 in seconds.
        assert!(clock.unix_seconds() > 1_577_836_800);
    }
}
