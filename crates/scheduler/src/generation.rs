//! Generation guard for invalidating in-flight work
//!
//! The item set behind the grid can be rebuilt (re-grouped, re-sorted,
//! filtered) while decodes for the old set are still in flight. Every job
//! is stamped with the generation current at submission time; every
//! delivered result is checked against the generation current at delivery
//! time. A mismatch means the result belongs to a dead item set and is
//! dropped with no side effects.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Monotonically increasing item-set version.
pub type Generation = u64;

/// Shared monotonic generation counter.
///
/// Cloned handles observe the same counter; bumping from the owner thread
/// invalidates every job stamped with an earlier generation.
///
/// # Example
///
/// ```
/// use artgrid_scheduler::GenerationGuard;
///
/// let guard = GenerationGuard::new();
/// let stamped = guard.current();
///
/// guard.bump();
/// assert_ne!(guard.current(), stamped);
/// ```
#[derive(Clone, Default)]
pub struct GenerationGuard {
    current: Arc<AtomicU64>,
}

impl GenerationGuard {
    /// Create a guard starting at generation 0.
    pub fn new() -> Self {
        Self {
            current: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Advance to the next generation and return it.
    pub fn bump(&self) -> Generation {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The current generation.
    pub fn current(&self) -> Generation {
        self.current.load(Ordering::SeqCst)
    }

    /// Check a stamped generation against the current one.
    pub fn is_current(&self, stamped: Generation) -> bool {
        self.current() == stamped
    }
}
