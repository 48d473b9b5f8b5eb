//! Shutdown token shared between the owner and its workers
//!
//! The token is constructed by the owning grid and handed to the worker
//! pool by clone; there is no process-wide shutdown state. Once triggered
//! it never resets: in-flight jobs may still finish, but their results are
//! discarded at delivery.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// One-way shutdown flag shared by reference-counted handle.
///
/// Workers check `is_triggered()` before touching shared state or starting
/// a decode; the owner checks it before applying any delivered result.
///
/// # Example
///
/// ```
/// use artgrid_scheduler::ShutdownToken;
///
/// let token = ShutdownToken::new();
/// let worker_token = token.clone();
///
/// token.trigger();
/// assert!(worker_token.is_triggered());
/// ```
#[derive(Clone, Default)]
pub struct ShutdownToken {
    triggered: Arc<AtomicBool>,
}

impl ShutdownToken {
    /// Create a new token in the running state.
    pub fn new() -> Self {
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal shutdown.
    ///
    /// All clones observe the trigger. Idempotent.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::Release);
    }

    /// Check whether shutdown has been signalled.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_running() {
        let token = ShutdownToken::new();
        assert!(!token.is_triggered());
    }

    #[test]
    fn test_clones_share_state() {
        let token = ShutdownToken::new();
        let clone = token.clone();

        token.trigger();

        assert!(token.is_triggered());
        assert!(clone.is_triggered());
    }

    #[test]
    fn test_trigger_is_idempotent() {
        let token = ShutdownToken::new();
        token.trigger();
        token.trigger();
        assert!(token.is_triggered());
    }
}
