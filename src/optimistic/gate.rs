//! Re-entry suppression for a single mutating action.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Gates an action on a pending flag instead of epochs: overlapping
/// invocations are rejected outright while one confirmation is
/// outstanding.
#[derive(Debug, Clone, Default)]
pub struct IdempotentGate {
    pending: Arc<AtomicBool>,
}

impl IdempotentGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate. Returns `false` if an invocation is already
    /// outstanding.
    pub fn try_acquire(&self) -> bool {
        self.pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Release after the confirming operation settles, success or not.
    pub fn release(&self) {
        self.pending.store(false, Ordering::SeqCst);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }
}
