//! Monotonic attempt counter shared by one logical operation site.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifies the most recently issued async attempt for a resource.
///
/// The counter only ever moves forward. Cheap to clone; clones share the
/// same underlying counter.
#[derive(Debug, Clone, Default)]
pub struct EpochCounter {
    current: Arc<AtomicU64>,
}

/// The epoch value captured when an attempt was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl EpochCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new attempt: bump the counter and capture its new value.
    pub fn issue(&self) -> Ticket {
        Ticket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Invalidate every outstanding ticket without starting an attempt.
    ///
    /// Used by undo: any in-flight confirmation becomes stale immediately.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    /// Whether `ticket` still identifies the latest issued attempt.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }
}
