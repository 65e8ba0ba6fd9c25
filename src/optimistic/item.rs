//! Single-value optimistic mutation with an undo window.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::guard::EpochCounter;
use crate::source::MutationApi;

/// Status of the item's most recent mutation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,
    /// Applied locally, confirmation outstanding.
    Pending,
    /// Confirmation failed; the value was rolled back.
    Error,
}

/// Point-in-time view of an optimistic item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSnapshot<T> {
    pub value: T,
    pub status: MutationStatus,
    /// The undo affordance is offered only while the grace window or the
    /// confirming call is outstanding.
    pub undo_available: bool,
}

struct PendingMutation<T> {
    prior: T,
    abort: AbortHandle,
}

/// A value mutated locally first and confirmed in the background.
///
/// `apply` shows the new value immediately, waits out a grace delay (the
/// user's chance to [`undo`](Self::undo)), then runs the confirming
/// operation. Failure restores the pre-mutation value. A second `apply`
/// while one confirmation is outstanding is rejected.
pub struct OptimisticItem<T, A> {
    api: Arc<A>,
    grace: Duration,
    epoch: EpochCounter,
    state: watch::Sender<ItemSnapshot<T>>,
    pending: Arc<Mutex<Option<PendingMutation<T>>>>,
}

impl<T, A> OptimisticItem<T, A>
where
    T: Clone + Send + Sync + 'static,
    A: MutationApi,
{
    pub fn new(initial: T, api: Arc<A>, grace: Duration) -> Self {
        let (state, _) = watch::channel(ItemSnapshot {
            value: initial,
            status: MutationStatus::Idle,
            undo_available: false,
        });
        Self {
            api,
            grace,
            epoch: EpochCounter::new(),
            state,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ItemSnapshot<T>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ItemSnapshot<T> {
        self.state.borrow().clone()
    }

    /// Apply `mutate` locally now; confirm after the grace delay.
    ///
    /// Returns `None` (and changes nothing) while a previous confirmation
    /// is still outstanding. After an error, calling `apply` again is the
    /// retry path.
    pub fn apply(&self, mutate: impl FnOnce(&T) -> T) -> Option<JoinHandle<()>> {
        let prior = {
            let snapshot = self.state.borrow();
            if snapshot.status == MutationStatus::Pending {
                debug!("mutation rejected: confirmation already outstanding");
                return None;
            }
            snapshot.value.clone()
        };

        let next = mutate(&prior);
        self.state.send_modify(|snapshot| {
            snapshot.value = next;
            snapshot.status = MutationStatus::Pending;
            snapshot.undo_available = true;
        });

        let ticket = self.epoch.issue();
        let api = Arc::clone(&self.api);
        let epoch = self.epoch.clone();
        let state = self.state.clone();
        let pending = Arc::clone(&self.pending);
        let grace = self.grace;
        let rollback = prior.clone();

        let handle = tokio::spawn(async move {
            sleep(grace).await;
            let result = api.confirm().await;
            state.send_if_modified(|snapshot| {
                if !epoch.is_current(ticket) {
                    debug!("discarding confirmation of superseded mutation");
                    return false;
                }
                match result {
                    Ok(()) => {
                        snapshot.status = MutationStatus::Idle;
                        snapshot.undo_available = false;
                    }
                    Err(error) => {
                        warn!(%error, "mutation failed, rolling back");
                        snapshot.value = rollback;
                        snapshot.status = MutationStatus::Error;
                        snapshot.undo_available = false;
                    }
                }
                true
            });
            if epoch.is_current(ticket) {
                pending.lock().take();
            }
        });

        *self.pending.lock() = Some(PendingMutation {
            prior,
            abort: handle.abort_handle(),
        });
        Some(handle)
    }

    /// Cancel the outstanding mutation and restore the pre-mutation value.
    ///
    /// A no-op once the confirmation has settled (the affordance is gone).
    pub fn undo(&self) {
        if !self.state.borrow().undo_available {
            return;
        }
        let Some(mutation) = self.pending.lock().take() else {
            return;
        };
        mutation.abort.abort();
        self.epoch.invalidate();
        self.state.send_modify(|snapshot| {
            snapshot.value = mutation.prior;
            snapshot.status = MutationStatus::Idle;
            snapshot.undo_available = false;
        });
    }
}
