//! Shared state cell for one epoch-guarded fetch site.

use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::debug;

use crate::error::FetchError;
use crate::guard::epoch::{EpochCounter, Ticket};
use crate::guard::status::FetchPhase;

/// Point-in-time view of a guarded fetch site.
///
/// `data` survives refreshes and failed revalidations so callers can keep
/// rendering the last settled value.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardSnapshot<T> {
    pub data: Option<T>,
    pub phase: FetchPhase,
    pub error: Option<FetchError>,
}

impl<T> Default for GuardSnapshot<T> {
    fn default() -> Self {
        Self {
            data: None,
            phase: FetchPhase::Idle,
            error: None,
        }
    }
}

/// Epoch-guarded async result cell.
///
/// Each attempt captures a [`Ticket`]; only the attempt whose ticket is
/// still current at completion time may commit. Superseded in-flight work
/// is aborted as a courtesy, never as the correctness mechanism.
pub struct ResultGuard<T> {
    epoch: EpochCounter,
    state: watch::Sender<GuardSnapshot<T>>,
    inflight: Mutex<Option<AbortHandle>>,
}

impl<T> Default for ResultGuard<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResultGuard<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        let (state, _) = watch::channel(GuardSnapshot::default());
        Self {
            epoch: EpochCounter::new(),
            state,
            inflight: Mutex::new(None),
        }
    }

    /// Watch state transitions. Receivers see every committed change.
    pub fn subscribe(&self) -> watch::Receiver<GuardSnapshot<T>> {
        self.state.subscribe()
    }

    /// Current state, cloned.
    pub fn snapshot(&self) -> GuardSnapshot<T> {
        self.state.borrow().clone()
    }

    /// Run `operation` for a new input on the same logical resource.
    ///
    /// Existing data stays visible under `Refreshing`; with no prior data
    /// the site enters `Loading`.
    pub fn load<F>(&self, operation: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let ticket = self.begin(|snapshot| {
            snapshot.phase = if snapshot.data.is_some() {
                FetchPhase::Refreshing
            } else {
                FetchPhase::Loading
            };
        });
        self.run(ticket, operation)
    }

    /// Run `operation` after switching to a different logical resource.
    ///
    /// `seed` replaces whatever was on display: a cache hit is shown
    /// immediately under `Refreshing`, a miss clears data and loads.
    pub fn load_seeded<F>(&self, seed: Option<T>, operation: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let ticket = self.begin(|snapshot| {
            snapshot.phase = if seed.is_some() {
                FetchPhase::Refreshing
            } else {
                FetchPhase::Loading
            };
            snapshot.data = seed;
        });
        self.run(ticket, operation)
    }

    /// Re-run `operation` on demand, always as a refresh of existing data.
    pub fn refresh<F>(&self, operation: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let ticket = self.begin(|snapshot| {
            snapshot.phase = FetchPhase::Refreshing;
        });
        self.run(ticket, operation)
    }

    /// Start a new attempt: bump the epoch, abort the superseded task,
    /// apply the entry transition.
    fn begin(&self, transition: impl FnOnce(&mut GuardSnapshot<T>)) -> Ticket {
        let ticket = self.epoch.issue();
        if let Some(previous) = self.inflight.lock().take() {
            previous.abort();
        }
        self.state.send_modify(|snapshot| {
            snapshot.error = None;
            transition(snapshot);
        });
        ticket
    }

    fn run<F>(&self, ticket: Ticket, operation: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let epoch = self.epoch.clone();
        let state = self.state.clone();
        let handle = tokio::spawn(async move {
            let result = operation.await;
            commit(&state, &epoch, ticket, result);
        });
        *self.inflight.lock() = Some(handle.abort_handle());
        handle
    }
}

/// Apply a completed attempt, unless it has been superseded.
///
/// The epoch check runs inside the watch critical section, so a commit is
/// atomic with respect to a concurrent `begin`.
fn commit<T>(
    state: &watch::Sender<GuardSnapshot<T>>,
    epoch: &EpochCounter,
    ticket: Ticket,
    result: Result<T, FetchError>,
) {
    state.send_if_modified(|snapshot| {
        if !epoch.is_current(ticket) {
            debug!("discarding response from superseded attempt");
            return false;
        }
        match result {
            Ok(data) => {
                snapshot.data = Some(data);
                snapshot.phase = FetchPhase::Idle;
                snapshot.error = None;
            }
            Err(error) if error.is_cancelled() => {
                debug!("discarding cancelled attempt");
                return false;
            }
            Err(error) => {
                snapshot.phase = FetchPhase::Error;
                snapshot.error = Some(error);
            }
        }
        true
    });
}
