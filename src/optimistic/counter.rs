//! Counter mutations with relative rollback.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::source::MutationApi;

/// Point-in-time view of an optimistic counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    pub value: i64,
    /// Confirmations still outstanding.
    pub inflight: u32,
}

/// A counter whose mutations may overlap.
///
/// Rollback on failure is by the failing mutation's own delta, never to a
/// captured absolute value: a failure therefore cannot wipe out a later,
/// unrelated mutation that already succeeded.
pub struct OptimisticCounter<A> {
    api: Arc<A>,
    state: watch::Sender<CounterSnapshot>,
}

impl<A: MutationApi> OptimisticCounter<A> {
    pub fn new(initial: i64, api: Arc<A>) -> Self {
        let (state, _) = watch::channel(CounterSnapshot {
            value: initial,
            inflight: 0,
        });
        Self { api, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<CounterSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        *self.state.borrow()
    }

    /// Apply `delta` now; undo exactly `delta` if confirmation fails.
    pub fn add(&self, delta: i64) -> JoinHandle<()> {
        self.state.send_modify(|snapshot| {
            snapshot.value += delta;
            snapshot.inflight += 1;
        });

        let api = Arc::clone(&self.api);
        let state = self.state.clone();
        tokio::spawn(async move {
            let result = api.confirm().await;
            state.send_modify(|snapshot| {
                snapshot.inflight -= 1;
                if let Err(error) = result {
                    warn!(%error, delta, "counter mutation failed, undoing delta");
                    snapshot.value -= delta;
                }
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CallPlan, MockMutationApi};

    fn counter(initial: i64) -> (Arc<MockMutationApi>, OptimisticCounter<MockMutationApi>) {
        let api = Arc::new(MockMutationApi::new());
        let counter = OptimisticCounter::new(initial, Arc::clone(&api));
        (api, counter)
    }

    #[tokio::test(start_paused = true)]
    async fn increment_is_applied_immediately() {
        let (_api, counter) = counter(10);
        let _confirm = counter.add(1);
        assert_eq!(counter.snapshot().value, 11);
        assert_eq!(counter.snapshot().inflight, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn single_failure_round_trips_to_initial() {
        let (api, counter) = counter(10);
        api.enqueue(CallPlan::fail_after(0));
        counter.add(1).await.unwrap();

        let snapshot = counter.snapshot();
        assert_eq!(snapshot.value, 10);
        assert_eq!(snapshot.inflight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn late_failure_keeps_earlier_committed_mutation() {
        let (api, counter) = counter(0);
        // A confirms quickly and succeeds; B is slower and fails.
        api.enqueue(CallPlan::ok_after(50));
        api.enqueue(CallPlan::fail_after(400));

        let a = counter.add(1);
        let b = counter.add(1);
        assert_eq!(counter.snapshot().value, 2);

        a.await.unwrap();
        assert_eq!(counter.snapshot().value, 2);

        b.await.unwrap();
        // B's rollback undoes only B's delta; A's success is intact.
        let snapshot = counter.snapshot();
        assert_eq!(snapshot.value, 1);
        assert_eq!(snapshot.inflight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_completing_after_later_success_is_still_relative() {
        let (api, counter) = counter(0);
        // A fails slowly; B succeeds fast and lands first.
        api.enqueue(CallPlan::fail_after(400));
        api.enqueue(CallPlan::ok_after(50));

        let a = counter.add(1);
        let b = counter.add(1);

        b.await.unwrap();
        assert_eq!(counter.snapshot().value, 2);

        a.await.unwrap();
        assert_eq!(counter.snapshot().value, 1);
    }
}
