//! Debounced value propagation.
//!
//! A [`Debouncer`] accepts a rapidly changing raw value and commits it
//! downstream only once it has survived a fixed window of silence. Each
//! new value replaces the pending one and re-arms the single timer, so at
//! most one commit is ever scheduled. Dropping the debouncer discards any
//! value still waiting out its window.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::trace;

/// Delays propagating a changing value until it settles for `delay`.
pub struct Debouncer<T: Send + 'static> {
    tx: mpsc::UnboundedSender<T>,
    // Keeps the background task identifiable; it exits on its own once the
    // sender side is dropped.
    _task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the debounce task. `sink` receives each committed value.
    pub fn new(delay: Duration, sink: impl FnMut(T) + Send + 'static) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(debounce_loop(rx, delay, sink));
        Self { tx, _task: task }
    }

    /// Feed a new raw value, cancelling and replacing any pending commit.
    pub fn update(&self, value: T) {
        let _ = self.tx.send(value);
    }
}

/// Waits for `delay` of silence after the most recent value before
/// committing it. A closed channel discards the pending value.
async fn debounce_loop<T>(
    mut rx: mpsc::UnboundedReceiver<T>,
    delay: Duration,
    mut sink: impl FnMut(T),
) {
    while let Some(mut latest) = rx.recv().await {
        loop {
            tokio::select! {
                _ = sleep(delay) => {
                    sink(latest);
                    break;
                }
                next = rx.recv() => match next {
                    Some(value) => {
                        trace!("re-arming debounce window");
                        latest = value;
                    }
                    None => return,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use parking_lot::Mutex;
    use tokio::time::advance;

    fn collector() -> (Arc<Mutex<Vec<u32>>>, impl FnMut(u32) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        (seen, move |value| sink_seen.lock().push(value))
    }

    #[tokio::test(start_paused = true)]
    async fn commits_after_silence() {
        let (seen, sink) = collector();
        let debouncer = Debouncer::new(Duration::from_millis(300), sink);

        debouncer.update(1);
        sleep(Duration::from_millis(301)).await;
        assert_eq!(*seen.lock(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_updates_commit_only_the_last() {
        let (seen, sink) = collector();
        let debouncer = Debouncer::new(Duration::from_millis(300), sink);

        for value in [1, 2, 3, 4] {
            debouncer.update(value);
            sleep(Duration::from_millis(100)).await;
        }
        sleep(Duration::from_millis(301)).await;

        assert_eq!(*seen.lock(), vec![4]);
    }

    #[tokio::test(start_paused = true)]
    async fn each_silent_window_commits_once() {
        let (seen, sink) = collector();
        let debouncer = Debouncer::new(Duration::from_millis(300), sink);

        debouncer.update(1);
        sleep(Duration::from_millis(301)).await;
        debouncer.update(2);
        sleep(Duration::from_millis(301)).await;

        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_before_window_elapses_discards() {
        let (seen, sink) = collector();
        let debouncer = Debouncer::new(Duration::from_millis(300), sink);

        debouncer.update(1);
        sleep(Duration::from_millis(100)).await;
        drop(debouncer);
        // Let the debounce task observe the closed channel before the
        // window would have elapsed.
        tokio::task::yield_now().await;

        advance(Duration::from_millis(1000)).await;
        assert!(seen.lock().is_empty());
    }
}
