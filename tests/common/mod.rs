//! Shared test utilities and mock infrastructure.

#![allow(dead_code)]

pub mod mock_search;

use freshstate::guard::GuardSnapshot;
use tokio::sync::watch;

/// Wait for the next settled snapshot: a committed result or a surfaced
/// error, skipping the busy transitions in between.
pub async fn wait_settled<T: Clone>(
    rx: &mut watch::Receiver<GuardSnapshot<T>>,
) -> GuardSnapshot<T> {
    loop {
        if rx.changed().await.is_err() {
            return rx.borrow().clone();
        }
        let snapshot = rx.borrow_and_update().clone();
        if !snapshot.phase.is_busy() {
            return snapshot;
        }
    }
}
