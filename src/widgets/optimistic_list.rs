//! Optimistic task list and the gated like counter.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::optimistic::{
    CounterSnapshot, IdempotentGate, ItemSnapshot, OptimisticCounter, OptimisticItem,
};
use crate::source::MutationApi;

/// One row of the optimistic task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

impl TaskRow {
    /// The default four-task fixture.
    pub fn default_rows() -> Vec<TaskRow> {
        [
            ("1", "Write proposal", false),
            ("2", "Review PRs", true),
            ("3", "Prepare interview", false),
            ("4", "Refactor legacy code", true),
        ]
        .into_iter()
        .map(|(id, title, completed)| TaskRow {
            id: id.to_string(),
            title: title.to_string(),
            completed,
        })
        .collect()
    }
}

/// Rows of independently optimistic items over one confirmation API.
///
/// Toggling a row's `completed` flag applies immediately, offers undo
/// during the grace window, and rolls back if the confirmation fails.
pub struct OptimisticList<A> {
    rows: Vec<OptimisticItem<TaskRow, A>>,
}

impl<A: MutationApi> OptimisticList<A> {
    pub fn new(rows: Vec<TaskRow>, api: Arc<A>, grace: Duration) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|row| OptimisticItem::new(row, Arc::clone(&api), grace))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Optimistically flip row `index`. `None` if the index is out of
    /// range or the row's previous mutation is still confirming.
    pub fn toggle(&self, index: usize) -> Option<JoinHandle<()>> {
        self.rows.get(index)?.apply(|row| TaskRow {
            completed: !row.completed,
            ..row.clone()
        })
    }

    pub fn undo(&self, index: usize) {
        if let Some(row) = self.rows.get(index) {
            row.undo();
        }
    }

    pub fn row(&self, index: usize) -> Option<ItemSnapshot<TaskRow>> {
        self.rows.get(index).map(|row| row.snapshot())
    }

    pub fn rows(&self) -> Vec<ItemSnapshot<TaskRow>> {
        self.rows.iter().map(|row| row.snapshot()).collect()
    }
}

/// Like counter: optimistic increment with relative rollback, gated so
/// overlapping likes are suppressed rather than raced.
pub struct LikeButton<A> {
    counter: OptimisticCounter<A>,
    gate: IdempotentGate,
}

impl<A: MutationApi> LikeButton<A> {
    pub fn new(initial_likes: i64, api: Arc<A>) -> Self {
        Self {
            counter: OptimisticCounter::new(initial_likes, api),
            gate: IdempotentGate::new(),
        }
    }

    /// Register a like. `None` while the previous one is still
    /// confirming.
    pub fn like(&self) -> Option<JoinHandle<()>> {
        if !self.gate.try_acquire() {
            debug!("like suppressed, confirmation outstanding");
            return None;
        }
        let gate = self.gate.clone();
        let confirm = self.counter.add(1);
        Some(tokio::spawn(async move {
            let _ = confirm.await;
            gate.release();
        }))
    }

    pub fn likes(&self) -> i64 {
        self.counter.snapshot().value
    }

    pub fn is_pending(&self) -> bool {
        self.gate.is_pending()
    }

    pub fn subscribe(&self) -> watch::Receiver<CounterSnapshot> {
        self.counter.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimistic::MutationStatus;
    use crate::source::{CallPlan, MockMutationApi};

    const GRACE: Duration = Duration::from_millis(3000);

    #[tokio::test(start_paused = true)]
    async fn toggle_round_trips_through_failure() {
        let api = Arc::new(MockMutationApi::new());
        let list = OptimisticList::new(TaskRow::default_rows(), Arc::clone(&api), GRACE);
        api.enqueue(CallPlan::fail_after(0));

        let confirm = list.toggle(0).unwrap();
        let row = list.row(0).unwrap();
        assert!(row.value.completed);
        assert_eq!(row.status, MutationStatus::Pending);
        assert!(row.undo_available);

        confirm.await.unwrap();
        let row = list.row(0).unwrap();
        assert!(!row.value.completed);
        assert_eq!(row.status, MutationStatus::Error);
        assert!(!row.undo_available);
    }

    #[tokio::test(start_paused = true)]
    async fn rows_are_independent() {
        let api = Arc::new(MockMutationApi::new());
        let list = OptimisticList::new(TaskRow::default_rows(), Arc::clone(&api), GRACE);
        api.enqueue(CallPlan::instant());

        let confirm = list.toggle(1).unwrap();
        assert_eq!(list.row(0).unwrap().status, MutationStatus::Idle);
        assert_eq!(list.row(1).unwrap().status, MutationStatus::Pending);

        confirm.await.unwrap();
        assert!(!list.row(1).unwrap().value.completed);
        assert_eq!(list.row(1).unwrap().status, MutationStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_toggle_is_none() {
        let api = Arc::new(MockMutationApi::new());
        let list = OptimisticList::new(vec![], api, GRACE);
        assert!(list.toggle(0).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_likes_are_suppressed() {
        let api = Arc::new(MockMutationApi::new());
        let button = LikeButton::new(10, Arc::clone(&api));
        api.enqueue(CallPlan::ok_after(500));

        let first = button.like().unwrap();
        assert_eq!(button.likes(), 11);
        assert!(button.is_pending());
        assert!(button.like().is_none());
        assert_eq!(button.likes(), 11);

        first.await.unwrap();
        assert!(!button.is_pending());
        assert!(button.like().is_some());
        assert_eq!(button.likes(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_like_rolls_back_its_own_increment() {
        let api = Arc::new(MockMutationApi::new());
        let button = LikeButton::new(3, Arc::clone(&api));
        api.enqueue(CallPlan::fail_after(100));

        button.like().unwrap().await.unwrap();
        assert_eq!(button.likes(), 3);
        assert!(!button.is_pending());
    }
}
