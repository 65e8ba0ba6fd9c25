//! Server-side paginated search with a debounced query input.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::debounce::Debouncer;
use crate::guard::{GuardSnapshot, ResultGuard};
use crate::source::{PageResult, PagedSource};

/// Headless paged search.
///
/// Page navigation clamps against the last known `total_pages`; if a
/// stale total lets an out-of-range request through anyway, the source
/// clamps it and the widget adopts the effective page echoed back.
pub struct PagedSearch<S> {
    inner: Arc<Inner<S>>,
    debouncer: Debouncer<String>,
}

struct Inner<S> {
    source: Arc<S>,
    guard: ResultGuard<PageResult>,
    /// Committed query and the page most recently requested for it.
    request: Mutex<(String, u32)>,
}

impl<S: PagedSource> Inner<S> {
    fn issue(&self) {
        let (query, page) = self.request.lock().clone();
        let source = Arc::clone(&self.source);
        self.guard
            .load(async move { source.search(&query, page).await });
    }
}

impl<S: PagedSource> PagedSearch<S> {
    pub fn new(source: Arc<S>, debounce: Duration) -> Self {
        let inner = Arc::new(Inner {
            source,
            guard: ResultGuard::new(),
            request: Mutex::new((String::new(), 1)),
        });

        // A freshly committed query always restarts from page 1.
        let sink = Arc::clone(&inner);
        let debouncer = Debouncer::new(debounce, move |query| {
            *sink.request.lock() = (query, 1);
            sink.issue();
        });

        Self { inner, debouncer }
    }

    /// Feed raw input; the trimmed query commits after the debounce
    /// window and resets to page 1.
    pub fn set_input(&self, raw: &str) {
        self.debouncer.update(raw.trim().to_string());
    }

    /// Commit a query immediately, bypassing the debounce window.
    pub fn search_now(&self, query: &str) {
        *self.inner.request.lock() = (query.trim().to_string(), 1);
        self.inner.issue();
    }

    pub fn next_page(&self) {
        self.go_to(self.current_page().saturating_add(1));
    }

    pub fn prev_page(&self) {
        self.go_to(self.current_page().saturating_sub(1));
    }

    /// Request a specific page, clamped against the last known total.
    pub fn go_to(&self, page: u32) {
        let target = page.clamp(1, self.total_pages());
        {
            let mut request = self.inner.request.lock();
            if request.1 == target && self.inner.guard.snapshot().data.is_some() {
                return;
            }
            request.1 = target;
        }
        self.inner.issue();
    }

    /// Re-run the current request after an error.
    pub fn retry(&self) {
        self.inner.issue();
    }

    /// The effective page: what the source last served, or the pending
    /// request before anything settled.
    pub fn current_page(&self) -> u32 {
        self.inner
            .guard
            .snapshot()
            .data
            .map(|data| data.page)
            .unwrap_or_else(|| self.inner.request.lock().1)
    }

    pub fn total_pages(&self) -> u32 {
        self.inner
            .guard
            .snapshot()
            .data
            .map(|data| data.total_pages)
            .unwrap_or(1)
    }

    pub fn snapshot(&self) -> GuardSnapshot<PageResult> {
        self.inner.guard.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<GuardSnapshot<PageResult>> {
        self.inner.guard.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::FetchPhase;
    use crate::source::MockPagedSource;

    fn widget() -> PagedSearch<MockPagedSource> {
        PagedSearch::new(Arc::new(MockPagedSource::new()), Duration::from_millis(300))
    }

    #[tokio::test]
    async fn empty_query_pages_the_whole_directory() {
        let widget = widget();
        widget.search_now("");
        tokio::time::sleep(Duration::from_millis(20)).await;

        let page = widget.snapshot().data.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items[0].id, "i-01");
    }

    #[tokio::test]
    async fn second_page_holds_entries_six_through_ten() {
        let widget = widget();
        widget.search_now("");
        tokio::time::sleep(Duration::from_millis(20)).await;

        widget.next_page();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let page = widget.snapshot().data.unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.items[0].id, "i-06");
        assert_eq!(page.items[4].id, "i-10");
    }

    #[tokio::test]
    async fn navigation_clamps_to_known_range() {
        let widget = widget();
        widget.search_now("");
        tokio::time::sleep(Duration::from_millis(20)).await;

        widget.go_to(42);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(widget.current_page(), 3);

        widget.prev_page();
        tokio::time::sleep(Duration::from_millis(20)).await;
        widget.prev_page();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(widget.current_page(), 1);

        // Already at the first page; going back stays put.
        widget.prev_page();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(widget.current_page(), 1);
    }

    #[tokio::test]
    async fn filtered_query_shrinks_total_pages() {
        let widget = widget();
        widget.search_now("an");
        tokio::time::sleep(Duration::from_millis(20)).await;

        let page = widget.snapshot().data.unwrap();
        assert!(page.total_pages <= 2);
        assert_eq!(widget.snapshot().phase, FetchPhase::Idle);
    }
}
