//! Debounced movie search with persisted favorites.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::debounce::Debouncer;
use crate::guard::{GuardSnapshot, ResultGuard};
use crate::source::{Movie, MovieSource};
use crate::store::{self, KeyValueStore, StoreError};

/// Storage key owned exclusively by the movie search widget.
pub const FAVORITES_KEY: &str = "favorites";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovieTab {
    #[default]
    All,
    Favorites,
}

/// Headless movie search.
///
/// Raw input is debounced; committed queries shorter than the minimum
/// issue nothing and leave the displayed results at their last settled
/// value. Results flow through the epoch guard, so stale responses from
/// superseded queries never land.
pub struct MovieSearch<S> {
    inner: Arc<Inner<S>>,
    debouncer: Debouncer<String>,
}

struct Inner<S> {
    source: Arc<S>,
    guard: ResultGuard<Vec<Movie>>,
    favorites: watch::Sender<Vec<Movie>>,
    tab: watch::Sender<MovieTab>,
    min_query: usize,
}

impl<S: MovieSource> Inner<S> {
    fn issue(&self, query: String) {
        if query.chars().count() < self.min_query {
            debug!(%query, "query below minimum length, not searching");
            return;
        }
        let source = Arc::clone(&self.source);
        self.guard.load(async move { source.search(&query).await });
    }
}

impl<S: MovieSource> MovieSearch<S> {
    /// Hydrate favorites from the store, start the persistence observer,
    /// and arm the debouncer.
    pub fn new<K: KeyValueStore>(
        source: Arc<S>,
        store: Arc<K>,
        debounce: Duration,
        min_query: usize,
    ) -> Result<Self, StoreError> {
        let hydrated: Vec<Movie> =
            store::read_json_or_default(store.as_ref(), FAVORITES_KEY)?.unwrap_or_default();
        let (favorites, _) = watch::channel(hydrated);

        let mut rx = favorites.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let list = rx.borrow_and_update().clone();
                if let Err(error) = store::write_json(store.as_ref(), FAVORITES_KEY, &list) {
                    warn!(%error, "failed to persist favorites");
                }
            }
        });

        let (tab, _) = watch::channel(MovieTab::default());
        let inner = Arc::new(Inner {
            source,
            guard: ResultGuard::new(),
            favorites,
            tab,
            min_query,
        });

        let sink = Arc::clone(&inner);
        let debouncer = Debouncer::new(debounce, move |query| sink.issue(query));

        Ok(Self { inner, debouncer })
    }

    /// Feed a keystroke's worth of raw input; the trimmed value is
    /// committed once it survives the debounce window.
    pub fn set_input(&self, raw: &str) {
        self.debouncer.update(raw.trim().to_string());
    }

    /// Issue a query immediately, bypassing the debounce window.
    pub fn search_now(&self, query: &str) {
        self.inner.issue(query.trim().to_string());
    }

    /// Toggle a movie in the favorites list (newest first).
    pub fn toggle_favorite(&self, movie: &Movie) {
        self.inner.favorites.send_modify(|list| {
            match list.iter().position(|m| m.imdb_id == movie.imdb_id) {
                Some(index) => {
                    list.remove(index);
                }
                None => list.insert(0, movie.clone()),
            }
        });
    }

    pub fn is_favorite(&self, imdb_id: &str) -> bool {
        self.inner
            .favorites
            .borrow()
            .iter()
            .any(|m| m.imdb_id == imdb_id)
    }

    pub fn favorites(&self) -> Vec<Movie> {
        self.inner.favorites.borrow().clone()
    }

    pub fn set_tab(&self, tab: MovieTab) {
        self.inner.tab.send_modify(|current| *current = tab);
    }

    pub fn tab(&self) -> MovieTab {
        *self.inner.tab.borrow()
    }

    pub fn results(&self) -> GuardSnapshot<Vec<Movie>> {
        self.inner.guard.snapshot()
    }

    pub fn subscribe_results(&self) -> watch::Receiver<GuardSnapshot<Vec<Movie>>> {
        self.inner.guard.subscribe()
    }

    /// The list the active tab shows, derived at read time.
    pub fn visible(&self) -> Vec<Movie> {
        match self.tab() {
            MovieTab::All => self.results().data.unwrap_or_default(),
            MovieTab::Favorites => self.favorites(),
        }
    }
}
