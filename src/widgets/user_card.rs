//! Stale-while-revalidate user card.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::guard::{FetchPhase, GuardSnapshot, ResultGuard};
use crate::source::{EntitySource, UserRecord};
use crate::store::{self, KeyValueStore};

fn cache_key(id: &str) -> String {
    format!("user:{id}")
}

/// Headless user card: shows a cached record immediately while a
/// background refresh revalidates it.
pub struct UserCard<S, K> {
    source: Arc<S>,
    store: Arc<K>,
    guard: ResultGuard<UserRecord>,
    current: Mutex<Option<String>>,
}

impl<S: EntitySource, K: KeyValueStore> UserCard<S, K> {
    /// The committed-record observer writes each freshly fetched record
    /// back to its per-entity cache key.
    pub fn new(source: Arc<S>, store: Arc<K>) -> Self {
        let guard = ResultGuard::new();

        let mut rx = guard.subscribe();
        let cache = Arc::clone(&store);
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot: GuardSnapshot<UserRecord> = rx.borrow_and_update().clone();
                if snapshot.phase != FetchPhase::Idle {
                    continue;
                }
                if let Some(user) = snapshot.data {
                    if let Err(error) = store::write_json(cache.as_ref(), &cache_key(&user.id), &user)
                    {
                        warn!(%error, id = %user.id, "failed to cache user record");
                    }
                }
            }
        });

        Self {
            source,
            store,
            guard,
            current: Mutex::new(None),
        }
    }

    /// Switch the card to `id`.
    ///
    /// A cache hit is displayed immediately under `Refreshing`; a miss
    /// clears the previous entity and shows `Loading`.
    pub fn show(&self, id: &str) -> JoinHandle<()> {
        *self.current.lock() = Some(id.to_string());

        let cached: Option<UserRecord> =
            store::read_json_or_default(self.store.as_ref(), &cache_key(id)).unwrap_or_else(
                |error| {
                    warn!(%error, id, "cache read failed, treating as miss");
                    None
                },
            );

        let source = Arc::clone(&self.source);
        let id = id.to_string();
        self.guard
            .load_seeded(cached, async move { source.fetch(&id).await })
    }

    /// Revalidate the current entity on demand. Also the retry path after
    /// an error. `None` if no entity was ever shown.
    pub fn refresh(&self) -> Option<JoinHandle<()>> {
        let id = self.current.lock().clone()?;
        let source = Arc::clone(&self.source);
        Some(self.guard.refresh(async move { source.fetch(&id).await }))
    }

    pub fn snapshot(&self) -> GuardSnapshot<UserRecord> {
        self.guard.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<GuardSnapshot<UserRecord>> {
        self.guard.subscribe()
    }
}
