//! Simulated backends.
//!
//! Stand-ins for a real API with controllable timing and failure. Tests
//! enqueue explicit [`CallPlan`]s; the demo binary installs a seeded
//! [`SimulationProfile`] that rolls latency and failure per call.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use tokio::time::sleep;
use tracing::debug;

use crate::error::FetchError;
use crate::source::{
    DirectoryEntry, EntitySource, MovieSource, MutationApi, Movie, PageResult, PagedSource,
    UserRecord,
};

/// Scripted behavior for one mock call.
#[derive(Debug, Clone, Copy)]
pub struct CallPlan {
    pub latency: Duration,
    pub fail: bool,
}

impl CallPlan {
    /// Succeed immediately.
    pub fn instant() -> Self {
        Self {
            latency: Duration::ZERO,
            fail: false,
        }
    }

    /// Succeed after `ms` of simulated latency.
    pub fn ok_after(ms: u64) -> Self {
        Self {
            latency: Duration::from_millis(ms),
            fail: false,
        }
    }

    /// Fail after `ms` of simulated latency.
    pub fn fail_after(ms: u64) -> Self {
        Self {
            latency: Duration::from_millis(ms),
            fail: true,
        }
    }
}

/// Random latency/failure generator for unscripted calls.
#[derive(Debug)]
pub struct SimulationProfile {
    latency_min: Duration,
    latency_max: Duration,
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl SimulationProfile {
    pub fn new(latency_min: Duration, latency_max: Duration, failure_rate: f64, seed: u64) -> Self {
        Self {
            latency_min,
            latency_max,
            failure_rate,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn roll(&self) -> CallPlan {
        let mut rng = self.rng.lock();
        let min = self.latency_min.as_millis() as u64;
        let max = (self.latency_max.as_millis() as u64).max(min);
        let latency = Duration::from_millis(rng.random_range(min..=max));
        let fail = rng.random::<f64>() < self.failure_rate;
        CallPlan { latency, fail }
    }
}

/// Script queue plus optional random fallback, shared by every mock.
#[derive(Debug, Default)]
struct Behavior {
    script: Mutex<VecDeque<CallPlan>>,
    profile: Option<SimulationProfile>,
}

impl Behavior {
    fn next_plan(&self) -> CallPlan {
        if let Some(plan) = self.script.lock().pop_front() {
            return plan;
        }
        match &self.profile {
            Some(profile) => profile.roll(),
            None => CallPlan::instant(),
        }
    }

    async fn run(&self, what: &str) -> Result<(), FetchError> {
        let plan = self.next_plan();
        if !plan.latency.is_zero() {
            sleep(plan.latency).await;
        }
        if plan.fail {
            debug!(call = what, "simulated failure");
            return Err(FetchError::network("simulated failure"));
        }
        Ok(())
    }
}

/// In-memory user table with simulated latency and failures.
#[derive(Debug)]
pub struct MockEntitySource {
    users: Vec<UserRecord>,
    behavior: Behavior,
}

impl Default for MockEntitySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEntitySource {
    /// The default three-user table.
    pub fn new() -> Self {
        Self::with_users(default_users())
    }

    pub fn with_users(users: Vec<UserRecord>) -> Self {
        Self {
            users,
            behavior: Behavior::default(),
        }
    }

    pub fn with_profile(mut self, profile: SimulationProfile) -> Self {
        self.behavior.profile = Some(profile);
        self
    }

    /// Queue explicit behavior for the next call(s), oldest first.
    pub fn enqueue(&self, plan: CallPlan) {
        self.behavior.script.lock().push_back(plan);
    }
}

impl EntitySource for MockEntitySource {
    async fn fetch(&self, id: &str) -> Result<UserRecord, FetchError> {
        self.behavior.run("fetch_entity").await?;
        self.users
            .iter()
            .find(|user| user.id == id)
            .cloned()
            .ok_or(FetchError::NotFound)
    }
}

/// In-memory directory with server-side filtering and paging.
#[derive(Debug)]
pub struct MockPagedSource {
    entries: Vec<DirectoryEntry>,
    page_size: u32,
    behavior: Behavior,
}

impl Default for MockPagedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPagedSource {
    /// The default fifteen-name directory, page size 5.
    pub fn new() -> Self {
        Self::with_page_size(5)
    }

    /// The default directory with an explicit page size.
    pub fn with_page_size(page_size: u32) -> Self {
        Self::with_entries(default_directory(), page_size)
    }

    pub fn with_entries(entries: Vec<DirectoryEntry>, page_size: u32) -> Self {
        Self {
            entries,
            page_size: page_size.max(1),
            behavior: Behavior::default(),
        }
    }

    pub fn with_profile(mut self, profile: SimulationProfile) -> Self {
        self.behavior.profile = Some(profile);
        self
    }

    pub fn enqueue(&self, plan: CallPlan) {
        self.behavior.script.lock().push_back(plan);
    }
}

impl PagedSource for MockPagedSource {
    async fn search(&self, query: &str, page: u32) -> Result<PageResult, FetchError> {
        self.behavior.run("search_paged").await?;

        let needle = query.to_lowercase();
        let filtered: Vec<&DirectoryEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.name.to_lowercase().contains(&needle))
            .collect();

        let total_pages = ((filtered.len() as u32).div_ceil(self.page_size)).max(1);
        // Requests beyond the valid range are clamped, and the effective
        // page is echoed back so callers holding stale totals resync.
        let page = page.clamp(1, total_pages);
        let start = ((page - 1) * self.page_size) as usize;
        let items = filtered
            .into_iter()
            .skip(start)
            .take(self.page_size as usize)
            .cloned()
            .collect();

        Ok(PageResult {
            items,
            page,
            total_pages,
        })
    }
}

/// Mutation confirmation endpoint that only ever succeeds or fails.
#[derive(Debug, Default)]
pub struct MockMutationApi {
    behavior: Behavior,
}

impl MockMutationApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: SimulationProfile) -> Self {
        self.behavior.profile = Some(profile);
        self
    }

    pub fn enqueue(&self, plan: CallPlan) {
        self.behavior.script.lock().push_back(plan);
    }
}

impl MutationApi for MockMutationApi {
    async fn confirm(&self) -> Result<(), FetchError> {
        self.behavior.run("confirm_mutation").await
    }
}

fn default_users() -> Vec<UserRecord> {
    vec![
        UserRecord {
            id: "01".into(),
            name: "Stephan".into(),
            email: "stephc93@mail.com".into(),
            updated_at: 1_766_306_575_718,
        },
        UserRecord {
            id: "02".into(),
            name: "Mohiko".into(),
            email: "mohi-san@mail.com".into(),
            updated_at: 1_766_302_272_513,
        },
        UserRecord {
            id: "03".into(),
            name: "Boris".into(),
            email: "bojohn87@mail.com".into(),
            updated_at: 1_766_306_523_590,
        },
    ]
}

fn default_directory() -> Vec<DirectoryEntry> {
    [
        ("i-01", "Michael Anderson"),
        ("i-02", "Sophia Ramirez"),
        ("i-03", "Daniel Thompson"),
        ("i-04", "Olivia Chen"),
        ("i-05", "Robert Williams"),
        ("i-06", "Isabella Martinez"),
        ("i-07", "James O'Connor"),
        ("i-08", "Emily Johnson"),
        ("i-09", "Carlos Mendoza"),
        ("i-10", "Hannah Brooks"),
        ("i-11", "David Kim"),
        ("i-12", "Natalie Foster"),
        ("i-13", "Anthony Russo"),
        ("i-14", "Aisha Patel"),
        ("i-15", "Benjamin Clarke"),
    ]
    .into_iter()
    .map(|(id, name)| DirectoryEntry {
        id: id.into(),
        name: name.into(),
    })
    .collect()
}

/// In-memory movie catalogue for the demo binary (the real search goes
/// through [`crate::source::HttpMovieSource`]).
#[derive(Debug)]
pub struct MockMovieSource {
    movies: Vec<Movie>,
    behavior: Behavior,
}

impl MockMovieSource {
    pub fn with_movies(movies: Vec<Movie>) -> Self {
        Self {
            movies,
            behavior: Behavior::default(),
        }
    }

    pub fn with_profile(mut self, profile: SimulationProfile) -> Self {
        self.behavior.profile = Some(profile);
        self
    }

    pub fn enqueue(&self, plan: CallPlan) {
        self.behavior.script.lock().push_back(plan);
    }
}

impl MovieSource for MockMovieSource {
    async fn search(&self, query: &str) -> Result<Vec<Movie>, FetchError> {
        self.behavior.run("search_movies").await?;
        let needle = query.to_lowercase();
        Ok(self
            .movies
            .iter()
            .filter(|movie| movie.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}
