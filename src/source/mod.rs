//! Injectable data sources.
//!
//! Widgets never talk to a transport directly; they are generic over these
//! traits so tests control timing and failure, the demo binary injects
//! simulated backends, and the movie search can run against the real HTTP
//! API.

mod http;
mod mock;

pub use http::{HttpMovieSource, DEFAULT_SEARCH_BASE_URL};
pub use mock::{
    CallPlan, MockEntitySource, MockMovieSource, MockMutationApi, MockPagedSource,
    SimulationProfile,
};

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// A movie record accepted for display. Every field is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub imdb_id: String,
    pub title: String,
    pub year: String,
    pub poster: String,
}

/// A cached/fetched user entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Milliseconds since the epoch, as reported by the source.
    pub updated_at: u64,
}

/// One row of the paged directory search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub id: String,
    pub name: String,
}

/// One page of directory search results.
///
/// `page` is the effective page the source served: an out-of-range request
/// is clamped into `[1, total_pages]` and the clamped index echoed back, so
/// a caller holding a stale `total_pages` self-corrects on the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    pub items: Vec<DirectoryEntry>,
    pub page: u32,
    pub total_pages: u32,
}

/// Fetches a single user entity by id.
pub trait EntitySource: Send + Sync + 'static {
    fn fetch(&self, id: &str) -> impl Future<Output = Result<UserRecord, FetchError>> + Send;
}

/// Server-side filtered, paged directory search.
pub trait PagedSource: Send + Sync + 'static {
    fn search(
        &self,
        query: &str,
        page: u32,
    ) -> impl Future<Output = Result<PageResult, FetchError>> + Send;
}

/// Free-text movie search.
pub trait MovieSource: Send + Sync + 'static {
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<Movie>, FetchError>> + Send;
}

/// Confirms an optimistic mutation with the backend.
pub trait MutationApi: Send + Sync + 'static {
    fn confirm(&self) -> impl Future<Output = Result<(), FetchError>> + Send;
}
