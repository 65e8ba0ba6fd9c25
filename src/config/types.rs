use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::source::DEFAULT_SEARCH_BASE_URL;

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Delays driving the debouncer and the undo grace window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Debounce window for raw input, in milliseconds (default: 300).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Grace delay before an optimistic mutation confirms, in
    /// milliseconds (default: 3000).
    #[serde(default = "default_undo_grace_ms")]
    pub undo_grace_ms: u64,
}

impl TimingConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn undo_grace(&self) -> Duration {
        Duration::from_millis(self.undo_grace_ms)
    }
}

/// Search behavior and the movie API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Queries shorter than this issue no request (default: 3).
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,
    /// Directory search page size (default: 5).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Base URL of the movie search API.
    #[serde(default = "default_search_base_url")]
    pub base_url: String,
}

/// Where the file store keeps its keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for persisted keys. Defaults to the platform data dir.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the effective storage directory.
    pub fn resolve_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("freshstate"),
        }
    }
}

/// Latency and failure behavior of the simulated backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_latency_min_ms")]
    pub latency_min_ms: u64,
    #[serde(default = "default_latency_max_ms")]
    pub latency_max_ms: u64,
    /// Probability in `[0, 1]` that a simulated call fails (default: 0.2).
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,
}

impl SimulationConfig {
    pub fn latency_min(&self) -> Duration {
        Duration::from_millis(self.latency_min_ms)
    }

    pub fn latency_max(&self) -> Duration {
        Duration::from_millis(self.latency_max_ms)
    }
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_undo_grace_ms() -> u64 {
    3000
}

fn default_min_query_chars() -> usize {
    3
}

fn default_page_size() -> u32 {
    5
}

fn default_search_base_url() -> String {
    DEFAULT_SEARCH_BASE_URL.to_string()
}

fn default_latency_min_ms() -> u64 {
    400
}

fn default_latency_max_ms() -> u64 {
    1600
}

fn default_failure_rate() -> f64 {
    0.2
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            undo_grace_ms: default_undo_grace_ms(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_chars: default_min_query_chars(),
            page_size: default_page_size(),
            base_url: default_search_base_url(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            latency_min_ms: default_latency_min_ms(),
            latency_max_ms: default_latency_max_ms(),
            failure_rate: default_failure_rate(),
        }
    }
}
