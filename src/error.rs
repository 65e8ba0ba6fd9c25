//! Failure taxonomy for asynchronous operations.
//!
//! Stale responses are not an error value: staleness is detected by the
//! epoch check in [`crate::guard`] and the response is dropped before it
//! can reach any observable state. `Cancelled` gets the same treatment.

use thiserror::Error;

/// Errors produced by entity, search, and mutation sources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The underlying transport failed (rejected request, bad status, ...).
    #[error("network failure: {message}")]
    Network { message: String },

    /// The requested entity does not exist in the source data.
    #[error("not found")]
    NotFound,

    /// The operation was deliberately cancelled. Never surfaced to state.
    #[error("cancelled")]
    Cancelled,
}

impl FetchError {
    /// Shorthand for a network failure with a message.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Cancellations are swallowed at the guard boundary instead of
    /// transitioning state to `Error`.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
