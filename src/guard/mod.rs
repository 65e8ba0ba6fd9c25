//! Epoch-guarded async result lifecycle.
//!
//! Every logical fetch site owns one [`EpochCounter`]. Each new attempt
//! bumps the counter and captures a [`Ticket`]; a completion is allowed to
//! touch visible state only while its ticket is still current. Completion
//! order of the underlying operations is irrelevant — the epoch check alone
//! provides last-write-wins semantics.
//!
//! In-flight work superseded by a newer attempt is also aborted as a
//! courtesy, but correctness never depends on the abort landing.

mod epoch;
mod fetch;
mod status;

pub use epoch::{EpochCounter, Ticket};
pub use fetch::{GuardSnapshot, ResultGuard};
pub use status::FetchPhase;
