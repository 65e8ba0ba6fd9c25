//! Optimistic local mutations with defined rollback.
//!
//! Three disciplines, matched to how the mutation composes:
//! - [`OptimisticItem`]: one value, one mutation at a time, undo window
//!   before the confirming call, epoch-guarded absolute rollback.
//! - [`OptimisticCounter`]: counter-like values with overlapping mutations;
//!   rollback is by the mutation's own delta so a failure cannot clobber a
//!   later, unrelated success.
//! - [`IdempotentGate`]: suppresses overlapping invocations outright while
//!   one confirmation is outstanding.

mod counter;
mod gate;
mod item;

pub use counter::{CounterSnapshot, OptimisticCounter};
pub use gate::IdempotentGate;
pub use item::{ItemSnapshot, MutationStatus, OptimisticItem};
