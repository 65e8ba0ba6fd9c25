//! Headless demo widgets.
//!
//! Each widget is a state machine over injected sources and stores: it
//! exposes snapshots and `watch` subscriptions instead of rendering.
//! State transitions flow through the epoch guard, the debouncer, and the
//! optimistic primitives — the "view" is whoever observes the channel.

mod movies;
mod mvi;
mod optimistic_list;
mod pagination;
mod todos;
mod user_card;

pub use movies::{MovieSearch, MovieTab, FAVORITES_KEY};
pub use mvi::{Intent, Reducer, WidgetState};
pub use optimistic_list::{LikeButton, OptimisticList, TaskRow};
pub use pagination::PagedSearch;
pub use todos::{EditSession, Todo, TodoBoard, TodoIntent, TodoList, TodoReducer, TodoTab, TODOS_KEY};
pub use user_card::UserCard;
