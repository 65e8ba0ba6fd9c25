//! State/Intent/Reducer primitives for widgets with discrete actions.
//!
//! Unidirectional data flow: an intent describes what happened, the
//! reducer is the only place a new state is computed, observers render
//! whatever state comes out.

/// Marker trait for widget state objects.
///
/// States are immutable snapshots: cloned to create successors, compared
/// to detect changes.
pub trait WidgetState: Clone + PartialEq + Default + Send + 'static {}

/// Marker trait for intents (user actions or system events).
pub trait Intent: Send + 'static {}

/// Pure state transition: `(State, Intent) -> State`, no side effects.
pub trait Reducer {
    type State: WidgetState;
    type Intent: Intent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State;
}
