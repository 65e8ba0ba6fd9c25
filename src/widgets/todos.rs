//! Reducer-driven todo list with local persistence.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::warn;
use uuid::Uuid;

use crate::store::{self, KeyValueStore, StoreError};
use crate::widgets::mvi::{Intent, Reducer, WidgetState};

/// Storage key owned exclusively by the todo board.
pub const TODOS_KEY: &str = "todos";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,
    /// Milliseconds since the epoch at creation time.
    pub created_at: u64,
}

/// The full list, newest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TodoList {
    pub todos: Vec<Todo>,
}

impl WidgetState for TodoList {}

/// Intents carry fully-formed data (ids and timestamps are minted by the
/// board before dispatch) so the reducer stays pure.
#[derive(Debug, Clone)]
pub enum TodoIntent {
    Added { todo: Todo },
    Toggled { id: String },
    Edited { id: String, title: String },
    Deleted { id: String },
}

impl Intent for TodoIntent {}

pub struct TodoReducer;

impl Reducer for TodoReducer {
    type State = TodoList;
    type Intent = TodoIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        let mut todos = state.todos;
        match intent {
            TodoIntent::Added { todo } => {
                todos.insert(0, todo);
            }
            TodoIntent::Toggled { id } => {
                for todo in &mut todos {
                    if todo.id == id {
                        todo.completed = !todo.completed;
                    }
                }
            }
            TodoIntent::Edited { id, title } => {
                for todo in &mut todos {
                    if todo.id == id {
                        todo.title = title.clone();
                    }
                }
            }
            TodoIntent::Deleted { id } => {
                todos.retain(|todo| todo.id != id);
            }
        }
        TodoList { todos }
    }
}

/// Filter tab. The visible list is derived at read time, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoTab {
    All,
    Active,
    Completed,
}

/// Headless todo widget: hydrates from the store once, persists every
/// committed change afterwards.
pub struct TodoBoard {
    state: watch::Sender<TodoList>,
}

impl TodoBoard {
    /// Hydrate from the `todos` key and start the persistence observer.
    ///
    /// A corrupt stored value hydrates as empty (with a warning); an
    /// unreadable store fails construction.
    pub fn load<K: KeyValueStore>(store: Arc<K>) -> Result<Self, StoreError> {
        let todos: Vec<Todo> =
            store::read_json_or_default(store.as_ref(), TODOS_KEY)?.unwrap_or_default();
        let (state, _) = watch::channel(TodoList { todos });

        let mut rx = state.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let todos = rx.borrow_and_update().todos.clone();
                if let Err(error) = store::write_json(store.as_ref(), TODOS_KEY, &todos) {
                    warn!(%error, "failed to persist todos");
                }
            }
        });

        Ok(Self { state })
    }

    pub fn dispatch(&self, intent: TodoIntent) {
        self.state
            .send_modify(|list| *list = TodoReducer::reduce(list.clone(), intent));
    }

    /// Create a todo from `title` (trimmed). Returns the new id, or `None`
    /// for a blank title.
    pub fn add(&self, title: &str) -> Option<String> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let todo = Todo {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            completed: false,
            created_at: now_millis(),
        };
        let id = todo.id.clone();
        self.dispatch(TodoIntent::Added { todo });
        Some(id)
    }

    pub fn toggle(&self, id: &str) {
        self.dispatch(TodoIntent::Toggled { id: id.to_string() });
    }

    pub fn delete(&self, id: &str) {
        self.dispatch(TodoIntent::Deleted { id: id.to_string() });
    }

    pub fn subscribe(&self) -> watch::Receiver<TodoList> {
        self.state.subscribe()
    }

    pub fn todos(&self) -> Vec<Todo> {
        self.state.borrow().todos.clone()
    }

    /// Tab view, derived from the list at read time.
    pub fn visible(&self, tab: TodoTab) -> Vec<Todo> {
        self.state
            .borrow()
            .todos
            .iter()
            .filter(|todo| match tab {
                TodoTab::All => true,
                TodoTab::Active => !todo.completed,
                TodoTab::Completed => todo.completed,
            })
            .cloned()
            .collect()
    }

    /// Start an edit session for `id`, copying the current title once.
    pub fn begin_edit(&self, id: &str) -> Option<EditSession> {
        self.state
            .borrow()
            .todos
            .iter()
            .find(|todo| todo.id == id)
            .map(|todo| EditSession {
                todo_id: todo.id.clone(),
                original: todo.title.clone(),
                draft: todo.title.clone(),
            })
    }
}

/// An in-progress title edit.
///
/// The draft is derived from the upstream title exactly once, at session
/// start; it is never re-synced while the session is open. Committing
/// applies a trimmed, non-empty, actually-changed title.
#[derive(Debug, Clone)]
pub struct EditSession {
    todo_id: String,
    original: String,
    draft: String,
}

impl EditSession {
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Apply the edit. Returns whether a change was dispatched.
    pub fn commit(self, board: &TodoBoard) -> bool {
        let trimmed = self.draft.trim();
        if trimmed.is_empty() || trimmed == self.original {
            return false;
        }
        board.dispatch(TodoIntent::Edited {
            id: self.todo_id,
            title: trimmed.to_string(),
        });
        true
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
