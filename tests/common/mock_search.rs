//! Mock movie search server for HTTP source tests.
//!
//! Serves the `{"description": [...]}` wire shape with records keyed
//! `#IMDB_ID` / `#TITLE` / `#YEAR` / `#IMG_POSTER`, with per-response
//! status, delay, and body scripting.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// A scripted response for one incoming search request.
#[derive(Debug, Clone)]
pub struct PlannedResponse {
    pub status: u16,
    pub body: Value,
    pub delay_ms: u64,
}

impl PlannedResponse {
    /// A successful response carrying `records` in the wire envelope.
    pub fn ok(records: Vec<Value>) -> Self {
        Self {
            status: 200,
            body: json!({ "description": records }),
            delay_ms: 0,
        }
    }

    pub fn error(status: u16) -> Self {
        Self {
            status,
            body: json!({ "error": "simulated" }),
            delay_ms: 0,
        }
    }

    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }
}

/// A well-formed wire record.
pub fn record(id: &str, title: &str, year: &str, poster: &str) -> Value {
    json!({
        "#IMDB_ID": id,
        "#TITLE": title,
        "#YEAR": year,
        "#IMG_POSTER": poster,
        "#RANK": 1,
    })
}

#[derive(Clone)]
struct SearchState {
    queries: Arc<Mutex<Vec<String>>>,
    responses: Arc<Mutex<VecDeque<PlannedResponse>>>,
}

/// Mock search endpoint bound to an ephemeral local port.
pub struct MockSearchServer {
    pub addr: SocketAddr,
    state: SearchState,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl MockSearchServer {
    pub async fn start() -> Self {
        let state = SearchState {
            queries: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(VecDeque::new())),
        };

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

        let app = Router::new()
            .route("/search", get(handle_search))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock search server");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .ok();
        });

        // Wait for the server to be ready.
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr,
            state,
            shutdown: shutdown_tx,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Queue a response for the next request, oldest first.
    pub async fn enqueue(&self, response: PlannedResponse) {
        self.state.responses.lock().await.push_back(response);
    }

    /// Every `q` parameter received, in arrival order.
    pub async fn received_queries(&self) -> Vec<String> {
        self.state.queries.lock().await.clone()
    }
}

impl Drop for MockSearchServer {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn handle_search(
    State(state): State<SearchState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let query = params.get("q").cloned().unwrap_or_default();
    state.queries.lock().await.push(query);

    let planned = state
        .responses
        .lock()
        .await
        .pop_front()
        .unwrap_or_else(|| PlannedResponse::ok(Vec::new()));

    if planned.delay_ms > 0 {
        tokio::time::sleep(tokio::time::Duration::from_millis(planned.delay_ms)).await;
    }

    (
        StatusCode::from_u16(planned.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(planned.body),
    )
}
