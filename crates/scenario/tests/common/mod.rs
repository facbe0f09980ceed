//! In-process stand-in for the chat service. Responses are scripted per
//! `"METHOD /path"`; anything unscripted gets `200 {}`. Every request is
//! recorded for later assertions.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::{Json, Router};
use chatload_registry::{GeneratorConfig, UserRegistry, UsernameGenerator};
use chatload_scenario::{BehaviorConfig, ConversationScope, SimContext};
use chatload_sdk::ChatClient;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub body: Value,
}

impl Recorded {
    pub fn key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Default)]
struct Script {
    /// Queued responses; the last one sticks once the queue drains to it.
    responses: HashMap<String, VecDeque<(StatusCode, Value)>>,
    recorded: Vec<Recorded>,
}

#[derive(Clone, Default)]
struct MockState {
    script: Arc<Mutex<Script>>,
}

pub struct MockChatService {
    address: String,
    state: MockState,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockChatService {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock listener");
        let addr = listener.local_addr().expect("listener addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            address: format!("http://{addr}"),
            state,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn url(&self) -> &str {
        &self.address
    }

    /// Queue a response for `key` (e.g. `"POST /auth/login"`).
    pub fn respond(&self, key: &str, status: u16, body: Value) -> &Self {
        self.state
            .script
            .lock()
            .responses
            .entry(key.to_string())
            .or_default()
            .push_back((StatusCode::from_u16(status).expect("valid status"), body));
        self
    }

    /// Standard happy-path auth: login succeeds with token `t1` and user id 1.
    pub fn accept_logins(&self) -> &Self {
        self.respond("POST /auth/login", 200, json!({"user": {"id": 1}, "token": "t1"}))
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.script.lock().recorded.clone()
    }

    pub fn requests_to(&self, key: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.key() == key)
            .collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.requests().iter().map(Recorded::key).collect()
    }

    pub fn context(&self, scope: ConversationScope, behavior: BehaviorConfig) -> SimContext {
        let client =
            ChatClient::new(self.url(), Duration::from_secs(5)).expect("client for mock");
        let generator = UsernameGenerator::new(&GeneratorConfig {
            seed: Some(42),
            multiplier: Some(7),
            ..GeneratorConfig::default()
        })
        .expect("generator");
        SimContext::new(
            client,
            Arc::new(UserRegistry::new()),
            Arc::new(generator),
            behavior,
            scope,
        )
    }
}

impl Drop for MockChatService {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let recorded = Recorded {
        method,
        path: uri.path().to_string(),
        query,
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    let key = recorded.key();

    let mut script = state.script.lock();
    script.recorded.push(recorded);
    let response = match script.responses.get_mut(&key) {
        Some(queue) if queue.len() > 1 => queue.pop_front(),
        Some(queue) => queue.front().cloned(),
        None => None,
    };
    let (status, body) = response.unwrap_or((StatusCode::OK, json!({})));
    (status, Json(body))
}
