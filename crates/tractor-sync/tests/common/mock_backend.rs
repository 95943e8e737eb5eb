//! In-process backend for coordinator tests.
//!
//! Serves the REST endpoints and `/ws` on one port:
//! - Bootstrap payloads are fixed at construction, with an optional delay
//! - Control posts are recorded in arrival order
//! - Stream frames are pushed by the test to every open socket

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// Pushed through [`MockBackend::push`] to make the server close every socket.
const CLOSE_MARKER: &str = "__close__";

#[derive(Clone, Default)]
pub struct BackendScript {
    /// `/api/data/current` body; `None` answers 404.
    pub current: Option<Value>,
    /// `/api/data/historical` samples; `None` answers 500.
    pub history: Option<Vec<Value>>,
    /// Delay before answering either bootstrap endpoint.
    pub bootstrap_delay: Duration,
}

#[derive(Clone)]
pub struct MockBackend {
    addr: std::net::SocketAddr,
    shared: Shared,
}

#[derive(Clone)]
struct Shared {
    script: BackendScript,
    controls: Arc<Mutex<Vec<Value>>>,
    history_limits: Arc<Mutex<Vec<String>>>,
    frames: broadcast::Sender<String>,
    ws_connections: Arc<AtomicU32>,
}

impl MockBackend {
    pub async fn start(script: BackendScript) -> Self {
        let (frames, _) = broadcast::channel(256);
        let shared = Shared {
            script,
            controls: Arc::default(),
            history_limits: Arc::default(),
            frames,
            ws_connections: Arc::default(),
        };

        let router = Router::new()
            .route("/api/data/current", get(current))
            .route("/api/data/historical", get(historical))
            .route("/api/control", post(control))
            .route("/ws", get(ws_upgrade))
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, shared }
    }

    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Send a text frame to every open socket.
    pub fn push(&self, frame: String) {
        let _ = self.shared.frames.send(frame);
    }

    /// Close every open socket from the server side.
    pub fn close_streams(&self) {
        self.push(CLOSE_MARKER.to_string());
    }

    pub fn controls(&self) -> Vec<Value> {
        self.shared.controls.lock().unwrap().clone()
    }

    pub fn history_limits(&self) -> Vec<String> {
        self.shared.history_limits.lock().unwrap().clone()
    }

    pub fn ws_connections(&self) -> u32 {
        self.shared.ws_connections.load(Ordering::SeqCst)
    }
}

pub fn sample(velocity: f64) -> Value {
    json!({
        "velocity": velocity,
        "rpm": 1800,
        "gear": 3.0,
        "timestamp": "2025-03-01T10:00:00.000000"
    })
}

pub fn data_update(velocity: f64, control: Option<Value>) -> String {
    let mut frame = json!({
        "type": "data_update",
        "data": sample(velocity),
        "mqtt_connected": true
    });
    if let Some(control) = control {
        frame["control"] = control;
    }
    frame.to_string()
}

async fn current(State(shared): State<Shared>) -> Response {
    tokio::time::sleep(shared.script.bootstrap_delay).await;
    match shared.script.current {
        Some(body) => Json(body).into_response(),
        None => (StatusCode::NOT_FOUND, r#"{"detail":"No data available"}"#).into_response(),
    }
}

async fn historical(
    State(shared): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(limit) = params.get("limit") {
        shared.history_limits.lock().unwrap().push(limit.clone());
    }
    tokio::time::sleep(shared.script.bootstrap_delay).await;
    match shared.script.history {
        Some(data) => {
            let total = data.len();
            Json(json!({"data": data, "total_points": total})).into_response()
        }
        None => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
    }
}

async fn control(State(shared): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    shared.controls.lock().unwrap().push(body.clone());
    Json(json!({"status": "success", "command": body}))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(shared): State<Shared>) -> Response {
    // Subscribe before the handshake completes so no pushed frame is missed
    let frames = shared.frames.subscribe();
    ws.on_upgrade(move |socket| serve_socket(socket, frames, shared))
}

async fn serve_socket(mut socket: WebSocket, mut frames: broadcast::Receiver<String>, shared: Shared) {
    shared.ws_connections.fetch_add(1, Ordering::SeqCst);

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(text) if text == CLOSE_MARKER => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                Ok(text) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}
