//! SSE transport: session-multiplexed JSON-RPC over HTTP.
//!
//! `GET /sse` opens an event stream. The first frame is an `endpoint`
//! event carrying `/messages?sessionId=<id>`; JSON-RPC responses follow
//! as `message` events, with a `: ping` comment every 15 s for
//! keep-alive. `POST /messages?sessionId=<id>` accepts a JSON-RPC
//! request, dispatches it against the shared registry, and returns 202 -
//! the response is delivered asynchronously over the session's stream.
//!
//! Outbound channels are bounded; a send waits for channel capacity and
//! fails once the stream is dropped, which also removes the session
//! entry. Backpressure stalls the producer rather than dropping frames,
//! and ordering within a session is preserved.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{JsonRpcRequest, McpServer};

/// Outbound channel depth per session.
pub const CHANNEL_CAPACITY: usize = 32;

/// Keep-alive comment interval.
pub const PING_INTERVAL: Duration = Duration::from_secs(15);

/// Tracks all active SSE sessions and their outbound channels.
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, mpsc::Sender<String>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session; returns its token and the receiving end of
    /// its outbound channel.
    pub fn create(&self) -> (String, mpsc::Receiver<String>) {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(id.clone(), tx);
        }
        (id, rx)
    }

    /// The outbound sender for a session, if it is still open.
    pub fn sender(&self, id: &str) -> Option<mpsc::Sender<String>> {
        self.sessions.read().ok()?.get(id).cloned()
    }

    /// Drop a session's entry; the channel closes once the last clone of
    /// its sender is gone.
    pub fn remove(&self, id: &str) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(id);
        }
    }

    pub fn count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }
}

/// Removes the session entry when the event stream is dropped.
struct SessionGuard {
    id: String,
    manager: Arc<SessionManager>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        tracing::debug!(session = %self.id, "sse session closed");
        self.manager.remove(&self.id);
    }
}

/// Shared state for the SSE routes.
#[derive(Clone)]
pub struct SseState {
    pub server: Arc<McpServer>,
    pub sessions: Arc<SessionManager>,
}

/// Build the SSE transport router for an embedding HTTP host.
pub fn router(server: Arc<McpServer>) -> Router {
    router_with_sessions(server, Arc::new(SessionManager::new()))
}

/// Same as [`router`], with an externally owned session manager (used by
/// tests and hosts that want to observe session state).
pub fn router_with_sessions(server: Arc<McpServer>, sessions: Arc<SessionManager>) -> Router {
    Router::new()
        .route("/sse", get(sse_handler))
        .route("/messages", post(messages_handler))
        .with_state(SseState { server, sessions })
}

fn event_stream(
    endpoint: String,
    rx: mpsc::Receiver<String>,
    guard: SessionGuard,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let first =
        stream::once(async move { Ok(Event::default().event("endpoint").data(endpoint)) });
    let rest = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        rx.recv()
            .await
            .map(|msg| (Ok(Event::default().event("message").data(msg)), (rx, guard)))
    });
    first.chain(rest)
}

async fn sse_handler(State(state): State<SseState>) -> impl IntoResponse {
    let (id, rx) = state.sessions.create();
    tracing::debug!(session = %id, "sse session opened");
    let endpoint = format!("/messages?sessionId={}", id);
    let guard = SessionGuard {
        id,
        manager: Arc::clone(&state.sessions),
    };
    let sse = Sse::new(event_stream(endpoint, rx, guard))
        .keep_alive(KeepAlive::new().interval(PING_INTERVAL).text("ping"));
    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        sse,
    )
}

#[derive(Debug, Deserialize)]
struct MessagesQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

async fn messages_handler(
    State(state): State<SseState>,
    Query(query): Query<MessagesQuery>,
    body: String,
) -> Response {
    let Some(session_id) = query.session_id else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "sessionId required"})),
        )
            .into_response();
    };
    let Some(tx) = state.sessions.sender(&session_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "session not found"})),
        )
            .into_response();
    };
    let request: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(r) => r,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "invalid JSON-RPC request"})),
            )
                .into_response();
        }
    };
    // Dispatch against the shared read-only registry; the response writer
    // for this request is the session's outbound channel.
    if let Some(response) = state.server.handle_request(&request) {
        match serde_json::to_string(&response) {
            Ok(frame) => {
                if tx.send(frame).await.is_err() {
                    tracing::debug!(session = %session_id, "session closed before response delivery");
                }
            }
            Err(e) => tracing::error!(error = %e, "failed to encode response"),
        }
    }
    StatusCode::ACCEPTED.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_server() -> Arc<McpServer> {
        Arc::new(McpServer::new("test", "0.1.0"))
    }

    #[test]
    fn test_session_manager_lifecycle() {
        let mgr = SessionManager::new();
        assert_eq!(mgr.count(), 0);
        let (id, _rx) = mgr.create();
        assert_eq!(mgr.count(), 1);
        assert!(mgr.sender(&id).is_some());
        mgr.remove(&id);
        assert_eq!(mgr.count(), 0);
        assert!(mgr.sender(&id).is_none());
    }

    #[tokio::test]
    async fn test_send_fails_after_receiver_dropped() {
        let mgr = SessionManager::new();
        let (id, rx) = mgr.create();
        let tx = mgr.sender(&id).unwrap();
        drop(rx);
        mgr.remove(&id);
        assert!(tx.send("late".to_string()).await.is_err());
    }

    #[tokio::test]
    async fn test_messages_requires_session_id() {
        let app = router(test_server());
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/messages")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["error"], "sessionId required");
    }

    #[tokio::test]
    async fn test_messages_unknown_session() {
        let app = router(test_server());
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/messages?sessionId=nope")
                    .body(Body::from(r#"{"id":1,"method":"ping"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_messages_rejects_bad_json() {
        let sessions = Arc::new(SessionManager::new());
        let (id, _rx) = sessions.create();
        let app = router_with_sessions(test_server(), Arc::clone(&sessions));
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/messages?sessionId={}", id))
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_messages_dispatches_and_delivers_async() {
        let sessions = Arc::new(SessionManager::new());
        let (id, mut rx) = sessions.create();
        let app = router_with_sessions(test_server(), Arc::clone(&sessions));
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/messages?sessionId={}", id))
                    .body(Body::from(r#"{"jsonrpc":"2.0","id":9,"method":"ping"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let frame = rx.recv().await.unwrap();
        let response: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(response["id"], 9);
        assert_eq!(response["result"], json!({}));
    }

    #[tokio::test]
    async fn test_notification_delivers_nothing() {
        let sessions = Arc::new(SessionManager::new());
        let (id, mut rx) = sessions.create();
        let app = router_with_sessions(test_server(), Arc::clone(&sessions));
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/messages?sessionId={}", id))
                    .body(Body::from(
                        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sse_announces_endpoint() {
        let sessions = Arc::new(SessionManager::new());
        let app = router_with_sessions(test_server(), Arc::clone(&sessions));
        let resp = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/sse")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );
        assert_eq!(resp.headers().get(header::CACHE_CONTROL).unwrap(), "no-cache");
        assert_eq!(resp.headers().get("x-accel-buffering").unwrap(), "no");
        assert_eq!(sessions.count(), 1);

        // First frame is the endpoint announcement for this session.
        let mut body = resp.into_body().into_data_stream();
        let chunk = body.next().await.unwrap().unwrap();
        let text = String::from_utf8(chunk.to_vec()).unwrap();
        assert!(text.starts_with("event: endpoint\n"), "got: {}", text);
        assert!(text.contains("data: /messages?sessionId="), "got: {}", text);
    }
}
