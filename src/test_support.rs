//! In-process stand-in for the Telegram Bot API.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    Json, Router,
};
use serde_json::{json, Value};

use crate::config::env_from;

pub const TEST_TOKEN: &str = "123:test-token";
pub const TEST_CHAT_ID: &str = "-1001";

/// How long a [`Reply::Hang`] holds the request before answering.
pub const HANG_DURATION: Duration = Duration::from_secs(5);

/// How the mock answers one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok,
    ApiError(&'static str),
    Status(u16),
    /// Answer `ok` only after [`HANG_DURATION`].
    Hang,
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub content_type: String,
    pub body: Bytes,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

struct MockState {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<Recorded>>,
}

pub struct MockBotApi {
    pub url: String,
    state: Arc<MockState>,
}

impl MockBotApi {
    /// Replies are used in order; the last one repeats.
    pub async fn spawn(replies: Vec<Reply>) -> Self {
        let state = Arc::new(MockState {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}"),
            state,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Environment with credentials pointing at this mock, plus `extra`.
    pub fn env(&self, extra: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let mut pairs = vec![
            ("TELEGRAM_TOKEN", TEST_TOKEN),
            ("TELEGRAM_CHAT_ID", TEST_CHAT_ID),
            ("TELEGRAM_API_URL", self.url.as_str()),
        ];
        pairs.extend_from_slice(extra);
        env_from(&pairs)
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.requests.lock().unwrap().push(Recorded {
        path: uri.path().to_string(),
        content_type,
        body,
    });

    let reply = {
        let mut replies = state.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        }
    };

    match reply.unwrap_or(Reply::Ok) {
        Reply::Ok => (
            StatusCode::OK,
            Json(json!({ "ok": true, "result": { "message_id": 1 } })),
        ),
        Reply::ApiError(description) => (
            StatusCode::OK,
            Json(json!({ "ok": false, "error_code": 400, "description": description })),
        ),
        Reply::Hang => {
            tokio::time::sleep(HANG_DURATION).await;
            (
                StatusCode::OK,
                Json(json!({ "ok": true, "result": { "message_id": 1 } })),
            )
        }
        Reply::Status(code) => (
            StatusCode::from_u16(code).unwrap(),
            Json(json!({ "ok": false, "error_code": code, "description": "mock failure" })),
        ),
    }
}

/// A base URL nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// HTTP client that ignores proxy settings from the test environment.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
