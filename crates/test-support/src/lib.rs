//! In-process mock of the NetSapiens `ns-api/v2` REST API for tests.
//!
//! Routes are registered by HTTP method and path (relative to `/ns-api/v2`). Every request is
//! recorded, including unmatched ones, so tests can assert exactly what went over the wire (or
//! that nothing did). Unregistered routes answer `404` with a small JSON body.

use anyhow::Context as _;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

const API_PREFIX: &str = "/ns-api/v2";

/// Canned response for one route.
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: u16,
    body: Option<Value>,
}

impl MockResponse {
    /// `200 OK` with a JSON body.
    #[must_use]
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    /// Arbitrary status with a JSON body.
    #[must_use]
    pub fn status(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    /// `status` with an empty body.
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self { status, body: None }
    }
}

/// One request as seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path relative to `/ns-api/v2`, still percent-encoded.
    pub path: String,
    pub query: Option<String>,
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
}

impl RecordedRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Decoded query pairs in order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let query = self.query.as_deref().unwrap_or_default();
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

#[derive(Default)]
struct MockState {
    routes: Mutex<HashMap<(String, String), MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Running mock server. Shuts down when dropped.
pub struct MockNsApi {
    api_url: String,
    state: Arc<MockState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockNsApi {
    /// Bind an ephemeral localhost port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/{*path}", any(handle))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind mock listener")?;
        let addr = listener.local_addr().context("mock local_addr")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        tokio::spawn(async move {
            let _ = server.await;
        });

        Ok(Self {
            api_url: format!("http://{addr}"),
            state,
            shutdown: Some(shutdown_tx),
        })
    }

    /// Root URL to configure the gateway with (without `/ns-api/v2`).
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Register a response for `method` + `path` (path relative to `/ns-api/v2`).
    pub fn on(&self, method: &str, path: &str, response: MockResponse) -> &Self {
        self.state
            .routes
            .lock()
            .insert((method.to_ascii_uppercase(), path.to_string()), response);
        self
    }

    pub fn on_get(&self, path: &str, response: MockResponse) -> &Self {
        self.on("GET", path, response)
    }

    pub fn on_post(&self, path: &str, response: MockResponse) -> &Self {
        self.on("POST", path, response)
    }

    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.requests.lock().len()
    }

    /// The single recorded request; panics if there were zero or several.
    #[must_use]
    pub fn only_request(&self) -> RecordedRequest {
        let requests = self.requests();
        assert_eq!(
            requests.len(),
            1,
            "expected exactly one request, got {requests:?}"
        );
        requests[0].clone()
    }
}

impl Drop for MockNsApi {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let path = uri
        .path()
        .strip_prefix(API_PREFIX)
        .unwrap_or(uri.path())
        .to_string();
    let headers = headers
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();

    state.requests.lock().push(RecordedRequest {
        method: method.as_str().to_string(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        headers,
    });

    let route = state
        .routes
        .lock()
        .get(&(method.as_str().to_string(), path.clone()))
        .cloned();

    let Some(route) = route else {
        return (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "code": 404, "message": format!("no mock for {method} {path}") })),
        )
            .into_response();
    };

    let status = StatusCode::from_u16(route.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match route.body {
        Some(body) => (status, axum::Json(body)).into_response(),
        None => status.into_response(),
    }
}
