//! In-process mock of the tenant service for integration tests.
//!
//! Serves `/v1/tenants` from memory on a random port and records every
//! request so tests can assert on paths, headers and call counts.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::{OriginalUri, Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use console_core::observability::REQUEST_ID_HEADER;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tenant_console::services::Transport;
use tenant_console::{TenantClient, TenantQueries};
use tokio::net::TcpListener;

/// Tenant id for which the mock answers 200 with a body of the wrong shape.
pub const MALFORMED_ID: &str = "malformed";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path as sent on the wire, before percent-decoding.
    pub raw_path: String,
    pub accept: Option<String>,
    pub content_type: Option<String>,
    pub request_id: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct MockState {
    tenants: Mutex<Vec<Value>>,
    requests: Mutex<Vec<RecordedRequest>>,
    next_id: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub fail_updates: AtomicBool,
    pub list_delay_ms: AtomicU64,
}

impl MockState {
    fn record(&self, method: Method, uri: &OriginalUri, headers: &HeaderMap, body: &Bytes) {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        let body = if body.is_empty() {
            None
        } else {
            serde_json::from_slice(body).ok()
        };

        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            raw_path: uri.0.path().to_string(),
            accept: text(header::ACCEPT.as_str()),
            content_type: text(header::CONTENT_TYPE.as_str()),
            request_id: text(REQUEST_ID_HEADER),
            body,
        });
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tenants
            .lock()
            .unwrap()
            .iter()
            .position(|tenant| tenant["id"] == id)
    }
}

type SharedState = Arc<MockState>;

fn not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "code": 5,
            "message": format!("tenant {} not found", id),
            "details": []
        })),
    )
        .into_response()
}

async fn list_tenants(
    State(state): State<SharedState>,
    uri: OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record(Method::GET, &uri, &headers, &body);
    state.list_calls.fetch_add(1, Ordering::SeqCst);

    let delay = state.list_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let tenants = state.tenants.lock().unwrap().clone();
    Json(json!({ "tenants": tenants })).into_response()
}

async fn get_tenant(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    uri: OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record(Method::GET, &uri, &headers, &body);
    state.get_calls.fetch_add(1, Ordering::SeqCst);

    if id == MALFORMED_ID {
        return Json(json!({ "tenant": "not-an-object" })).into_response();
    }

    let tenants = state.tenants.lock().unwrap();
    match tenants.iter().find(|tenant| tenant["id"] == id.as_str()) {
        Some(tenant) => Json(json!({ "tenant": tenant })).into_response(),
        None => not_found(&id),
    }
}

async fn create_tenant(
    State(state): State<SharedState>,
    uri: OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record(Method::POST, &uri, &headers, &body);
    state.create_calls.fetch_add(1, Ordering::SeqCst);

    let request: Value = serde_json::from_slice(&body).unwrap_or_default();
    let id = format!("tenant-{}", state.next_id.fetch_add(1, Ordering::SeqCst) + 1);
    let tenant = json!({
        "id": id,
        "source": request.get("source").cloned().unwrap_or_else(|| json!({})),
        "application": { "health": { "status": "Progressing" } }
    });
    state.tenants.lock().unwrap().push(tenant.clone());

    Json(json!({ "tenant": tenant })).into_response()
}

async fn update_tenant(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    uri: OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record(Method::PUT, &uri, &headers, &body);
    state.update_calls.fetch_add(1, Ordering::SeqCst);

    if state.fail_updates.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "code": 13, "message": "update rejected" })),
        )
            .into_response();
    }

    let Some(index) = state.position(&id) else {
        return not_found(&id);
    };
    let request: Value = serde_json::from_slice(&body).unwrap_or_default();
    let mut tenants = state.tenants.lock().unwrap();
    tenants[index]["source"] = request.get("source").cloned().unwrap_or_else(|| json!({}));

    Json(json!({ "tenant": tenants[index].clone() })).into_response()
}

async fn delete_tenant(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    uri: OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record(Method::DELETE, &uri, &headers, &body);
    state.delete_calls.fetch_add(1, Ordering::SeqCst);

    let Some(index) = state.position(&id) else {
        return not_found(&id);
    };
    let deleted = state.tenants.lock().unwrap().remove(index);

    Json(json!({ "tenant": deleted })).into_response()
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/v1/tenants", get(list_tenants).post(create_tenant))
        .route(
            "/v1/tenants/:id",
            get(get_tenant).put(update_tenant).delete(delete_tenant),
        )
        .with_state(state)
}

/// A running mock service.
pub struct TestApp {
    pub address: String,
    pub state: SharedState,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener.local_addr().unwrap().port();
        let state = SharedState::default();

        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            address: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    pub fn base_path(&self) -> String {
        format!("{}/v1", self.address)
    }

    pub fn client(&self) -> TenantClient {
        let transport = Transport::new(&self.base_path(), Some(Duration::from_secs(5)))
            .expect("Failed to build transport");
        TenantClient::new(transport)
    }

    pub fn queries(&self) -> TenantQueries {
        TenantQueries::new(self.client())
    }

    /// Insert a tenant directly into the mock's store.
    pub fn seed(&self, tenant: Value) {
        self.state.tenants.lock().unwrap().push(tenant);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests()
            .pop()
            .expect("No request reached the mock service")
    }

    pub fn calls(&self, counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// A base path on which nothing is listening.
pub async fn unreachable_base_path() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/v1", port)
}
