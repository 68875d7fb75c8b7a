//! Mock Loopio + OCM upstream for local runs of the sync service.
//!
//! Serves, on one port:
//!
//! * `POST /oauth2/access_token` — client-credentials token endpoint.
//! * `GET  /data/v2/libraryEntries` — a fixed page of library entries.
//! * `POST /pxysvc/proxy/oce-apps/items` — accepts and records items.
//! * `GET  /pxysvc/proxy/oce-apps/items` — lists what was recorded.
//!
//! Point the service at it with `LOOPIO_HOSTNAME=http://localhost:4100`,
//! `OCM_HOSTNAME=http://localhost:4100`, `LOOPIO_CLIENT_ID=mock-client`
//! and `LOOPIO_CLIENT_SECRET=mock-secret`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{Form, Json, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

struct MockState {
    client_id: String,
    client_secret: String,
    issued_tokens: Mutex<HashSet<String>>,
    items: Mutex<Vec<Value>>,
}

impl MockState {
    fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            issued_tokens: Mutex::new(HashSet::new()),
            items: Mutex::new(Vec::new()),
        }
    }
}

// A poisoned lock only means another handler panicked; the data is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn app(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/oauth2/access_token", post(token))
        .route("/data/v2/libraryEntries", get(library_entries))
        .route("/pxysvc/proxy/oce-apps/items", post(create_item).get(list_items))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port = std::env::var("MOCK_PORT").unwrap_or_else(|_| "4100".to_string());
    let client_id = std::env::var("MOCK_CLIENT_ID").unwrap_or_else(|_| "mock-client".to_string());
    let client_secret =
        std::env::var("MOCK_CLIENT_SECRET").unwrap_or_else(|_| "mock-secret".to_string());

    let state = Arc::new(MockState::new(&client_id, &client_secret));

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");
    info!(address = %addr, %client_id, "mock upstream listening");
    axum::serve(listener, app(state)).await.expect("server error");
}

// --- Loopio ---

#[derive(Deserialize)]
struct TokenRequest {
    grant_type: String,
    client_id: String,
    client_secret: String,
    scope: Option<String>,
}

async fn token(State(state): State<Arc<MockState>>, Form(req): Form<TokenRequest>) -> Response {
    if req.grant_type != "client_credentials" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unsupported_grant_type" })),
        )
            .into_response();
    }
    if req.client_id != state.client_id || req.client_secret != state.client_secret {
        warn!(client_id = %req.client_id, "rejected client credentials");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid_client" })),
        )
            .into_response();
    }

    let access_token = format!("mock_{}", Uuid::new_v4().simple());
    lock(&state.issued_tokens).insert(access_token.clone());
    info!(scope = ?req.scope, "token issued");

    Json(json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 3600,
        "scope": req.scope.unwrap_or_default(),
    }))
    .into_response()
}

#[derive(Deserialize)]
struct EntriesQuery {
    #[serde(rename = "pageSize")]
    page_size: Option<usize>,
    filter: Option<String>,
}

async fn library_entries(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<EntriesQuery>,
) -> Response {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| lock(&state.issued_tokens).contains(token));
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid_token" })),
        )
            .into_response();
    }

    let items: Vec<Value> = fixture_entries()
        .into_iter()
        .take(query.page_size.unwrap_or(100))
        .collect();
    info!(filter = ?query.filter, returned = items.len(), "library entries served");

    Json(json!({ "items": items, "totalItems": items.len() })).into_response()
}

fn fixture_entries() -> Vec<Value> {
    vec![
        json!({
            "id": 1001,
            "language": "en",
            "tags": ["PullYes", "Security"],
            "questions": [{ "text": "Do you support single sign-on?" }],
            "answer": { "text": "Yes, via SAML 2.0 and OIDC." },
            "lastUpdatedDate": "2023-03-14T09:00:00Z",
        }),
        json!({
            "id": 1002,
            "language": "en",
            "tags": ["PullYes"],
            "questions": [{ "text": "Where is customer data hosted?" }],
            "answer": { "text": "In-region data centres." },
            "lastUpdatedDate": "2023-06-01T12:30:00Z",
        }),
        json!({
            "id": 1003,
            "language": "en",
            "tags": ["PullYes", "Compliance"],
            "questions": [{ "text": "Are you SOC 2 certified?" }],
            "answer": { "text": "Yes, SOC 2 Type II." },
            "lastUpdatedDate": "2024-01-09T16:45:00Z",
        }),
    ]
}

// --- OCM ---

async fn create_item(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(mut item): Json<Value>,
) -> Response {
    if headers.get("x-requested-with").is_none() {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "proxy requires X-Requested-With" })),
        )
            .into_response();
    }

    let id = format!("CORE{}", Uuid::new_v4().simple().to_string().to_uppercase());
    if let Value::Object(fields) = &mut item {
        fields.insert("id".to_string(), json!(id));
        fields.insert("createdDate".to_string(), json!(Utc::now().to_rfc3339()));
    }
    info!(%id, name = %item["name"], "item created");
    lock(&state.items).push(item.clone());

    (StatusCode::CREATED, Json(item)).into_response()
}

async fn list_items(State(state): State<Arc<MockState>>) -> Json<Value> {
    let items = lock(&state.items).clone();
    Json(json!({ "count": items.len(), "items": items }))
}
