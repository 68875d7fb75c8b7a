//! HTTP surface of the sync service.
//!
//! * `GET <trigger path>` — run one sync (paths from `TRIGGER_PATHS`).
//! * `GET /health` — liveness probe.
//! * anything else — `404 {"status": 404, "error": "Resource not found"}`.
//!
//! Every response, the 404 included, carries permissive CORS headers and a
//! baseline set of security headers.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Json, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::routing::get;
use serde::Serialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::error::SyncError;
use crate::pipeline::{SyncPipeline, SyncReport};

/// State shared across all Axum handlers.
pub struct AppState {
    /// The pipeline run by every trigger.
    pub pipeline: SyncPipeline,
}

/// Response of a successful trigger.
#[derive(Serialize)]
struct TriggerResponse {
    status: u16,
    message: &'static str,
    #[serde(flatten)]
    report: SyncReport,
}

/// Security headers stamped onto every response.
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("content-security-policy", "default-src 'self'; frame-ancestors 'self'; object-src 'none'"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// Build the router, mounting the sync trigger on each of `trigger_paths`.
///
/// The paths must already be validated (see `AppConfig::from_lookup`);
/// axum panics on duplicate or malformed routes.
pub fn router(state: Arc<AppState>, trigger_paths: &[String]) -> Router {
    let mut router = Router::new().route("/health", get(health));
    for path in trigger_paths {
        router = router.route(path, get(trigger_sync));
    }
    let mut router = router.fallback(not_found).with_state(state);

    for (name, value) in SECURITY_HEADERS {
        router = router.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(*name),
            HeaderValue::from_static(*value),
        ));
    }
    router.layer(CorsLayer::permissive())
}

/// `GET <trigger path>` — run one sync.
///
/// The run happens on its own task so that a caller hanging up does not
/// cancel submissions already in flight.
async fn trigger_sync(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<TriggerResponse>), SyncError> {
    let task = tokio::spawn(async move { state.pipeline.run().await });
    let report = task
        .await
        .map_err(|e| SyncError::Unexpected(e.to_string()))??;

    Ok((
        StatusCode::CREATED,
        Json(TriggerResponse {
            status: StatusCode::CREATED.as_u16(),
            message: "Created",
            report,
        }),
    ))
}

async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "status": 404, "error": "Resource not found" })),
    )
}
