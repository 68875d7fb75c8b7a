//! Error types for the sync service.
//!
//! [`SyncError`] covers every way a sync run can abort and implements
//! [`axum::response::IntoResponse`] so the trigger handler can return
//! `Result<…, SyncError>` directly.  Failures of individual item
//! submissions never abort a run; they are reported in the
//! [`SyncReport`](crate::pipeline::SyncReport) instead.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use loopsync_sdk::SdkError;
use serde_json::json;

/// Errors that abort a sync run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// No bearer token could be obtained from the source API.
    #[error("no token available: {0}")]
    NoToken(#[source] SdkError),

    /// The library entries could not be fetched.
    #[error("failed to fetch library entries: {message}")]
    FetchFailed {
        /// Upstream status, when the source API answered at all.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },

    /// Anything else (e.g. the sync task panicked).
    #[error("unexpected fault: {0}")]
    Unexpected(String),
}

impl SyncError {
    /// Wrap a failed library-entries fetch, keeping the upstream status.
    pub fn fetch(err: &SdkError) -> Self {
        Self::FetchFailed {
            status: err.status(),
            message: err.to_string(),
        }
    }

    /// HTTP status reported to the trigger caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoToken(_) | Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::FetchFailed { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
        }
    }
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        tracing::error!(%status, error = %message, "sync failed");
        (
            status,
            Json(json!({ "status": status.as_u16(), "error": message })),
        )
            .into_response()
    }
}
