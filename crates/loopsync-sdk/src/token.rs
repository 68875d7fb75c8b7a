//! OAuth2 client-credentials token provider for the Loopio API.
//!
//! [`TokenProvider::get_token`] returns the cached bearer token while it is
//! still valid and otherwise exchanges the client credentials for a new
//! one.  The cache lives behind an async mutex that is held across the
//! refresh, so concurrent callers that find the token expired wait for a
//! single exchange instead of issuing one each.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::credentials::Credential;
use crate::error::SdkError;

/// Loopio tokens are valid for one hour.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Read-only access to the library.
pub const DEFAULT_SCOPE: &str = "library:read";

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of the current time, injectable for tests.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Client-credentials parameters for the token endpoint.
#[derive(Clone)]
pub struct OAuthConfig {
    /// Full URL of the token endpoint.
    pub token_url: String,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Requested scope.
    pub scope: String,
    /// Fixed token lifetime; the response's `expires_in` is not consulted.
    pub token_lifetime: Duration,
}

impl OAuthConfig {
    /// Build a configuration with the default scope and lifetime.
    pub fn new(token_url: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            token_url: token_url.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            token_lifetime: Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
        }
    }
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .field("token_lifetime", &self.token_lifetime)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TokenProvider
// ---------------------------------------------------------------------------

/// Obtains and caches the Loopio bearer credential.
pub struct TokenProvider {
    http: reqwest::Client,
    config: OAuthConfig,
    clock: Arc<dyn Clock>,
    cache: Mutex<Option<Credential>>,
}

impl TokenProvider {
    /// Create a provider driven by the system clock.
    pub fn new(http: reqwest::Client, config: OAuthConfig) -> Self {
        Self::with_clock(http, config, Arc::new(SystemClock))
    }

    /// Create a provider with a custom clock.
    pub fn with_clock(http: reqwest::Client, config: OAuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            http,
            config,
            clock,
            cache: Mutex::new(None),
        }
    }

    /// Return a currently valid bearer token.
    ///
    /// Issues no network call while the cached credential is valid.  On
    /// failure the cache is left untouched and nothing is retried.
    pub async fn get_token(&self) -> Result<String, SdkError> {
        let mut cache = self.cache.lock().await;

        if let Some(credential) = cache.as_ref() {
            if credential.is_valid_at(self.clock.now()) {
                debug!(expires_at = %credential.expires_at(), "reusing cached token");
                return Ok(credential.value().to_string());
            }
            debug!(expired_at = %credential.expires_at(), "cached token expired");
        }

        let value = self.request_token().await?;
        let credential = Credential::new(value, self.clock.now(), self.config.token_lifetime);
        info!(expires_at = %credential.expires_at(), "source API token acquired");

        let token = credential.value().to_string();
        *cache = Some(credential);
        Ok(token)
    }

    /// Drop the cached credential so the next call re-authenticates.
    pub async fn invalidate(&self) {
        self.cache.lock().await.take();
    }

    /// The currently cached credential, if any (valid or not).
    pub async fn cached(&self) -> Option<Credential> {
        self.cache.lock().await.clone()
    }

    async fn request_token(&self) -> Result<String, SdkError> {
        let res = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", self.config.scope.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        if status != reqwest::StatusCode::OK {
            let text = res.text().await.unwrap_or_default();
            warn!(%status, "token endpoint rejected client credentials");
            return Err(SdkError::Auth(format!(
                "token endpoint returned {status}: {text}"
            )));
        }

        let body: serde_json::Value = res.json().await?;
        body["access_token"]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(String::from)
            .ok_or_else(|| SdkError::Auth("missing access_token".into()))
    }
}
