//! Sync service configuration.
//!
//! Everything the bridge needs to know about both remote APIs, the field
//! map and the HTTP listener.  Built once at startup from environment
//! variables; the defaults describe the reference Loopio/OCM deployment.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use loopsync_models::{AssetTarget, FieldMap, FilterEntry, SourceFilter};
use loopsync_sdk::OAuthConfig;
use serde_json::json;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set to something unusable.
    #[error("invalid value for {var}: {reason}")]
    InvalidValue {
        /// Environment variable name.
        var: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// The field-map file could not be read.
    #[error("failed to read {path}: {source}")]
    ReadFile {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The shared HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

fn invalid(var: &str, reason: impl Display) -> ConfigError {
    ConfigError::InvalidValue {
        var: var.to_string(),
        reason: reason.to_string(),
    }
}

/// Source API (Loopio) parameters.
#[derive(Debug, Clone)]
pub struct LoopioConfig {
    /// Scheme + host, e.g. `https://api.int01.loopio.com`.
    pub hostname: String,
    /// Token endpoint path.
    pub oauth_path: String,
    /// Library-entries path.
    pub entries_path: String,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Requested OAuth scope.
    pub scope: String,
    /// Fixed token lifetime.
    pub token_lifetime: chrono::Duration,
    /// Entries requested per sync (single page).
    pub page_size: u32,
    /// Library-entry filter.
    pub filter: SourceFilter,
}

impl LoopioConfig {
    /// Full token endpoint URL.
    pub fn token_url(&self) -> String {
        format!("{}{}", self.hostname, self.oauth_path)
    }

    /// Full library-entries URL.
    pub fn entries_url(&self) -> String {
        format!("{}{}", self.hostname, self.entries_path)
    }

    /// Client-credentials parameters for the token provider.
    pub fn oauth(&self) -> OAuthConfig {
        let mut oauth = OAuthConfig::new(&self.token_url(), &self.client_id, &self.client_secret);
        oauth.scope = self.scope.clone();
        oauth.token_lifetime = self.token_lifetime;
        oauth
    }
}

/// Destination API (OCM) parameters.
#[derive(Debug, Clone)]
pub struct OcmConfig {
    /// Scheme + host of the OCM instance.
    pub hostname: String,
    /// Items path (through the proxy service).
    pub items_path: String,
    /// Repository receiving the items.
    pub repository_id: String,
    /// Language of created items.
    pub language: String,
}

impl OcmConfig {
    /// Full items URL.
    pub fn items_url(&self) -> String {
        format!("{}{}", self.hostname, self.items_path)
    }

    /// Constants stamped onto every asset.
    pub fn target(&self) -> AssetTarget {
        AssetTarget {
            repository_id: self.repository_id.clone(),
            language: self.language.clone(),
        }
    }
}

/// Global configuration of the sync service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to listen on (default `5000`).
    pub listen_port: u16,
    /// Paths that trigger a sync on `GET`.
    pub trigger_paths: Vec<String>,
    /// Optional timeout applied to every outbound request.
    pub http_timeout: Option<Duration>,
    /// Source API.
    pub loopio: LoopioConfig,
    /// Destination API.
    pub ocm: OcmConfig,
    /// Loopio → OCM field map.
    pub field_map: FieldMap,
}

impl AppConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable                     | Default                                            |
    /// |------------------------------|----------------------------------------------------|
    /// | `PORT`                       | `5000`                                             |
    /// | `TRIGGER_PATHS`              | `/cron,/test`                                      |
    /// | `HTTP_TIMEOUT_SECS`          | unset (no timeout)                                 |
    /// | `LOOPIO_HOSTNAME`            | `https://api.int01.loopio.com`                     |
    /// | `LOOPIO_OAUTH_PATH`          | `/oauth2/access_token`                             |
    /// | `LOOPIO_ENTRIES_PATH`        | `/data/v2/libraryEntries`                          |
    /// | `LOOPIO_CLIENT_ID`           | empty                                              |
    /// | `LOOPIO_CLIENT_SECRET`       | empty                                              |
    /// | `LOOPIO_SCOPE`               | `library:read`                                     |
    /// | `LOOPIO_TOKEN_LIFETIME_SECS` | `3600`                                             |
    /// | `LOOPIO_PAGE_SIZE`           | `100`                                              |
    /// | `LOOPIO_FILTER`              | JSON `[{"key": …, "value": …}]`, see [`default_filter`] |
    /// | `OCM_HOSTNAME`               | `https://demodev-oce0001.cec.ocp.oraclecloud.com`  |
    /// | `OCM_ITEMS_PATH`             | `/pxysvc/proxy/oce-apps/items`                     |
    /// | `OCM_REPOSITORY_ID`          | `6EF7F6A4A8FE4473805DE9829C14CAF7`                 |
    /// | `OCM_LANGUAGE`               | `en`                                               |
    /// | `FIELD_MAP_PATH`             | unset (built-in [`FieldMap::default`])             |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let string = |var: &str, default: &str| lookup(var).unwrap_or_else(|| default.to_string());

        let listen_port = parse_var(&lookup, "PORT", 5000)?;
        let trigger_paths = parse_trigger_paths(&string("TRIGGER_PATHS", "/cron,/test"))?;

        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(
                raw.parse().map_err(|e| invalid("HTTP_TIMEOUT_SECS", e))?,
            )),
            None => None,
        };

        let filter = match lookup("LOOPIO_FILTER") {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| invalid("LOOPIO_FILTER", e))?,
            None => default_filter(),
        };

        let token_lifetime_secs: i64 = parse_var(&lookup, "LOOPIO_TOKEN_LIFETIME_SECS", 3600)?;
        if token_lifetime_secs <= 0 {
            return Err(invalid("LOOPIO_TOKEN_LIFETIME_SECS", "must be positive"));
        }
        let token_lifetime = chrono::Duration::try_seconds(token_lifetime_secs)
            .ok_or_else(|| invalid("LOOPIO_TOKEN_LIFETIME_SECS", "out of range"))?;

        let loopio = LoopioConfig {
            hostname: string("LOOPIO_HOSTNAME", "https://api.int01.loopio.com"),
            oauth_path: string("LOOPIO_OAUTH_PATH", "/oauth2/access_token"),
            entries_path: string("LOOPIO_ENTRIES_PATH", "/data/v2/libraryEntries"),
            client_id: string("LOOPIO_CLIENT_ID", ""),
            client_secret: string("LOOPIO_CLIENT_SECRET", ""),
            scope: string("LOOPIO_SCOPE", loopsync_sdk::token::DEFAULT_SCOPE),
            token_lifetime,
            page_size: parse_var(&lookup, "LOOPIO_PAGE_SIZE", 100)?,
            filter,
        };

        let ocm = OcmConfig {
            hostname: string("OCM_HOSTNAME", "https://demodev-oce0001.cec.ocp.oraclecloud.com"),
            items_path: string("OCM_ITEMS_PATH", "/pxysvc/proxy/oce-apps/items"),
            repository_id: string("OCM_REPOSITORY_ID", "6EF7F6A4A8FE4473805DE9829C14CAF7"),
            language: string("OCM_LANGUAGE", "en"),
        };

        let field_map = match lookup("FIELD_MAP_PATH") {
            Some(path) => load_field_map(&path)?,
            None => FieldMap::default(),
        };

        Ok(Self {
            listen_port,
            trigger_paths,
            http_timeout,
            loopio,
            ocm,
            field_map,
        })
    }

    /// Shared HTTP client for all outbound calls.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.http_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

/// Entries updated since 2022, in English, tagged `PullYes`.
pub fn default_filter() -> SourceFilter {
    SourceFilter::new(vec![
        FilterEntry::new("lastUpdatedDate", json!({ "gte": "2022-01-01T00:00:00Z" })),
        FilterEntry::new("language", "en"),
        FilterEntry::new("tags", json!(["PullYes"])),
    ])
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|e| invalid(var, e)),
        None => Ok(default),
    }
}

fn parse_trigger_paths(raw: &str) -> Result<Vec<String>, ConfigError> {
    let paths: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();

    if paths.is_empty() {
        return Err(invalid("TRIGGER_PATHS", "at least one path is required"));
    }
    for path in &paths {
        if !path.starts_with('/') {
            return Err(invalid("TRIGGER_PATHS", format!("\"{path}\" must start with '/'")));
        }
        if path == "/health" {
            return Err(invalid("TRIGGER_PATHS", "/health is reserved"));
        }
        if path.contains(['{', '}', '*']) {
            return Err(invalid(
                "TRIGGER_PATHS",
                format!("\"{path}\" must be a literal path"),
            ));
        }
    }
    for (i, path) in paths.iter().enumerate() {
        if paths[..i].contains(path) {
            return Err(invalid("TRIGGER_PATHS", format!("\"{path}\" is listed twice")));
        }
    }
    Ok(paths)
}

fn load_field_map(path: &str) -> Result<FieldMap, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|e| invalid("FIELD_MAP_PATH", e))
}
