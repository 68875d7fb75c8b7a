//! Bearer credential issued by the Loopio token endpoint.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// A bearer token together with the moment it was issued.
///
/// A credential is valid while `now < issued_at + lifetime`.  It is never
/// refreshed in place; [`TokenProvider`](crate::TokenProvider) replaces it
/// wholesale once it has expired.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    value: String,
    issued_at: DateTime<Utc>,
    lifetime: Duration,
}

impl Credential {
    /// Create a credential issued at `issued_at`.
    pub fn new(value: impl Into<String>, issued_at: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            value: value.into(),
            issued_at,
            lifetime,
        }
    }

    /// The opaque token value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// When the token was obtained.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// First instant at which the token is no longer valid.
    ///
    /// Saturates at [`DateTime::<Utc>::MAX_UTC`] for lifetimes too long to
    /// represent.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at
            .checked_add_signed(self.lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether the token may still be used at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }
}

// Keep tokens out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}
