//! # loopsync SDK
//!
//! HTTP clients for both ends of the Loopio → OCM bridge.
//!
//! The SDK provides:
//!
//! * [`TokenProvider`] — OAuth2 client-credentials exchange against
//!   Loopio, with the bearer [`Credential`] cached until it expires.
//! * [`LoopioClient`] — fetches one filtered page of library entries.
//! * [`OcmClient`] — creates content items in an OCM repository.
//! * [`SdkError`] — unified error type for all SDK operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use loopsync_models::SourceFilter;
//! use loopsync_sdk::{LoopioClient, OAuthConfig, TokenProvider};
//!
//! # async fn run() -> Result<(), loopsync_sdk::SdkError> {
//! let http = reqwest::Client::new();
//! let tokens = TokenProvider::new(
//!     http.clone(),
//!     OAuthConfig::new("https://api.loopio.com/oauth2/access_token", "id", "secret"),
//! );
//! let loopio = LoopioClient::new(
//!     http,
//!     "https://api.loopio.com/data/v2/libraryEntries",
//!     100,
//!     SourceFilter::default(),
//! );
//!
//! let token = tokens.get_token().await?;
//! let entries = loopio.fetch_entries(&token).await?;
//! println!("fetched {} entries", entries.len());
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod error;
pub mod loopio;
pub mod ocm;
pub mod token;

pub use credentials::Credential;
pub use error::SdkError;
pub use loopio::LoopioClient;
pub use ocm::{CreatedItem, OcmClient};
pub use token::{Clock, OAuthConfig, SystemClock, TokenProvider};
