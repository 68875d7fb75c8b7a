//! Loopio library-entries client.
//!
//! Only the first page is ever requested; the page size bounds how many
//! entries a single sync can see.

use loopsync_models::SourceFilter;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::SdkError;

/// Body of `GET /data/v2/libraryEntries`.
#[derive(Deserialize)]
struct LibraryEntriesPage {
    #[serde(default)]
    items: Vec<Value>,
}

/// Reads library entries from the Loopio API.
#[derive(Debug, Clone)]
pub struct LoopioClient {
    http: reqwest::Client,
    entries_url: String,
    page_size: u32,
    filter: SourceFilter,
}

impl LoopioClient {
    /// Create a client for the given library-entries URL.
    pub fn new(
        http: reqwest::Client,
        entries_url: impl Into<String>,
        page_size: u32,
        filter: SourceFilter,
    ) -> Self {
        Self {
            http,
            entries_url: entries_url.into(),
            page_size,
            filter,
        }
    }

    /// The configured filter.
    pub fn filter(&self) -> &SourceFilter {
        &self.filter
    }

    /// Full request URL, with `filter` and `pageSize` percent-encoded.
    pub fn request_url(&self) -> Result<Url, SdkError> {
        let mut url = Url::parse(&self.entries_url)
            .map_err(|e| SdkError::Config(format!("invalid Loopio URL {}: {e}", self.entries_url)))?;
        {
            let mut query = url.query_pairs_mut();
            if !self.filter.is_empty() {
                query.append_pair("filter", &self.filter.to_query());
            }
            query.append_pair("pageSize", &self.page_size.to_string());
        }
        Ok(url)
    }

    /// Fetch the first page of entries matching the filter.
    ///
    /// Entries are returned in the order the API listed them.
    pub async fn fetch_entries(&self, token: &str) -> Result<Vec<Value>, SdkError> {
        let url = self.request_url()?;
        debug!(%url, "fetching library entries");

        let res = self.http.get(url).bearer_auth(token).send().await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let message = res.text().await.unwrap_or_default();
            return Err(SdkError::Upstream { status, message });
        }

        let page: LibraryEntriesPage = res.json().await?;
        Ok(page.items)
    }
}
