//! Oracle Content Management items client.
//!
//! Requests go through the OCM proxy service, which expects the
//! `X-Requested-With` header on every call.

use loopsync_models::DestinationAsset;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;

use crate::error::SdkError;

/// Result of a successful item creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedItem {
    /// HTTP status returned by OCM.
    pub status: u16,
    /// Id of the new item, when the response body carried one.
    pub id: Option<String>,
}

/// Creates content items in an OCM repository.
#[derive(Debug, Clone)]
pub struct OcmClient {
    http: reqwest::Client,
    items_url: String,
    headers: HeaderMap,
}

impl OcmClient {
    /// Create a client posting to `items_url` with the given static headers.
    pub fn new(http: reqwest::Client, items_url: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            http,
            items_url: items_url.into(),
            headers,
        }
    }

    /// Headers required by the OCM proxy.
    pub fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("XMLHttpRequest"),
        );
        headers
    }

    /// Target URL of item creation.
    pub fn items_url(&self) -> &str {
        &self.items_url
    }

    /// Create one item.
    pub async fn create_item(&self, asset: &DestinationAsset) -> Result<CreatedItem, SdkError> {
        let res = self
            .http
            .post(&self.items_url)
            .headers(self.headers.clone())
            .json(asset)
            .send()
            .await?;

        let status = res.status().as_u16();
        if !res.status().is_success() {
            let message = res.text().await.unwrap_or_default();
            return Err(SdkError::Upstream { status, message });
        }

        // OCM answers with the created item; an empty body is still a success.
        let body: Option<Value> = res.json().await.ok();
        let id = body
            .as_ref()
            .and_then(|b| b.get("id"))
            .and_then(Value::as_str)
            .map(String::from);

        Ok(CreatedItem { status, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopsync_models::{AssetTarget, FieldMap};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn asset() -> DestinationAsset {
        let target = AssetTarget {
            repository_id: "REPO".into(),
            language: "en".into(),
        };
        FieldMap::default().transform(&json!({ "id": "1", "tags": ["A"] }), &target)
    }

    fn client(server: &MockServer) -> OcmClient {
        OcmClient::new(
            reqwest::Client::new(),
            format!("{}/pxysvc/proxy/oce-apps/items", server.uri()),
            OcmClient::default_headers(),
        )
    }

    #[tokio::test]
    async fn posts_asset_with_proxy_headers() {
        let server = MockServer::start().await;
        let expected = serde_json::to_value(asset()).unwrap();
        Mock::given(method("POST"))
            .and(path("/pxysvc/proxy/oce-apps/items"))
            .and(header("x-requested-with", "XMLHttpRequest"))
            .and(header("content-type", "application/json"))
            .and(body_json(&expected))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "CORE123" })))
            .expect(1)
            .mount(&server)
            .await;

        let created = client(&server).create_item(&asset()).await.unwrap();
        assert_eq!(
            created,
            CreatedItem {
                status: 201,
                id: Some("CORE123".into())
            }
        );
    }

    #[tokio::test]
    async fn empty_success_body_has_no_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let created = client(&server).create_item(&asset()).await.unwrap();
        assert_eq!(created.status, 200);
        assert_eq!(created.id, None);
    }

    #[tokio::test]
    async fn rejection_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad type"))
            .mount(&server)
            .await;

        let err = client(&server).create_item(&asset()).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }
}
