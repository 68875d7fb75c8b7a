//! The Loopio → OCM sync pipeline.
//!
//! One run:
//!
//! 1. Obtains a Loopio bearer token (cached across runs).
//! 2. Fetches a single page of library entries.
//! 3. Maps every entry to an OCM asset, in source order.
//! 4. Creates all assets concurrently and waits for every request to settle.
//! 5. Reports how many were created and which ones failed.
//!
//! A run succeeds once step 4 has settled, whatever the per-item outcomes.
//! There is no retry and no duplicate detection: running twice over the
//! same entries creates the items twice.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use loopsync_models::{AssetTarget, DestinationAsset, FieldMap};
use loopsync_sdk::{LoopioClient, OcmClient, TokenProvider};
use serde::Serialize;
use serde_json::Value;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::{AppConfig, ConfigError};
use crate::error::SyncError;

/// A single item that OCM did not accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitFailure {
    /// Asset name (the mapped source value).
    pub name: String,
    /// OCM status, when it answered.
    pub status: Option<u16>,
    /// Failure description.
    pub error: String,
}

/// Outcome of one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Correlation id of the run, also present in the logs.
    pub run_id: Uuid,
    /// Entries returned by Loopio.
    pub fetched: usize,
    /// Items OCM accepted.
    pub created: usize,
    /// Items OCM rejected or that could not be sent.
    pub failed: Vec<SubmitFailure>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the last submission settled.
    pub finished_at: DateTime<Utc>,
}

/// Wires the token provider, both API clients and the field map together.
pub struct SyncPipeline {
    tokens: Arc<TokenProvider>,
    loopio: LoopioClient,
    ocm: OcmClient,
    field_map: FieldMap,
    target: AssetTarget,
}

impl SyncPipeline {
    /// Assemble a pipeline from its parts.
    pub fn new(
        tokens: Arc<TokenProvider>,
        loopio: LoopioClient,
        ocm: OcmClient,
        field_map: FieldMap,
        target: AssetTarget,
    ) -> Self {
        Self {
            tokens,
            loopio,
            ocm,
            field_map,
            target,
        }
    }

    /// Build the pipeline described by `config`, sharing one HTTP client.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let http = config.http_client()?;
        let tokens = Arc::new(TokenProvider::new(http.clone(), config.loopio.oauth()));
        let loopio = LoopioClient::new(
            http.clone(),
            config.loopio.entries_url(),
            config.loopio.page_size,
            config.loopio.filter.clone(),
        );
        let ocm = OcmClient::new(http, config.ocm.items_url(), OcmClient::default_headers());

        Ok(Self::new(
            tokens,
            loopio,
            ocm,
            config.field_map.clone(),
            config.ocm.target(),
        ))
    }

    /// Execute one sync run.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let run_id = Uuid::new_v4();
        self.run_inner(run_id)
            .instrument(info_span!("sync", %run_id))
            .await
    }

    async fn run_inner(&self, run_id: Uuid) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();

        let token = self.tokens.get_token().await.map_err(SyncError::NoToken)?;

        let records = self
            .loopio
            .fetch_entries(&token)
            .await
            .map_err(|e| SyncError::fetch(&e))?;
        info!(fetched = records.len(), "library entries fetched");

        // TODO: look up existing items by loopioId in OCM and skip them, so
        // overlapping runs stop creating duplicates.
        let assets = self.transform(&records);

        let outcomes = self.submit_all(&assets).await;
        let fetched = records.len();
        let failed: Vec<SubmitFailure> = outcomes.into_iter().flatten().collect();
        let created = fetched - failed.len();

        info!(fetched, created, failed = failed.len(), "sync run finished");

        Ok(SyncReport {
            run_id,
            fetched,
            created,
            failed,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Map source records to assets, preserving order.
    pub fn transform(&self, records: &[Value]) -> Vec<DestinationAsset> {
        records
            .iter()
            .map(|record| self.field_map.transform(record, &self.target))
            .collect()
    }

    /// Create every asset concurrently; one entry per asset, `Some` on failure.
    async fn submit_all(&self, assets: &[DestinationAsset]) -> Vec<Option<SubmitFailure>> {
        let submissions = assets.iter().map(|asset| async move {
            let name = asset.label();
            match self.ocm.create_item(asset).await {
                Ok(created) => {
                    debug!(%name, status = created.status, id = ?created.id, "item created");
                    None
                }
                Err(e) => {
                    warn!(%name, error = %e, "item creation failed");
                    Some(SubmitFailure {
                        name,
                        status: e.status(),
                        error: e.to_string(),
                    })
                }
            }
        });

        join_all(submissions).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use loopsync_models::{FilterEntry, SourceFilter};
    use loopsync_sdk::OAuthConfig;
    use serde_json::json;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) const TOKEN_PATH: &str = "/oauth2/access_token";
    pub(crate) const ENTRIES_PATH: &str = "/data/v2/libraryEntries";
    pub(crate) const ITEMS_PATH: &str = "/pxysvc/proxy/oce-apps/items";

    /// Pipeline whose three remote endpoints all live on `server`.
    pub(crate) fn pipeline_for(server: &MockServer) -> SyncPipeline {
        let http = reqwest::Client::new();
        let tokens = Arc::new(TokenProvider::new(
            http.clone(),
            OAuthConfig::new(&format!("{}{TOKEN_PATH}", server.uri()), "client", "secret"),
        ));
        let loopio = LoopioClient::new(
            http.clone(),
            format!("{}{ENTRIES_PATH}", server.uri()),
            100,
            SourceFilter::new(vec![FilterEntry::new("language", "en")]),
        );
        let ocm = OcmClient::new(
            http,
            format!("{}{ITEMS_PATH}", server.uri()),
            OcmClient::default_headers(),
        );
        let target = AssetTarget {
            repository_id: "REPO".into(),
            language: "en".into(),
        };
        SyncPipeline::new(tokens, loopio, ocm, FieldMap::default(), target)
    }

    pub(crate) async fn mount_token(server: &MockServer, status: u16, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({ "access_token": "tok" })),
            )
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    pub(crate) async fn mount_entries(server: &MockServer, items: Value, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path(ENTRIES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    pub(crate) async fn mount_items(server: &MockServer, status: u16, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(ITEMS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    fn three_entries() -> Value {
        json!([
            { "id": "1", "tags": ["A"] },
            { "id": "2", "tags": [] },
            { "id": "3", "tags": ["A", "B"] },
        ])
    }

    #[tokio::test]
    async fn three_records_produce_three_posts() {
        let server = MockServer::start().await;
        mount_token(&server, 200, 1).await;
        mount_entries(&server, three_entries(), 1).await;
        mount_items(&server, 201, 3).await;

        let report = pipeline_for(&server).run().await.unwrap();
        assert_eq!(report.fetched, 3);
        assert_eq!(report.created, 3);
        assert!(report.failed.is_empty());
        server.verify().await;
    }

    #[tokio::test]
    async fn submissions_are_launched_together() {
        let server = MockServer::start().await;
        mount_token(&server, 200, 1).await;
        mount_entries(&server, three_entries(), 1).await;
        Mock::given(method("POST"))
            .and(path(ITEMS_PATH))
            .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_millis(300)))
            .expect(3)
            .mount(&server)
            .await;

        let started = Instant::now();
        let report = pipeline_for(&server).run().await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(report.created, 3);
        // One at a time would take at least 900 ms.
        assert!(elapsed < Duration::from_millis(750), "took {elapsed:?}");
        server.verify().await;
    }

    #[tokio::test]
    async fn failed_post_is_reported_without_aborting() {
        let server = MockServer::start().await;
        mount_token(&server, 200, 1).await;
        mount_entries(&server, three_entries(), 1).await;
        Mock::given(method("POST"))
            .and(path(ITEMS_PATH))
            .and(body_partial_json(json!({ "name": "2" })))
            .respond_with(ResponseTemplate::new(409).set_body_string("conflict"))
            .expect(1)
            .mount(&server)
            .await;
        mount_items(&server, 201, 2).await;

        let report = pipeline_for(&server).run().await.unwrap();
        assert_eq!(report.fetched, 3);
        assert_eq!(report.created, 2);
        assert_eq!(
            report.failed,
            vec![SubmitFailure {
                name: "2".into(),
                status: Some(409),
                error: "upstream returned 409: conflict".into(),
            }]
        );
        server.verify().await;
    }

    #[tokio::test]
    async fn source_error_stops_before_submission() {
        let server = MockServer::start().await;
        mount_token(&server, 200, 1).await;
        Mock::given(method("GET"))
            .and(path(ENTRIES_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .expect(1)
            .mount(&server)
            .await;
        mount_items(&server, 201, 0).await;

        let err = pipeline_for(&server).run().await.unwrap_err();
        assert!(matches!(err, SyncError::FetchFailed { status: Some(503), .. }));
        server.verify().await;
    }

    #[tokio::test]
    async fn token_failure_stops_before_fetch() {
        let server = MockServer::start().await;
        mount_token(&server, 401, 1).await;
        mount_entries(&server, three_entries(), 0).await;
        mount_items(&server, 201, 0).await;

        let err = pipeline_for(&server).run().await.unwrap_err();
        assert!(matches!(err, SyncError::NoToken(_)));
        server.verify().await;
    }

    #[tokio::test]
    async fn token_is_reused_across_runs() {
        let server = MockServer::start().await;
        mount_token(&server, 200, 1).await;
        mount_entries(&server, json!([]), 2).await;
        mount_items(&server, 201, 0).await;

        let pipeline = pipeline_for(&server);
        let first = pipeline.run().await.unwrap();
        let second = pipeline.run().await.unwrap();
        assert_eq!(first.fetched, 0);
        assert_ne!(first.run_id, second.run_id);
        server.verify().await;
    }

    #[tokio::test]
    async fn submitted_body_is_the_mapped_asset() {
        let server = MockServer::start().await;
        mount_token(&server, 200, 1).await;
        mount_entries(&server, json!([{ "id": "7", "tags": ["X"] }]), 1).await;
        Mock::given(method("POST"))
            .and(path(ITEMS_PATH))
            .and(body_partial_json(json!({
                "repositoryId": "REPO",
                "type": "LoopioItem",
                "name": "7",
                "language": "en",
                "translatable": true,
                "fields": {
                    "loopioId": "7",
                    "loopioData": { "id": "7", "tags": ["X"] },
                },
                "tags": { "data": [{ "name": "X" }] },
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let report = pipeline_for(&server).run().await.unwrap();
        assert_eq!(report.created, 1);
        server.verify().await;
    }

    #[test]
    fn transform_preserves_source_order() {
        let server_uri = "http://localhost:1";
        let http = reqwest::Client::new();
        let pipeline = SyncPipeline::new(
            Arc::new(TokenProvider::new(
                http.clone(),
                OAuthConfig::new(server_uri, "c", "s"),
            )),
            LoopioClient::new(http.clone(), server_uri, 1, SourceFilter::default()),
            OcmClient::new(http, server_uri, OcmClient::default_headers()),
            FieldMap::default(),
            AssetTarget {
                repository_id: "REPO".into(),
                language: "en".into(),
            },
        );

        let assets = pipeline.transform(&[json!({ "id": "b" }), json!({ "id": "a" })]);
        let names: Vec<String> = assets.iter().map(DestinationAsset::label).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
