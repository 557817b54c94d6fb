//! MusicBrainz catalog backend.
//!
//! Uses the WS/2 JSON API. MusicBrainz asks clients to identify themselves
//! with a User-Agent and to stay at or below one request per second.

use super::{CatalogBackend, ReleaseDetail, ReleaseSummary};
use crate::config::CatalogSettings;
use crate::error::{HentError, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, instrument};

/// MusicBrainz-backed catalog.
pub struct MusicBrainzCatalog {
    http: Client,
    base_url: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

#[derive(Debug, Deserialize)]
struct ReleaseSearchResponse {
    #[serde(default)]
    releases: Vec<ReleaseSummary>,
}

impl MusicBrainzCatalog {
    /// Create a client from catalog settings.
    pub fn new(settings: &CatalogSettings) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&settings.user_agent)
                .map_err(|e| HentError::Config(format!("Invalid catalog user agent: {}", e)))?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            min_interval: Duration::from_millis(settings.min_interval_ms),
            last_request: Mutex::new(None),
        })
    }

    /// Sleep if the previous request was less than `min_interval` ago.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Rate limiting MusicBrainz request");
                sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl CatalogBackend for MusicBrainzCatalog {
    #[instrument(skip(self))]
    async fn search_releases(&self, query: &str) -> Result<Vec<ReleaseSummary>> {
        self.throttle().await;

        let response = self
            .http
            .get(format!("{}/release", self.base_url))
            .query(&[("query", query), ("fmt", "json")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HentError::Catalog(format!(
                "release search returned {}",
                response.status()
            )));
        }

        let body: ReleaseSearchResponse = response.json().await?;
        debug!("Catalog returned {} releases", body.releases.len());
        Ok(body.releases)
    }

    #[instrument(skip(self))]
    async fn release(&self, id: &str) -> Result<Option<ReleaseDetail>> {
        self.throttle().await;

        let response = self
            .http
            .get(format!("{}/release/{}", self.base_url, id))
            .query(&[("inc", "recordings artist-credits"), ("fmt", "json")])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(HentError::Catalog(format!(
                "release lookup for {} returned {}",
                id, status
            ))),
        }
    }
}
