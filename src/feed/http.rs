//! Object-store client for daily snapshot files

use super::{parse_ndjson, snapshot_url, SnapshotSource};
use crate::config::FeedConfig;
use crate::error::{Result, SpreadError};
use crate::types::{Asset, Exchange, Observation};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Fetches snapshot files over HTTP(S)
pub struct HttpSnapshotSource {
    http: Client,
    base_url: String,
}

impl HttpSnapshotSource {
    /// Create a new client; the timeout bounds every fetch
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_day(
        &self,
        exchange: Exchange,
        asset: Asset,
        day: NaiveDate,
    ) -> Result<Vec<Observation>> {
        let url = snapshot_url(&self.base_url, exchange, asset, day);
        // Cache-busting parameter
        let bust = Utc::now().timestamp_millis().to_string();

        let resp = self
            .http
            .get(&url)
            .query(&[("v", bust.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SpreadError::Fetch {
                status: status.as_u16(),
                url,
            });
        }

        let body = resp.text().await?;
        let observations = parse_ndjson(&body)?;
        debug!("Fetched {} snapshots from {}", observations.len(), url);
        Ok(observations)
    }
}
