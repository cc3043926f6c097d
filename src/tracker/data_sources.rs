//! Snapshot sources.
//!
//! This module defines the fetch boundary of the tracker and the HTTP client
//! for the Blockspan `nfthistory` endpoint. Every failure is returned as a
//! typed [`FetchError`]; nothing here panics or retries.

use crate::tracker::types::{FetchError, QueryWindow, Snapshot, TrackerConfig, WindowPair};
use crate::types::{BinSize, Chain, Timeframe};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

/// Path of the sales-history endpoint, relative to the API host.
pub const NFT_HISTORY_PATH: &str = "/v1/nfts/nfthistory";

/// Header carrying the API credential.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Parameters of a single snapshot request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotQuery {
    pub contract_address: String,
    pub chain: Chain,
    pub timeframe: Timeframe,
    pub bin_size: BinSize,
    pub timestamp_end: DateTime<Utc>,
}

impl SnapshotQuery {
    /// Build the query for one of the windows in `windows`.
    pub fn for_window(
        contract_address: &str,
        chain: Chain,
        windows: &WindowPair,
        window: &QueryWindow,
    ) -> Self {
        Self {
            contract_address: contract_address.to_string(),
            chain,
            timeframe: windows.timeframe,
            bin_size: windows.bin_size,
            timestamp_end: window.end,
        }
    }

    /// ISO-8601 end timestamp with millisecond precision and a `Z` suffix.
    pub fn timestamp_end_param(&self) -> String {
        self.timestamp_end.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Query-string pairs in the order the API documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("timestamp_end", self.timestamp_end_param()),
            ("contract_address", self.contract_address.clone()),
            ("chain", self.chain.as_str().to_string()),
            ("timeframe", self.timeframe.as_str().to_string()),
            ("bin_size", self.bin_size.as_str().to_string()),
        ]
    }
}

/// Anything that can produce a snapshot for a query.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self, query: &SnapshotQuery) -> Result<Snapshot, FetchError>;
}

/// HTTP client for the Blockspan analytics API.
pub struct BlockspanClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    timeout: Option<Duration>,
}

impl BlockspanClient {
    /// Create a client from configuration. Fails if no API key is configured.
    pub fn new(http_client: Client, config: &TrackerConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("No Blockspan API key configured (set BLOCKSPAN_API_KEY)"))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout: config.request_timeout_seconds.map(Duration::from_secs),
        })
    }

    /// Full URL of the sales-history endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, NFT_HISTORY_PATH)
    }
}

#[async_trait]
impl SnapshotSource for BlockspanClient {
    #[instrument(skip(self, query), fields(
        chain = %query.chain,
        contract = %query.contract_address,
        timestamp_end = %query.timestamp_end_param()
    ))]
    async fn fetch_snapshot(&self, query: &SnapshotQuery) -> Result<Snapshot, FetchError> {
        let mut request = self
            .http_client
            .get(self.endpoint())
            .header(ACCEPT, "application/json")
            .header(API_KEY_HEADER, self.api_key.as_str())
            .query(&query.query_pairs());

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(FetchError::Unauthorized);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let snapshot = Snapshot::from_json(&body)?;
        debug!("Fetched snapshot ({} status)", status.as_u16());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::window::compute_windows;
    use chrono::TimeZone;

    fn create_test_config() -> TrackerConfig {
        TrackerConfig {
            api_key: Some("test-key".to_string()),
            base_url: "https://api.example.com/".to_string(),
            request_timeout_seconds: Some(5),
        }
    }

    #[test]
    fn test_query_pairs() {
        let now = Utc.with_ymd_and_hms(2023, 8, 1, 0, 0, 0).unwrap();
        let windows = compute_windows(Timeframe::SevenDays, now);
        let query = SnapshotQuery::for_window("0xabc", Chain::BscMain, &windows, &windows.prior);

        assert_eq!(
            query.query_pairs(),
            vec![
                ("timestamp_end", "2023-07-25T00:00:00.000Z".to_string()),
                ("contract_address", "0xabc".to_string()),
                ("chain", "bsc-main".to_string()),
                ("timeframe", "7_DAYS".to_string()),
                ("bin_size", "1_DAY".to_string()),
            ]
        );
    }

    #[test]
    fn test_client_creation() {
        let client = BlockspanClient::new(Client::new(), &create_test_config()).unwrap();

        assert_eq!(client.endpoint(), "https://api.example.com/v1/nfts/nfthistory");
        assert_eq!(client.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = TrackerConfig {
            api_key: Some("   ".to_string()),
            ..TrackerConfig::default()
        };

        assert!(BlockspanClient::new(Client::new(), &config).is_err());
        assert!(BlockspanClient::new(Client::new(), &TrackerConfig::default()).is_err());
    }
}
