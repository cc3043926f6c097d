//! Tracker module - comparative sales metrics for NFT collections.
//!
//! A request derives two query windows from a timeframe, fetches a snapshot
//! for each from the analytics API and compares them metric by metric.

pub mod types;
pub mod window;
pub mod format;
pub mod data_sources;
pub mod comparator;
pub mod metrics;
pub mod session;
pub mod report;

// Re-export main types
pub use types::{
    ChangeDirection, Comparison, ComparisonError, ComparisonReport, ComparisonRow, FetchError,
    MetricKey, MetricValue, PercentChange, QueryWindow, RequestState, Snapshot, TrackerConfig,
    WindowPair,
};

// Re-export key components
pub use comparator::SnapshotComparator;
pub use data_sources::{BlockspanClient, SnapshotQuery, SnapshotSource};
pub use format::{format_metric, percent_change};
pub use metrics::TrackerMetrics;
pub use session::{ComparisonSession, SessionView, Submission};
pub use window::compute_windows;

use anyhow::{Context, Result};
use std::sync::Arc;

/// Tracker builder for convenient construction with sensible defaults.
pub struct TrackerBuilder {
    config: TrackerConfig,
}

impl TrackerBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: TrackerConfig::default(),
        }
    }

    /// Start from an existing configuration.
    pub fn from_config(config: TrackerConfig) -> Self {
        Self { config }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    /// Set the API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Set a per-request timeout in seconds.
    pub fn with_request_timeout(mut self, seconds: u64) -> Self {
        self.config.request_timeout_seconds = Some(seconds);
        self
    }

    /// Build the tracker configuration.
    pub fn build_config(self) -> TrackerConfig {
        self.config
    }

    /// Build a session backed by the Blockspan HTTP client.
    pub fn build(self) -> Result<ComparisonSession> {
        let http_client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        let source = BlockspanClient::new(http_client, &self.config)?;
        let comparator = SnapshotComparator::new(Arc::new(source));

        Ok(ComparisonSession::new(comparator, TrackerMetrics::new()))
    }
}

impl Default for TrackerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_builder() {
        let config = TrackerBuilder::new()
            .with_api_key("key")
            .with_base_url("http://localhost:8080")
            .with_request_timeout(15)
            .build_config();

        assert_eq!(config.api_key.as_deref(), Some("key"));
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.request_timeout_seconds, Some(15));
    }

    #[test]
    fn test_tracker_builder_defaults() {
        let config = TrackerBuilder::new().build_config();

        assert_eq!(config.base_url, "https://api.blockspan.com");
        assert!(config.api_key.is_none());
        assert!(config.request_timeout_seconds.is_none());
    }

    #[test]
    fn test_build_requires_api_key() {
        assert!(TrackerBuilder::new().build().is_err());
    }

    #[tokio::test]
    async fn test_build_session() {
        let session = TrackerBuilder::new().with_api_key("key").build().unwrap();
        assert_eq!(session.state().await, RequestState::Idle);
    }
}
