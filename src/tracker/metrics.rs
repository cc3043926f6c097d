//! In-memory request counters for the tracker.

use crate::tracker::types::{Comparison, ComparisonError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

pub const SUBMITTED_TOTAL: &str = "tracker_submitted_total";
pub const SUCCESS_TOTAL: &str = "tracker_success_total";
pub const NO_DATA_TOTAL: &str = "tracker_no_data_total";
pub const VALIDATION_ERRORS_TOTAL: &str = "tracker_validation_errors_total";
pub const AUTH_ERRORS_TOTAL: &str = "tracker_auth_errors_total";
pub const QUERY_ERRORS_TOTAL: &str = "tracker_query_errors_total";
pub const STALE_DISCARDED_TOTAL: &str = "tracker_stale_discarded_total";

/// Counter store shared between a session and its callers.
#[derive(Debug, Clone, Default)]
pub struct TrackerMetrics {
    counters: Arc<RwLock<HashMap<String, u64>>>,
}

impl TrackerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn increment_counter(&self, name: &str) {
        let mut counters = self.counters.write().await;
        *counters.entry(name.to_string()).or_insert(0) += 1;
        debug!("Incremented counter {}", name);
    }

    /// Count the outcome of a finished request.
    pub async fn record_result(&self, result: &Result<Comparison, ComparisonError>) {
        let name = match result {
            Ok(Comparison::Success(_)) => SUCCESS_TOTAL,
            Ok(Comparison::NoData { .. }) => NO_DATA_TOTAL,
            Err(ComparisonError::Validation) => VALIDATION_ERRORS_TOTAL,
            Err(ComparisonError::Auth) => AUTH_ERRORS_TOTAL,
            Err(ComparisonError::Query) => QUERY_ERRORS_TOTAL,
        };
        self.increment_counter(name).await;
    }

    pub async fn counter(&self, name: &str) -> u64 {
        self.counters.read().await.get(name).copied().unwrap_or(0)
    }

    pub async fn snapshot(&self) -> HashMap<String, u64> {
        self.counters.read().await.clone()
    }
}
