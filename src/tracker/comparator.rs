//! Snapshot comparison.
//!
//! The comparator fetches the current and prior snapshots concurrently and
//! turns the pair into a [`Comparison`], or into exactly one
//! [`ComparisonError`] when either fetch fails.

use crate::tracker::data_sources::{SnapshotQuery, SnapshotSource};
use crate::tracker::types::{Comparison, ComparisonError, ComparisonReport, FetchError, WindowPair};
use crate::tracker::window::compute_windows;
use crate::types::{Chain, Timeframe};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Fetches and compares the two snapshots of a request.
#[derive(Clone)]
pub struct SnapshotComparator {
    source: Arc<dyn SnapshotSource>,
}

impl SnapshotComparator {
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        Self { source }
    }

    /// Derive the windows for `timeframe` at `now` and run the comparison.
    pub async fn compare(
        &self,
        contract_address: &str,
        chain: Chain,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Result<Comparison, ComparisonError> {
        let windows = compute_windows(timeframe, now);
        self.fetch_comparison(contract_address, chain, &windows).await
    }

    /// Fetch both snapshots for `windows` and classify the outcome.
    ///
    /// A blank contract address fails with `Validation` before any request is
    /// made. When either fetch fails, neither snapshot is returned.
    #[instrument(skip(self, windows), fields(timeframe = %windows.timeframe))]
    pub async fn fetch_comparison(
        &self,
        contract_address: &str,
        chain: Chain,
        windows: &WindowPair,
    ) -> Result<Comparison, ComparisonError> {
        let contract_address = contract_address.trim();
        if contract_address.is_empty() {
            warn!("Rejected comparison without a contract address");
            return Err(ComparisonError::Validation);
        }

        let current_query =
            SnapshotQuery::for_window(contract_address, chain, windows, &windows.current);
        let prior_query =
            SnapshotQuery::for_window(contract_address, chain, windows, &windows.prior);

        let (current, prior) = tokio::join!(
            self.source.fetch_snapshot(&current_query),
            self.source.fetch_snapshot(&prior_query),
        );

        let (current, prior) = match (current, prior) {
            (Ok(current), Ok(prior)) => (current, prior),
            (current, prior) => {
                let failures: Vec<FetchError> =
                    [current.err(), prior.err()].into_iter().flatten().collect();
                return Err(classify_failures(&failures));
            }
        };

        if current.reports_no_sales() && prior.reports_no_sales() {
            info!("No sales in either window");
            return Ok(Comparison::NoData {
                windows: windows.clone(),
            });
        }

        info!("Comparison ready ({} day window)", windows.day_count());
        Ok(Comparison::Success(ComparisonReport {
            current,
            prior,
            windows: windows.clone(),
        }))
    }
}

/// Collapse fetch failures into one classification. Auth failures win.
fn classify_failures(failures: &[FetchError]) -> ComparisonError {
    for failure in failures {
        warn!("Snapshot fetch failed: {}", failure);
    }

    failures
        .iter()
        .map(FetchError::classify)
        .find(|error| *error == ComparisonError::Auth)
        .unwrap_or(ComparisonError::Query)
}
