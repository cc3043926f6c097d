//! Request lifecycle for a caller that submits comparisons one after another.
//!
//! Every submit takes a new sequence number. A finished request is applied to
//! the session only if no newer submit has started since; older results are
//! discarded so a slow response can never overwrite a newer one.

use crate::tracker::comparator::SnapshotComparator;
use crate::tracker::metrics::{TrackerMetrics, STALE_DISCARDED_TOTAL, SUBMITTED_TOTAL};
use crate::tracker::types::{
    Comparison, ComparisonError, ComparisonReport, RequestState, Snapshot, WindowPair,
};
use crate::tracker::window::compute_windows;
use crate::types::{Chain, Timeframe};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// What the presentation layer sees for the latest request.
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    /// Sequence number of the latest submit
    pub sequence: u64,
    pub state: RequestState,
    pub current: Option<Snapshot>,
    pub prior: Option<Snapshot>,
    pub windows: Option<WindowPair>,
    pub error: Option<ComparisonError>,
}

impl SessionView {
    /// The comparison to display, present only in the `Success` state.
    pub fn report(&self) -> Option<ComparisonReport> {
        if self.state != RequestState::Success {
            return None;
        }

        match (&self.current, &self.prior, &self.windows) {
            (Some(current), Some(prior), Some(windows)) => Some(ComparisonReport {
                current: current.clone(),
                prior: prior.clone(),
                windows: windows.clone(),
            }),
            _ => None,
        }
    }

    fn clear_slots(&mut self) {
        self.current = None;
        self.prior = None;
    }
}

/// Handle for an in-flight request.
#[derive(Debug)]
pub struct RequestTicket {
    sequence: u64,
    pub windows: WindowPair,
}

impl RequestTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Result of one submit.
#[derive(Debug, Clone)]
pub struct Submission {
    pub sequence: u64,
    /// False when a newer submit superseded this one before it finished
    pub applied: bool,
    pub result: Result<Comparison, ComparisonError>,
}

/// Tracks the latest comparison request and its state.
pub struct ComparisonSession {
    comparator: SnapshotComparator,
    view: Arc<RwLock<SessionView>>,
    metrics: TrackerMetrics,
}

impl ComparisonSession {
    pub fn new(comparator: SnapshotComparator, metrics: TrackerMetrics) -> Self {
        Self {
            comparator,
            view: Arc::new(RwLock::new(SessionView::default())),
            metrics,
        }
    }

    pub fn metrics(&self) -> &TrackerMetrics {
        &self.metrics
    }

    pub async fn state(&self) -> RequestState {
        self.view.read().await.state
    }

    pub async fn view(&self) -> SessionView {
        self.view.read().await.clone()
    }

    /// Start a new request: clears both snapshot slots and enters `Loading`.
    pub async fn begin(&self, timeframe: Timeframe, now: DateTime<Utc>) -> RequestTicket {
        let windows = compute_windows(timeframe, now);

        let mut view = self.view.write().await;
        view.sequence += 1;
        view.state = RequestState::Loading;
        view.clear_slots();
        view.windows = Some(windows.clone());
        view.error = None;

        RequestTicket {
            sequence: view.sequence,
            windows,
        }
    }

    /// Fail synchronously without starting a fetch. Supersedes any in-flight request.
    async fn reject(&self, error: ComparisonError) -> u64 {
        let mut view = self.view.write().await;
        view.sequence += 1;
        view.state = RequestState::Error;
        view.clear_slots();
        view.windows = None;
        view.error = Some(error);
        view.sequence
    }

    /// Apply a finished request. Returns false if the ticket is stale.
    pub async fn complete(
        &self,
        ticket: RequestTicket,
        result: &Result<Comparison, ComparisonError>,
    ) -> bool {
        {
            let mut view = self.view.write().await;
            if ticket.sequence != view.sequence {
                debug!(
                    "Discarding response for request {} (latest is {})",
                    ticket.sequence, view.sequence
                );
                drop(view);
                self.metrics.increment_counter(STALE_DISCARDED_TOTAL).await;
                return false;
            }

            match result {
                Ok(Comparison::Success(report)) => {
                    view.state = RequestState::Success;
                    view.current = Some(report.current.clone());
                    view.prior = Some(report.prior.clone());
                }
                Ok(Comparison::NoData { .. }) => {
                    view.state = RequestState::NoData;
                    view.clear_slots();
                }
                Err(error) => {
                    view.state = RequestState::Error;
                    view.clear_slots();
                    view.error = Some(*error);
                }
            }
        }

        self.metrics.record_result(result).await;
        true
    }

    /// Run a full request for the given inputs.
    #[instrument(skip(self, chain, timeframe, now), fields(chain = %chain, timeframe = %timeframe))]
    pub async fn submit(
        &self,
        contract_address: &str,
        chain: Chain,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Submission {
        self.metrics.increment_counter(SUBMITTED_TOTAL).await;

        if contract_address.trim().is_empty() {
            let error = ComparisonError::Validation;
            let sequence = self.reject(error).await;
            self.metrics.record_result(&Err(error)).await;
            return Submission {
                sequence,
                applied: true,
                result: Err(error),
            };
        }

        let ticket = self.begin(timeframe, now).await;
        let sequence = ticket.sequence;
        info!("Submitted request {}", sequence);

        let result = self
            .comparator
            .fetch_comparison(contract_address, chain, &ticket.windows)
            .await;
        let applied = self.complete(ticket, &result).await;

        Submission {
            sequence,
            applied,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::data_sources::{SnapshotQuery, SnapshotSource};
    use crate::tracker::metrics::{NO_DATA_TOTAL, SUCCESS_TOTAL, VALIDATION_ERRORS_TOTAL};
    use crate::tracker::types::FetchError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;

    struct FixedSource {
        total_sales: u64,
    }

    #[async_trait]
    impl SnapshotSource for FixedSource {
        async fn fetch_snapshot(&self, _query: &SnapshotQuery) -> Result<Snapshot, FetchError> {
            Snapshot::from_json(&json!({ "total_sales": self.total_sales }))
        }
    }

    fn create_session(total_sales: u64) -> ComparisonSession {
        let comparator = SnapshotComparator::new(Arc::new(FixedSource { total_sales }));
        ComparisonSession::new(comparator, TrackerMetrics::new())
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 9, 9, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_initial_state_is_idle() {
        let session = create_session(1);
        let view = session.view().await;

        assert_eq!(view.state, RequestState::Idle);
        assert_eq!(view.sequence, 0);
        assert!(view.report().is_none());
    }

    #[tokio::test]
    async fn test_begin_clears_slots() {
        let session = create_session(5);
        session
            .submit("0xabc", Chain::EthMain, Timeframe::OneDay, fixed_now())
            .await;
        assert!(session.view().await.current.is_some());

        let ticket = session.begin(Timeframe::SevenDays, fixed_now()).await;
        let view = session.view().await;

        assert_eq!(view.state, RequestState::Loading);
        assert!(view.current.is_none());
        assert!(view.prior.is_none());
        assert_eq!(ticket.sequence(), 2);
    }

    #[tokio::test]
    async fn test_success_then_validation_error() {
        let session = create_session(5);

        let submission = session
            .submit("0xabc", Chain::EthMain, Timeframe::SevenDays, fixed_now())
            .await;
        assert!(submission.applied);
        assert_eq!(session.state().await, RequestState::Success);
        assert_eq!(session.view().await.report().unwrap().day_count(), 7);

        let submission = session
            .submit("  ", Chain::EthMain, Timeframe::SevenDays, fixed_now())
            .await;
        assert_eq!(submission.result, Err(ComparisonError::Validation));

        let view = session.view().await;
        assert_eq!(view.state, RequestState::Error);
        assert_eq!(view.error, Some(ComparisonError::Validation));
        assert!(view.current.is_none() && view.prior.is_none());

        assert_eq!(session.metrics().counter(SUCCESS_TOTAL).await, 1);
        assert_eq!(session.metrics().counter(VALIDATION_ERRORS_TOTAL).await, 1);
    }

    #[tokio::test]
    async fn test_no_data_state() {
        let session = create_session(0);

        session
            .submit("0xabc", Chain::PolyMain, Timeframe::ThirtyDays, fixed_now())
            .await;

        let view = session.view().await;
        assert_eq!(view.state, RequestState::NoData);
        assert!(view.report().is_none());
        assert_eq!(session.metrics().counter(NO_DATA_TOTAL).await, 1);
    }

    #[tokio::test]
    async fn test_stale_ticket_is_discarded() {
        let session = create_session(5);

        let first = session.begin(Timeframe::OneDay, fixed_now()).await;
        let second = session.begin(Timeframe::OneDay, fixed_now()).await;

        assert!(session.complete(second, &Err(ComparisonError::Query)).await);
        assert!(!session.complete(first, &Err(ComparisonError::Auth)).await);

        let view = session.view().await;
        assert_eq!(view.error, Some(ComparisonError::Query));
        assert_eq!(session.metrics().counter(STALE_DISCARDED_TOTAL).await, 1);
    }
}
