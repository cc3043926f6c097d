//! Query window derivation.

use crate::tracker::types::{QueryWindow, WindowPair};
use crate::types::Timeframe;
use chrono::{DateTime, Duration, Utc};

/// Derive the current and prior snapshot windows for `timeframe`.
///
/// `now` is supplied by the caller so the result is reproducible.
pub fn compute_windows(timeframe: Timeframe, now: DateTime<Utc>) -> WindowPair {
    let day_count = timeframe.day_count();
    let prior_end = now - Duration::days(i64::from(day_count));

    WindowPair {
        timeframe,
        current: QueryWindow { end: now, day_count },
        prior: QueryWindow { end: prior_end, day_count },
        bin_size: timeframe.bin_size(),
    }
}
