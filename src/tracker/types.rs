//! Core types and data structures for the comparison engine.

use crate::tracker::format::{format_metric, parse_numeric_text, percent_change};
use crate::types::{BinSize, Timeframe};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Default Blockspan API host.
pub const DEFAULT_BASE_URL: &str = "https://api.blockspan.com";

/// One point-in-time snapshot query.
///
/// `day_count` is carried for display only; the API is queried for a single
/// end-timestamp, not a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWindow {
    pub end: DateTime<Utc>,
    pub day_count: u32,
}

/// The two windows derived for one comparison request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPair {
    pub timeframe: Timeframe,
    pub current: QueryWindow,
    pub prior: QueryWindow,
    pub bin_size: BinSize,
}

impl WindowPair {
    pub fn day_count(&self) -> u32 {
        self.current.day_count
    }
}

/// Sales metrics reported by the analytics API, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    TotalSales,
    TotalUniqueTokens,
    AvgPriceUsd,
    MaxPriceUsd,
    TotalSalesVolumeUsd,
}

impl MetricKey {
    /// Field name in the API payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::TotalSales => "total_sales",
            MetricKey::TotalUniqueTokens => "total_unique_tokens",
            MetricKey::AvgPriceUsd => "avg_price_usd",
            MetricKey::MaxPriceUsd => "max_price_usd",
            MetricKey::TotalSalesVolumeUsd => "total_sales_volume_usd",
        }
    }

    /// Human-readable row label.
    pub fn label(&self) -> &'static str {
        match self {
            MetricKey::TotalSales => "Total Sales",
            MetricKey::TotalUniqueTokens => "Unique Tokens",
            MetricKey::AvgPriceUsd => "Average Price (USD)",
            MetricKey::MaxPriceUsd => "Max Price (USD)",
            MetricKey::TotalSalesVolumeUsd => "Total Sales Volume (USD)",
        }
    }

    pub fn all() -> [MetricKey; 5] {
        [
            MetricKey::TotalSales,
            MetricKey::TotalUniqueTokens,
            MetricKey::AvgPriceUsd,
            MetricKey::MaxPriceUsd,
            MetricKey::TotalSalesVolumeUsd,
        ]
    }
}

/// A single metric value, classified once when the payload is parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MetricValue {
    /// JSON number; displayed exactly as received.
    Number(serde_json::Number),
    /// Numeric-looking string; displayed with two decimals.
    Decimal(f64),
    /// Anything else; displayed unchanged.
    Opaque(String),
    /// Absent or null.
    Missing,
}

impl MetricValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => MetricValue::Missing,
            Value::Number(number) => MetricValue::Number(number.clone()),
            Value::String(text) => match parse_numeric_text(text) {
                Some(parsed) => MetricValue::Decimal(parsed),
                None => MetricValue::Opaque(text.clone()),
            },
            other => MetricValue::Opaque(other.to_string()),
        }
    }

    /// Numeric reading used for percentage arithmetic.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(number) => number.as_f64().filter(|v| v.is_finite()),
            MetricValue::Decimal(value) => Some(*value),
            MetricValue::Opaque(_) | MetricValue::Missing => None,
        }
    }
}

/// Aggregate sales metrics for one contract at one end-timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    values: BTreeMap<MetricKey, MetricValue>,
}

impl Snapshot {
    /// Build a snapshot from an API response body.
    ///
    /// The body must be a JSON object. Metric keys that are absent are
    /// recorded as `Missing`; unknown keys are ignored.
    pub fn from_json(body: &Value) -> Result<Self, FetchError> {
        let object = body.as_object().ok_or(FetchError::MalformedBody)?;

        let values = MetricKey::all()
            .into_iter()
            .map(|key| {
                let value = object
                    .get(key.as_str())
                    .map(MetricValue::from_json)
                    .unwrap_or(MetricValue::Missing);
                (key, value)
            })
            .collect();

        Ok(Self { values })
    }

    pub fn get(&self, key: MetricKey) -> Option<&MetricValue> {
        self.values.get(&key)
    }

    pub fn numeric(&self, key: MetricKey) -> Option<f64> {
        self.get(key).and_then(MetricValue::as_f64)
    }

    pub fn formatted(&self, key: MetricKey) -> String {
        self.get(key).map(format_metric).unwrap_or_default()
    }

    /// True when the snapshot reports zero sales for the window.
    pub fn reports_no_sales(&self) -> bool {
        self.numeric(MetricKey::TotalSales) == Some(0.0)
    }
}

/// Direction of a percentage change, used for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeDirection {
    Up,
    Down,
    Flat,
}

/// Percentage change between two snapshots, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PercentChange(pub(crate) f64);

impl PercentChange {
    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn direction(&self) -> ChangeDirection {
        if self.0 > 0.0 {
            ChangeDirection::Up
        } else if self.0 < 0.0 {
            ChangeDirection::Down
        } else {
            ChangeDirection::Flat
        }
    }

    /// Display form with a leading `+` on increases.
    pub fn signed(&self) -> String {
        match self.direction() {
            ChangeDirection::Up => format!("+{}", self),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for PercentChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// One line of the comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub metric: MetricKey,
    pub label: String,
    pub prior_formatted: String,
    pub current_formatted: String,
    /// `None` when no change can be computed; not the same as zero.
    pub percent_change: Option<PercentChange>,
}

/// Both snapshots of a successful comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub current: Snapshot,
    pub prior: Snapshot,
    pub windows: WindowPair,
}

impl ComparisonReport {
    /// Derive the five table rows from the snapshots.
    pub fn rows(&self) -> Vec<ComparisonRow> {
        MetricKey::all()
            .into_iter()
            .map(|metric| {
                let change = match (self.prior.numeric(metric), self.current.numeric(metric)) {
                    (Some(prior), Some(current)) => percent_change(prior, current),
                    _ => None,
                };

                ComparisonRow {
                    metric,
                    label: metric.label().to_string(),
                    prior_formatted: self.prior.formatted(metric),
                    current_formatted: self.current.formatted(metric),
                    percent_change: change,
                }
            })
            .collect()
    }

    pub fn day_count(&self) -> u32 {
        self.windows.day_count()
    }

    pub fn bin_size(&self) -> BinSize {
        self.windows.bin_size
    }
}

/// Result of a comparison that reached the API successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Comparison {
    Success(ComparisonReport),
    /// Both snapshots report zero sales. Not an error.
    NoData { windows: WindowPair },
}

/// Caller-facing failure classification. Each variant has exactly one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ComparisonError {
    #[error("Contract address is required.")]
    Validation,
    #[error("Invalid blockspan API key!")]
    Auth,
    #[error("Error: verify chain and contract address are valid")]
    Query,
}

/// Failure of a single snapshot fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("API rejected the credential (401 Unauthorized)")]
    Unauthorized,
    #[error("API responded with HTTP {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("failed to decode response body: {0}")]
    Decode(String),
    #[error("response body is not a JSON object")]
    MalformedBody,
}

impl FetchError {
    pub fn is_auth(&self) -> bool {
        matches!(self, FetchError::Unauthorized)
    }

    pub fn classify(&self) -> ComparisonError {
        if self.is_auth() {
            ComparisonError::Auth
        } else {
            ComparisonError::Query
        }
    }
}

/// Lifecycle of the most recent request in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
    Idle,
    Loading,
    Success,
    Error,
    NoData,
}

impl Default for RequestState {
    fn default() -> Self {
        RequestState::Idle
    }
}

/// Tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Blockspan API key sent as `X-API-KEY`
    pub api_key: Option<String>,
    /// API host, without the endpoint path
    pub base_url: String,
    /// Per-request timeout; the HTTP client default applies when unset
    pub request_timeout_seconds: Option<u64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_seconds: None,
        }
    }
}

impl TrackerConfig {
    /// Load configuration from `BLOCKSPAN_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(api_key) = std::env::var("BLOCKSPAN_API_KEY") {
            config.api_key = Some(api_key);
        }
        if let Ok(base_url) = std::env::var("BLOCKSPAN_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var("BLOCKSPAN_TIMEOUT_SECS") {
            let seconds = timeout
                .trim()
                .parse::<u64>()
                .with_context(|| format!("BLOCKSPAN_TIMEOUT_SECS must be whole seconds, got '{}'", timeout))?;
            config.request_timeout_seconds = Some(seconds);
        }

        Ok(config)
    }
}
