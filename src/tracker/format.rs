//! Value formatting and percentage-change arithmetic.

use crate::tracker::types::{MetricValue, PercentChange};

/// Parse a numeric-looking string.
///
/// Surrounding whitespace is ignored. Empty strings and non-finite readings
/// (`NaN`, `inf`) are not numeric.
pub fn parse_numeric_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Magnitude from which every `f64` is a whole number.
const WHOLE_NUMBER_LIMIT: f64 = 4_503_599_627_370_496.0;

/// Round to two decimal places, half away from zero. Negative zero becomes zero.
///
/// Values too large to carry a fractional cent are returned as they are.
pub(crate) fn round_to_cents(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() || scaled.abs() >= WHOLE_NUMBER_LIMIT {
        return value;
    }

    let rounded = scaled.round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Two-decimal text of `value`, rounded from its exact binary value.
///
/// Exact ties (`0.125`) round away from zero. `-0.00` is written as `0.00`.
pub(crate) fn fixed_two_decimals(value: f64) -> String {
    let eighths = value * 8.0;
    let text = if eighths.abs() < WHOLE_NUMBER_LIMIT
        && eighths.fract() == 0.0
        && (eighths as i64) % 2 != 0
    {
        // value * 200 is an odd integer: a tie between two cents
        let doubled_cents = eighths as i64 as i128 * 25;
        let cents = (doubled_cents + doubled_cents.signum()) / 2;
        let sign = if cents < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, cents.abs() / 100, cents.abs() % 100)
    } else {
        format!("{:.2}", value)
    };

    match text.strip_prefix('-') {
        Some(digits) if digits.bytes().all(|b| b == b'0' || b == b'.') => digits.to_string(),
        _ => text,
    }
}

/// Render a metric value for display.
///
/// Numeric-looking strings get exactly two decimal places; JSON numbers and
/// other strings pass through unchanged.
pub fn format_metric(value: &MetricValue) -> String {
    match value {
        MetricValue::Number(number) => number.to_string(),
        MetricValue::Decimal(decimal) => fixed_two_decimals(*decimal),
        MetricValue::Opaque(text) => text.clone(),
        MetricValue::Missing => String::new(),
    }
}

/// Percentage change from `prior` to `current`.
///
/// Returns `None` unless both operands are finite, `prior` is non-zero and
/// the rounded change is itself finite.
pub fn percent_change(prior: f64, current: f64) -> Option<PercentChange> {
    if !prior.is_finite() || !current.is_finite() || prior == 0.0 {
        return None;
    }

    let change = round_to_cents((current / prior - 1.0) * 100.0);
    if !change.is_finite() {
        return None;
    }

    Some(PercentChange(change))
}
