//! Plain-text and JSON rendering of comparison results.

use crate::tracker::types::{Comparison, ComparisonError, ComparisonReport, ComparisonRow};
use crate::types::{BinSize, Chain, Timeframe};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const NO_DATA_MESSAGE: &str = "No sales data found. Verify chain, address, and timeframe.";

/// Shown in the change column when no percentage can be computed.
pub const NO_CHANGE_INDICATOR: &str = "n/a";

/// "1 day" / "7 days".
pub fn day_phrase(day_count: u32) -> String {
    if day_count == 1 {
        "1 day".to_string()
    } else {
        format!("{} days", day_count)
    }
}

/// Change column cell: `+12.50%`, `-3.00%`, `0.00%` or `n/a`.
pub fn change_cell(row: &ComparisonRow) -> String {
    match &row.percent_change {
        Some(change) => format!("{}%", change.signed()),
        None => NO_CHANGE_INDICATOR.to_string(),
    }
}

/// Render the explanatory text and the comparison table.
pub fn render_report(report: &ComparisonReport) -> String {
    let days = day_phrase(report.day_count());
    let mut out = String::new();

    out.push_str(&format!(
        "The current data represents sales data from today back to {} ago.\n",
        days
    ));
    out.push_str(&format!(
        "The data from {} ago is over the same timeframe but starting {} ago.\n\n",
        days, days
    ));

    let header = [
        "Sales Data".to_string(),
        format!("{} ago", days),
        "Today".to_string(),
        "Change".to_string(),
    ];
    let body: Vec<[String; 4]> = report
        .rows()
        .iter()
        .map(|row| {
            [
                row.label.clone(),
                row.prior_formatted.clone(),
                row.current_formatted.clone(),
                change_cell(row),
            ]
        })
        .collect();

    let mut widths = header.clone().map(|cell| cell.chars().count());
    for line in &body {
        for (width, cell) in widths.iter_mut().zip(line.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    out.push_str(&table_line(&header, &widths));
    out.push_str(&table_line(&widths.map(|w| "-".repeat(w)), &widths));
    for line in &body {
        out.push_str(&table_line(line, &widths));
    }

    out
}

fn table_line(cells: &[String; 4], widths: &[usize; 4]) -> String {
    // Label left-aligned, values right-aligned
    let mut line = format!("{:<width$}", cells[0], width = widths[0]);
    for (cell, width) in cells.iter().zip(widths.iter()).skip(1) {
        line.push_str(&format!("  {:>width$}", cell, width = *width));
    }
    line.push('\n');
    line
}

/// Render any outcome as the text a user sees.
pub fn render_outcome(result: &Result<Comparison, ComparisonError>) -> String {
    match result {
        Ok(Comparison::Success(report)) => render_report(report),
        Ok(Comparison::NoData { .. }) => format!("{}\n", NO_DATA_MESSAGE),
        Err(error) => format!("{}\n", error),
    }
}

/// JSON document for a successful comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonSummary {
    pub contract_address: String,
    pub chain: Chain,
    pub timeframe: Timeframe,
    pub bin_size: BinSize,
    pub day_count: u32,
    pub current_end: DateTime<Utc>,
    pub prior_end: DateTime<Utc>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonSummary {
    pub fn new(contract_address: &str, chain: Chain, report: &ComparisonReport) -> Self {
        Self {
            contract_address: contract_address.trim().to_string(),
            chain,
            timeframe: report.windows.timeframe,
            bin_size: report.bin_size(),
            day_count: report.day_count(),
            current_end: report.windows.current.end,
            prior_end: report.windows.prior.end,
            rows: report.rows(),
        }
    }
}

/// JSON document for any outcome, tagged by `status`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeSummary {
    Success(ComparisonSummary),
    NoData { message: String },
    Error { kind: String, message: String },
}

impl OutcomeSummary {
    pub fn new(
        contract_address: &str,
        chain: Chain,
        result: &Result<Comparison, ComparisonError>,
    ) -> Self {
        match result {
            Ok(Comparison::Success(report)) => {
                OutcomeSummary::Success(ComparisonSummary::new(contract_address, chain, report))
            }
            Ok(Comparison::NoData { .. }) => OutcomeSummary::NoData {
                message: NO_DATA_MESSAGE.to_string(),
            },
            Err(error) => {
                let kind = match error {
                    ComparisonError::Validation => "validation",
                    ComparisonError::Auth => "auth",
                    ComparisonError::Query => "query",
                };
                OutcomeSummary::Error {
                    kind: kind.to_string(),
                    message: error.to_string(),
                }
            }
        }
    }
}
