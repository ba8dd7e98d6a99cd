//! Robot-mode output (JSON and Markdown).
//!
//! JSON wraps command data in the [`RobotOutput`] envelope; Markdown is a
//! compact key/value rendering meant for agents and notes.

use serde::Serialize;

use crate::core::models::{BillAnalysisRecord, GuardianStatus, LeakCheckRecord, RobotOutput};
use crate::core::pipeline::ExtractionOutcome;
use crate::error::Result;

/// Render command data as an enveloped JSON document.
pub fn render_json<T: Serialize>(command: &str, data: &T, pretty: bool) -> Result<String> {
    render_json_with_errors(command, data, Vec::new(), pretty)
}

/// Same as [`render_json`], listing non-fatal errors in the envelope.
pub fn render_json_with_errors<T: Serialize>(
    command: &str,
    data: &T,
    errors: Vec<String>,
    pretty: bool,
) -> Result<String> {
    let output = RobotOutput::new(command, data).with_errors(errors);
    let json = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    Ok(json)
}

fn optional(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// Render one leak check as Markdown.
#[must_use]
pub fn render_leak_check_md(record: &LeakCheckRecord) -> String {
    format!(
        "## Leak check {}\n\
         - created_at: {}\n\
         - reading_a: {}\n\
         - reading_b: {}\n\
         - delta: {}\n\
         - duration_minutes: {}\n\
         - no_water_used: {}\n\
         - leak_detected: {}\n\
         - confidence: {}\n\
         - photo_path_a: {}\n\
         - photo_path_b: {}\n",
        record.id,
        record.created_at.to_rfc3339(),
        record.reading_a,
        record.reading_b,
        record.delta,
        record.duration_minutes,
        record.no_water_used,
        record.leak_detected,
        record.confidence,
        optional(record.photo_path_a.as_deref()),
        optional(record.photo_path_b.as_deref()),
    )
}

/// Render leak checks as a Markdown table.
#[must_use]
pub fn render_leak_checks_md(records: &[LeakCheckRecord]) -> String {
    let mut output = String::from(
        "| id | created_at | delta | leak_detected | confidence |\n\
         |----|------------|-------|---------------|------------|\n",
    );
    for record in records {
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            record.id,
            record.created_at.to_rfc3339(),
            record.delta,
            record.leak_detected,
            record.confidence
        ));
    }
    output
}

/// Render one bill analysis as Markdown.
#[must_use]
pub fn render_bill_md(record: &BillAnalysisRecord) -> String {
    format!(
        "## Bill analysis {}\n\
         - created_at: {}\n\
         - period_start: {}\n\
         - period_end: {}\n\
         - usage: {}\n\
         - amount: {:.2}\n\
         - photo_path: {}\n",
        record.id,
        record.created_at.to_rfc3339(),
        record.period_start,
        record.period_end,
        record.usage,
        record.amount,
        optional(record.photo_path.as_deref()),
    )
}

/// Render bill analyses as a Markdown table.
#[must_use]
pub fn render_bills_md(records: &[BillAnalysisRecord]) -> String {
    let mut output = String::from(
        "| id | period_start | period_end | usage | amount |\n\
         |----|--------------|------------|-------|--------|\n",
    );
    for record in records {
        output.push_str(&format!(
            "| {} | {} | {} | {} | {:.2} |\n",
            record.id, record.period_start, record.period_end, record.usage, record.amount
        ));
    }
    output
}

/// Render a bill scan as Markdown.
#[must_use]
pub fn render_scan_md(outcome: &ExtractionOutcome, record: Option<&BillAnalysisRecord>) -> String {
    let result = &outcome.result;
    let mut output = format!(
        "## Bill scan\n\
         - strategy: {}\n\
         - duration_ms: {}\n\
         - period_start: {}\n\
         - period_end: {}\n\
         - usage: {}\n\
         - amount: {:.2}\n\
         - confidence: {:.2}\n",
        outcome.strategy,
        outcome.duration_ms,
        result.period_start,
        result.period_end,
        result.usage,
        result.amount,
        result.confidence,
    );
    if let Some(error) = &outcome.error {
        output.push_str(&format!("- error: {error}\n"));
    }
    match record {
        Some(record) => output.push_str(&format!("- saved_id: {}\n", record.id)),
        None => output.push_str("- saved_id: -\n"),
    }
    output
}

/// Render the guardian status as Markdown.
#[must_use]
pub fn render_status_md(status: &GuardianStatus) -> String {
    format!(
        "## Guardian status\n\
         - status: {}\n\
         - message: {}\n\
         - last_check: {}\n\
         - recent_leaks: {}\n\
         - total_checks_30d: {}\n",
        status.status,
        status.message,
        status
            .last_check
            .map_or_else(|| "-".to_string(), |at| at.to_rfc3339()),
        status.recent_leaks,
        status.total_checks_30d,
    )
}
