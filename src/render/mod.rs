//! Output rendering for human and robot modes.

pub mod doctor;
pub mod error;
pub mod human;
pub mod robot;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::core::doctor::DoctorReport;
use crate::core::models::{BillAnalysisRecord, GuardianStatus, LeakCheckRecord};
use crate::core::pipeline::ExtractionOutcome;
use crate::error::Result;

/// JSON payload of `bill scan`: the extraction plus the stored record, if any.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport<'a> {
    #[serde(flatten)]
    pub outcome: &'a ExtractionOutcome,
    pub record: Option<&'a BillAnalysisRecord>,
}

/// Render one leak check.
pub fn render_leak_check(
    command: &str,
    record: &LeakCheckRecord,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_leak_check(record, no_color)),
        OutputFormat::Json => robot::render_json(command, record, pretty),
        OutputFormat::Md => Ok(robot::render_leak_check_md(record)),
    }
}

/// Render a leak check listing.
pub fn render_leak_checks(
    records: &[LeakCheckRecord],
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_leak_checks(records, no_color)),
        OutputFormat::Json => robot::render_json("leak list", &records, pretty),
        OutputFormat::Md => Ok(robot::render_leak_checks_md(records)),
    }
}

/// Render one bill analysis.
pub fn render_bill(
    command: &str,
    record: &BillAnalysisRecord,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_bill(record, no_color)),
        OutputFormat::Json => robot::render_json(command, record, pretty),
        OutputFormat::Md => Ok(robot::render_bill_md(record)),
    }
}

/// Render a bill listing.
pub fn render_bills(
    records: &[BillAnalysisRecord],
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_bills(records, no_color)),
        OutputFormat::Json => robot::render_json("bill list", &records, pretty),
        OutputFormat::Md => Ok(robot::render_bills_md(records)),
    }
}

/// Render a bill scan.
pub fn render_scan(
    outcome: &ExtractionOutcome,
    record: Option<&BillAnalysisRecord>,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_scan(outcome, record, no_color)),
        OutputFormat::Json => robot::render_json_with_errors(
            "bill scan",
            &ScanReport { outcome, record },
            outcome.error.iter().cloned().collect(),
            pretty,
        ),
        OutputFormat::Md => Ok(robot::render_scan_md(outcome, record)),
    }
}

/// Render the guardian status.
pub fn render_status(
    status: &GuardianStatus,
    now: DateTime<Utc>,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_status(status, now, no_color)),
        OutputFormat::Json => robot::render_json("status", status, pretty),
        OutputFormat::Md => Ok(robot::render_status_md(status)),
    }
}

/// Render doctor report.
pub fn render_doctor(
    report: &DoctorReport,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(doctor::render_human(report, no_color)),
        OutputFormat::Json => doctor::render_json(report, pretty),
        OutputFormat::Md => Ok(doctor::render_md(report)),
    }
}
