//! Human-readable output with colored badges.

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};

use crate::core::models::{
    BillAnalysisRecord, GuardianStatus, LeakCheckRecord, LeakConfidence, StatusLevel,
};
use crate::core::pipeline::ExtractionOutcome;
use crate::util::format::{
    format_amount, format_delta, format_gallons, format_reading, format_score,
};
use crate::util::time::format_relative_time;

const LABEL_WIDTH: usize = 14;

fn paint(text: &str, no_color: bool, style: impl FnOnce(&str) -> ColoredString) -> String {
    if no_color {
        text.to_string()
    } else {
        style(text).to_string()
    }
}

fn field(label: &str, value: &str) -> String {
    format!("  {label:<LABEL_WIDTH$}{value}\n")
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Badge for a guardian status level.
#[must_use]
pub fn status_badge(level: StatusLevel, no_color: bool) -> String {
    let text = format!("[{}]", level.as_str().to_uppercase());
    match level {
        StatusLevel::Normal => paint(&text, no_color, |t| t.green().bold()),
        StatusLevel::Warning => paint(&text, no_color, |t| t.yellow().bold()),
        StatusLevel::Confirmed => paint(&text, no_color, |t| t.red().bold()),
    }
}

fn confidence_label(confidence: LeakConfidence, no_color: bool) -> String {
    match confidence {
        LeakConfidence::Low => paint(confidence.as_str(), no_color, |t| t.dimmed()),
        LeakConfidence::Medium => paint(confidence.as_str(), no_color, |t| t.yellow()),
        LeakConfidence::High | LeakConfidence::VeryHigh => {
            paint(confidence.as_str(), no_color, |t| t.red().bold())
        }
    }
}

fn verdict(record: &LeakCheckRecord, no_color: bool) -> String {
    if record.leak_detected {
        paint("Leak detected", no_color, |t| t.red().bold())
    } else if record.no_water_used {
        paint("No leak", no_color, |t| t.green())
    } else {
        paint("Inconclusive (water was in use)", no_color, |t| t.dimmed())
    }
}

// =============================================================================
// Leak checks
// =============================================================================

/// Render one leak check in full.
#[must_use]
pub fn render_leak_check(record: &LeakCheckRecord, no_color: bool) -> String {
    let mut output = String::new();

    let title = format!("Leak check #{}", record.id);
    output.push_str(&paint(&title, no_color, |t| t.cyan().bold()));
    output.push_str(&format!("  {}\n", timestamp(record.created_at)));

    output.push_str(&field(
        "Readings",
        &format!(
            "{} -> {}",
            format_reading(record.reading_a),
            format_reading(record.reading_b)
        ),
    ));
    output.push_str(&field(
        "Delta",
        &format!(
            "{} over {} min",
            format_delta(record.delta),
            record.duration_minutes
        ),
    ));
    output.push_str(&field(
        "No water used",
        if record.no_water_used { "yes" } else { "no" },
    ));
    output.push_str(&field("Verdict", &verdict(record, no_color)));
    output.push_str(&field(
        "Confidence",
        &confidence_label(record.confidence, no_color),
    ));

    let photos: Vec<&str> = [&record.photo_path_a, &record.photo_path_b]
        .into_iter()
        .filter_map(Option::as_deref)
        .collect();
    if !photos.is_empty() {
        output.push_str(&field("Photos", &photos.join(", ")));
    }

    output
}

/// Render leak checks as a table, newest first.
#[must_use]
pub fn render_leak_checks(records: &[LeakCheckRecord], no_color: bool) -> String {
    if records.is_empty() {
        return paint("No leak checks recorded yet.\n", no_color, |t| t.dimmed());
    }

    let mut output = String::new();
    let header = format!(
        "{:>5}  {:<20}  {:>10}  {:<5}  {}",
        "ID", "Created", "Delta", "Leak", "Confidence"
    );
    output.push_str(&paint(&header, no_color, |t| t.bold()));
    output.push('\n');

    for record in records {
        let leak = if record.leak_detected { "yes" } else { "no" };
        output.push_str(&format!(
            "{:>5}  {:<20}  {:>10}  {:<5}  {}\n",
            record.id,
            timestamp(record.created_at),
            format_delta(record.delta),
            leak,
            confidence_label(record.confidence, no_color)
        ));
    }

    output
}

// =============================================================================
// Bills
// =============================================================================

/// Render one bill analysis in full.
#[must_use]
pub fn render_bill(record: &BillAnalysisRecord, no_color: bool) -> String {
    let mut output = String::new();

    let title = format!("Bill analysis #{}", record.id);
    output.push_str(&paint(&title, no_color, |t| t.cyan().bold()));
    output.push_str(&format!("  {}\n", timestamp(record.created_at)));

    output.push_str(&field(
        "Period",
        &format!("{} to {}", record.period_start, record.period_end),
    ));
    output.push_str(&field("Usage", &format_gallons(record.usage)));
    output.push_str(&field("Amount", &format_amount(record.amount)));
    if let Some(photo) = &record.photo_path {
        output.push_str(&field("Photo", photo));
    }

    output
}

/// Render bill analyses as a table, newest first.
#[must_use]
pub fn render_bills(records: &[BillAnalysisRecord], no_color: bool) -> String {
    if records.is_empty() {
        return paint("No bills recorded yet.\n", no_color, |t| t.dimmed());
    }

    let mut output = String::new();
    let header = format!(
        "{:>5}  {:<10}  {:<10}  {:>14}  {:>12}",
        "ID", "Start", "End", "Usage", "Amount"
    );
    output.push_str(&paint(&header, no_color, |t| t.bold()));
    output.push('\n');

    for record in records {
        output.push_str(&format!(
            "{:>5}  {:<10}  {:<10}  {:>14}  {:>12}\n",
            record.id,
            record.period_start,
            record.period_end,
            format_gallons(record.usage),
            format_amount(record.amount)
        ));
    }

    output
}

/// Render a bill scan and, when stored, the record id.
#[must_use]
pub fn render_scan(
    outcome: &ExtractionOutcome,
    record: Option<&BillAnalysisRecord>,
    no_color: bool,
) -> String {
    let mut output = String::new();
    let result = &outcome.result;

    output.push_str(&paint("Bill scan", no_color, |t| t.cyan().bold()));
    output.push_str(&format!(
        "  (strategy: {}, {} ms)\n",
        outcome.strategy, outcome.duration_ms
    ));

    output.push_str(&field(
        "Period",
        &format!("{} to {}", result.period_start, result.period_end),
    ));
    output.push_str(&field("Usage", &format_gallons(result.usage)));
    output.push_str(&field("Amount", &format_amount(result.amount)));

    let score = format_score(result.confidence);
    let score = if result.confidence >= 0.7 {
        paint(&score, no_color, |t| t.green())
    } else if result.confidence > 0.0 {
        paint(&score, no_color, |t| t.yellow())
    } else {
        paint(&score, no_color, |t| t.red())
    };
    output.push_str(&field("Confidence", &score));

    if let Some(error) = &outcome.error {
        let line = format!("Extraction failed, showing defaults: {error}");
        output.push_str(&format!("  {}\n", paint(&line, no_color, |t| t.yellow())));
    } else if outcome.used_defaults() {
        output.push_str(&format!(
            "  {}\n",
            paint("Nothing could be read, showing defaults", no_color, |t| t.yellow())
        ));
    }

    match record {
        Some(record) => output.push_str(&format!("  Saved as bill analysis #{}\n", record.id)),
        None => output.push_str(&paint("  Not saved\n", no_color, |t| t.dimmed())),
    }

    output
}

// =============================================================================
// Status
// =============================================================================

/// Render the guardian status.
#[must_use]
pub fn render_status(status: &GuardianStatus, now: DateTime<Utc>, no_color: bool) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Guardian status: {} {}\n",
        status_badge(status.status, no_color),
        status.message
    ));

    let last_check = status.last_check.map_or_else(
        || "never".to_string(),
        |at| format!("{} ({})", format_relative_time(at, now), timestamp(at)),
    );
    output.push_str(&field("Last check", &last_check));
    output.push_str(&field("Recent leaks", &status.recent_leaks.to_string()));
    output.push_str(&field("Checks (30d)", &status.total_checks_30d.to_string()));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    use crate::core::models::{ExtractionResult, LeakCheckInput, NewLeakCheck};

    fn record(a: f64, b: f64, no_water_used: bool) -> LeakCheckRecord {
        NewLeakCheck::assess(LeakCheckInput::new(a, b, no_water_used)).into_record(1, Utc::now())
    }

    #[test]
    fn badge_without_color_is_plain() {
        assert_eq!(status_badge(StatusLevel::Confirmed, true), "[CONFIRMED]");
        assert_eq!(status_badge(StatusLevel::Normal, true), "[NORMAL]");
    }

    #[test]
    fn leak_check_shows_verdict_and_tier() {
        let output = render_leak_check(&record(100.0, 112.0, true), true);
        assert!(output.contains("Leak check #1"));
        assert!(output.contains("100.00 -> 112.00"));
        assert!(output.contains("12.000 over 10 min"));
        assert!(output.contains("Leak detected"));
        assert!(output.contains("Very High"));
        assert!(!output.contains("Photos"));
    }

    #[test]
    fn small_leak_delta_is_not_rounded_to_threshold() {
        let output = render_leak_check(&record(100.0, 100.012, true), true);
        assert!(output.contains("Leak detected"));
        assert!(output.contains("0.012 over"));
    }

    #[test]
    fn water_in_use_is_inconclusive() {
        let output = render_leak_check(&record(100.0, 112.0, false), true);
        assert!(output.contains("Inconclusive"));
        assert!(output.contains("Low"));
    }

    #[test]
    fn empty_lists_say_so() {
        assert!(render_leak_checks(&[], true).contains("No leak checks"));
        assert!(render_bills(&[], true).contains("No bills"));
    }

    #[test]
    fn scan_reports_failure_and_strategy() {
        let outcome = ExtractionOutcome {
            result: ExtractionResult {
                period_start: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                period_end: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
                usage: 0.0,
                amount: 0.0,
                confidence: 0.0,
            },
            strategy: "vision",
            duration_ms: 15,
            error: Some("Vision API error (500): boom".to_string()),
        };
        let output = render_scan(&outcome, None, true);
        assert!(output.contains("strategy: vision"));
        assert!(output.contains("showing defaults"));
        assert!(output.contains("2024-05-01 to 2024-05-31"));
        assert!(output.contains("Not saved"));
    }

    #[test]
    fn status_shows_relative_last_check() {
        let now = Utc::now();
        let status = GuardianStatus {
            status: StatusLevel::Warning,
            message: "Water use looks unusual".to_string(),
            last_check: Some(now - Duration::days(2)),
            recent_leaks: 0,
            total_checks_30d: 3,
        };
        let output = render_status(&status, now, true);
        assert!(output.contains("[WARNING] Water use looks unusual"));
        assert!(output.contains("2 days ago"));
        assert!(output.contains("Checks (30d)"));
    }
}
