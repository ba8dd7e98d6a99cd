//! Doctor command output rendering.

use colored::Colorize;

use crate::core::doctor::{CheckStatus, DiagnosticCheck, DoctorReport};
use crate::error::Result;

// =============================================================================
// Human-Readable Output
// =============================================================================

/// Render a doctor report for human consumption.
#[must_use]
pub fn render_human(report: &DoctorReport, no_color: bool) -> String {
    let mut output = String::new();

    let title = "flowsense doctor";
    if no_color {
        output.push_str(title);
    } else {
        output.push_str(&title.cyan().bold().to_string());
    }
    output.push('\n');
    output.push_str(&"-".repeat(60));
    output.push('\n');

    output.push_str(&format!("  version    {}\n", report.flowsense_version));
    output.push_str(&format!("  config     {}\n", report.config_path));
    if let Some(database) = &report.database_path {
        output.push_str(&format!("  database   {database}\n"));
    }
    output.push_str(&format!("  strategy   {}\n\n", report.extraction_strategy));

    for check in &report.checks {
        output.push_str(&render_check_line(check, no_color));
        output.push('\n');
    }

    output.push_str(&render_summary(report, no_color));
    output
}

fn render_check_line(check: &DiagnosticCheck, no_color: bool) -> String {
    let icon = status_icon(&check.status, no_color);
    let main = colorize(&format!("  {icon} {}", check.name), &check.status, no_color);
    let arrow = if no_color { "->" } else { "\u{2192}" };

    match &check.status {
        CheckStatus::Pass { details } => match details {
            Some(details) => format!("{main}  {details}"),
            None => main,
        },
        CheckStatus::Warning {
            details,
            suggestion,
        } => {
            let mut line = format!("{main}\n      {details}");
            if let Some(suggestion) = suggestion {
                line.push_str(&format!("\n      {arrow} {suggestion}"));
            }
            line
        }
        CheckStatus::Fail { reason, suggestion } => {
            let mut line = format!("{main}\n      {reason}");
            if let Some(suggestion) = suggestion {
                line.push_str(&format!("\n      {arrow} {suggestion}"));
            }
            line
        }
        CheckStatus::Skipped { reason } => format!("{main}  ({reason})"),
    }
}

fn render_summary(report: &DoctorReport, no_color: bool) -> String {
    let (ready, needs_attention) = report.summary();
    #[allow(clippy::cast_precision_loss)]
    let seconds = report.total_duration.as_millis() as f64 / 1000.0;
    let summary = format!("Summary: {ready} ready, {needs_attention} need attention");

    let summary = if no_color {
        summary
    } else if report.has_failures() {
        summary.red().to_string()
    } else if needs_attention > 0 {
        summary.yellow().to_string()
    } else {
        summary.green().to_string()
    };

    format!("{}\n{summary}  [{seconds:.1}s]\n", "-".repeat(60))
}

const fn status_icon(status: &CheckStatus, no_color: bool) -> &'static str {
    match (status, no_color) {
        (CheckStatus::Pass { .. }, true) => "[OK]",
        (CheckStatus::Pass { .. }, false) => "\u{2713}",
        (CheckStatus::Warning { .. } | CheckStatus::Fail { .. }, true) => "[!!]",
        (CheckStatus::Warning { .. }, false) => "\u{26A0}",
        (CheckStatus::Fail { .. }, false) => "\u{2717}",
        (CheckStatus::Skipped { .. }, true) => "[--]",
        (CheckStatus::Skipped { .. }, false) => "\u{23ED}",
    }
}

fn colorize(line: &str, status: &CheckStatus, no_color: bool) -> String {
    if no_color {
        return line.to_string();
    }
    match status {
        CheckStatus::Pass { .. } => line.green().to_string(),
        CheckStatus::Warning { .. } => line.yellow().to_string(),
        CheckStatus::Fail { .. } => line.red().to_string(),
        CheckStatus::Skipped { .. } => line.bright_black().to_string(),
    }
}

// =============================================================================
// Markdown Output
// =============================================================================

/// Render a doctor report as Markdown.
#[must_use]
pub fn render_md(report: &DoctorReport) -> String {
    let mut output = String::from("# flowsense doctor\n\n");

    output.push_str(&format!("- version: {}\n", report.flowsense_version));
    output.push_str(&format!("- config: {}\n", report.config_path));
    output.push_str(&format!(
        "- database: {}\n",
        report.database_path.as_deref().unwrap_or("-")
    ));
    output.push_str(&format!(
        "- extraction_strategy: {}\n\n",
        report.extraction_strategy
    ));

    output.push_str("| Check | Status |\n|-------|--------|\n");
    for check in &report.checks {
        output.push_str(&format!("| {} | {} |\n", check.name, check.status));
    }

    let (ready, needs_attention) = report.summary();
    output.push_str(&format!(
        "\n- **Ready:** {ready}\n- **Needs attention:** {needs_attention}\n"
    ));
    output
}

/// Render a doctor report as enveloped JSON.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn render_json(report: &DoctorReport, pretty: bool) -> Result<String> {
    super::robot::render_json("doctor", report, pretty)
}
