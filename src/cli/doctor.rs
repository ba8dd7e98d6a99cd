//! Doctor command implementation.

use std::path::Path;

use crate::cli::args::OutputFormat;
use crate::cli::print_output;
use crate::core::doctor::DoctorReport;
use crate::core::doctor::checks::{config_failure_report, run_diagnostics};
use crate::error::{FlowError, Result};
use crate::render;
use crate::storage::ResolvedConfig;

/// Execute the doctor command.
///
/// Returns `Ok(false)` when at least one check failed so the caller can exit
/// non-zero for scripting. Warnings alone keep the exit status at zero.
///
/// # Errors
/// Returns an error only if rendering fails.
pub async fn execute(config: &ResolvedConfig) -> Result<bool> {
    let report = run_diagnostics(config).await;
    emit(&report, config.format, config.pretty, config.no_color)
}

/// Report a configuration that could not be resolved.
///
/// # Errors
/// Returns an error only if rendering fails.
pub fn execute_config_failure(
    config_path: &Path,
    error: &FlowError,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<bool> {
    let report = config_failure_report(config_path, error);
    emit(&report, format, pretty, no_color)
}

fn emit(report: &DoctorReport, format: OutputFormat, pretty: bool, no_color: bool) -> Result<bool> {
    let output = render::render_doctor(report, format, pretty, no_color)?;
    print_output(&output);

    let (ready, needs_attention) = report.summary();
    tracing::info!(ready, needs_attention, "Doctor finished");
    Ok(!report.has_failures())
}
