//! Setup checks for the doctor command.
//!
//! Covers the config file, the record database, and both extraction
//! strategies. Nothing here calls the vision API.

use std::path::Path;
use std::time::{Duration, Instant};

use tokio::process::Command;

use super::{CheckStatus, DiagnosticCheck, DoctorReport};
use crate::core::pipeline::{ExtractionConfig, ExtractionPipeline};
use crate::error::FlowError;
use crate::storage::config::{Config, DEFAULT_API_KEY_ENV, ResolvedConfig};
use crate::storage::records::RecordStore;

/// Timeout for the OCR binary version probe.
const VERSION_TIMEOUT: Duration = Duration::from_secs(3);

/// Run every check against a resolved configuration.
pub async fn run_diagnostics(resolved: &ResolvedConfig) -> DoctorReport {
    let start = Instant::now();
    tracing::debug!(config = %resolved.config_path.display(), "Starting doctor checks");

    let strategy = ExtractionPipeline::from_config(&resolved.extraction)
        .strategy()
        .label();

    let checks = vec![
        check_config(&resolved.config_path),
        check_database(&resolved.database_path),
        check_vision(&resolved.extraction),
        check_ocr(&resolved.extraction).await,
    ];

    DoctorReport {
        flowsense_version: env!("CARGO_PKG_VERSION").to_string(),
        config_path: resolved.config_path.display().to_string(),
        database_path: Some(resolved.database_path.display().to_string()),
        extraction_strategy: strategy.to_string(),
        checks,
        total_duration: start.elapsed(),
    }
}

/// Report for a configuration that failed to resolve.
///
/// The remaining checks depend on resolved settings, so only the config
/// check is reported.
#[must_use]
pub fn config_failure_report(config_path: &Path, error: &FlowError) -> DoctorReport {
    DoctorReport {
        flowsense_version: env!("CARGO_PKG_VERSION").to_string(),
        config_path: config_path.display().to_string(),
        database_path: None,
        extraction_strategy: "none".to_string(),
        checks: vec![DiagnosticCheck::new(
            "Config",
            CheckStatus::Fail {
                reason: error.to_string(),
                suggestion: error.hint(),
            },
        )],
        total_duration: Duration::ZERO,
    }
}

/// Check that the config file is absent or loads and validates.
#[must_use]
pub fn check_config(path: &Path) -> DiagnosticCheck {
    let start = Instant::now();

    let status = match Config::load_from(path).and_then(|config| config.validate()) {
        Ok(()) if path.exists() => CheckStatus::Pass {
            details: Some(path.display().to_string()),
        },
        Ok(()) => CheckStatus::Pass {
            details: Some("Using defaults".to_string()),
        },
        Err(e) => CheckStatus::Fail {
            reason: e.to_string(),
            suggestion: e
                .hint()
                .or_else(|| Some(format!("Check {}", path.display()))),
        },
    };

    DiagnosticCheck::new("Config", status).with_duration(start.elapsed())
}

/// Check that the record database opens and migrates.
#[must_use]
pub fn check_database(path: &Path) -> DiagnosticCheck {
    let start = Instant::now();

    let status = match RecordStore::open(path).and_then(|store| store.counts()) {
        Ok((checks, bills)) => CheckStatus::Pass {
            details: Some(format!(
                "{} ({checks} leak checks, {bills} bill analyses)",
                path.display()
            )),
        },
        Err(e) => CheckStatus::Fail {
            reason: e.to_string(),
            suggestion: Some("Pass --db or set FLOWSENSE_DB to a writable path".to_string()),
        },
    };

    DiagnosticCheck::new("Database", status).with_duration(start.elapsed())
}

/// Check whether vision extraction is configured.
#[must_use]
pub fn check_vision(config: &ExtractionConfig) -> DiagnosticCheck {
    let status = if !config.vision_enabled {
        CheckStatus::Skipped {
            reason: "Disabled in config".to_string(),
        }
    } else if config
        .api_key
        .as_deref()
        .is_some_and(|key| !key.trim().is_empty())
    {
        CheckStatus::Pass {
            details: Some(format!("{} via {}", config.model, config.base_url)),
        }
    } else {
        CheckStatus::Warning {
            details: "API key not set".to_string(),
            suggestion: Some(format!(
                "Set {DEFAULT_API_KEY_ENV} (or the variable named by vision.api_key_env)"
            )),
        }
    };

    DiagnosticCheck::new("Vision extraction", status)
}

/// Check whether the OCR binary is installed and report its version.
pub async fn check_ocr(config: &ExtractionConfig) -> DiagnosticCheck {
    let start = Instant::now();
    let name = format!("OCR ({})", config.ocr_binary);

    if !config.ocr_enabled {
        return DiagnosticCheck::new(
            name,
            CheckStatus::Skipped {
                reason: "Disabled in config".to_string(),
            },
        );
    }

    let status = match which::which(&config.ocr_binary) {
        Ok(path) => {
            let details = match ocr_version(&config.ocr_binary).await {
                Some(version) => format!("{}, version {version}", path.display()),
                None => path.display().to_string(),
            };
            CheckStatus::Pass {
                details: Some(details),
            }
        }
        Err(_) => CheckStatus::Warning {
            details: "Binary not found in PATH".to_string(),
            suggestion: Some(
                "Install tesseract (e.g. `apt install tesseract-ocr` or `brew install tesseract`)"
                    .to_string(),
            ),
        },
    };

    DiagnosticCheck::new(name, status).with_duration(start.elapsed())
}

async fn ocr_version(binary: &str) -> Option<String> {
    let output = tokio::time::timeout(
        VERSION_TIMEOUT,
        Command::new(binary).arg("--version").output(),
    )
    .await
    .ok()?
    .ok()?;

    // older tesseract builds print the version on stderr
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    extract_version(&combined)
}

/// First whitespace-separated token that looks like a version number.
fn extract_version(output: &str) -> Option<String> {
    output
        .lines()
        .flat_map(str::split_whitespace)
        .map(|word| word.trim_start_matches('v'))
        .find(|word| {
            word.starts_with(|c: char| c.is_ascii_digit())
                && word.contains('.')
                && word
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+'))
        })
        .map(str::to_string)
}
