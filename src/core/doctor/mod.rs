//! Doctor command diagnostic framework.
//!
//! Defines the data structures for setup checks and the report the doctor
//! command renders.

pub mod checks;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Result of a single diagnostic check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckStatus {
    /// Check passed with optional details.
    Pass { details: Option<String> },
    /// Works, but with reduced capability (e.g. no vision key).
    Warning {
        details: String,
        suggestion: Option<String>,
    },
    /// Check failed with reason and optional fix suggestion.
    Fail {
        reason: String,
        suggestion: Option<String>,
    },
    /// Check was skipped (e.g. feature disabled in config).
    Skipped { reason: String },
}

impl CheckStatus {
    /// Whether this status indicates the component is usable.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(
            self,
            Self::Pass { .. } | Self::Warning { .. } | Self::Skipped { .. }
        )
    }

    /// Whether this status requires attention (warning or worse).
    #[must_use]
    pub const fn needs_attention(&self) -> bool {
        matches!(self, Self::Warning { .. } | Self::Fail { .. })
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass { details } => {
                if let Some(details) = details {
                    write!(f, "pass ({details})")
                } else {
                    write!(f, "pass")
                }
            }
            Self::Warning {
                details,
                suggestion,
            } => {
                if let Some(suggestion) = suggestion {
                    write!(f, "warning: {details} (suggestion: {suggestion})")
                } else {
                    write!(f, "warning: {details}")
                }
            }
            Self::Fail { reason, suggestion } => {
                if let Some(suggestion) = suggestion {
                    write!(f, "fail: {reason} (suggestion: {suggestion})")
                } else {
                    write!(f, "fail: {reason}")
                }
            }
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

/// A single diagnostic check result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticCheck {
    pub name: String,
    pub status: CheckStatus,
    pub duration: Option<Duration>,
}

impl DiagnosticCheck {
    #[must_use]
    pub fn new(name: impl Into<String>, status: CheckStatus) -> Self {
        Self {
            name: name.into(),
            status,
            duration: None,
        }
    }

    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Complete diagnostic report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorReport {
    pub flowsense_version: String,
    pub config_path: String,
    /// Absent when the configuration could not be resolved.
    pub database_path: Option<String>,
    /// Extraction strategy a bill scan would use: vision, ocr, or none.
    pub extraction_strategy: String,
    pub checks: Vec<DiagnosticCheck>,
    pub total_duration: Duration,
}

impl DoctorReport {
    /// Returns (`ready_count`, `needs_attention_count`).
    ///
    /// Warnings count as both ready and needing attention.
    #[must_use]
    pub fn summary(&self) -> (usize, usize) {
        let ready = self.checks.iter().filter(|c| c.status.is_ready()).count();
        let attention = self
            .checks
            .iter()
            .filter(|c| c.status.needs_attention())
            .count();
        (ready, attention)
    }

    /// Whether any check failed outright.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.checks.iter().any(|c| c.status.is_failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(checks: Vec<DiagnosticCheck>) -> DoctorReport {
        DoctorReport {
            flowsense_version: "0.1.0".to_string(),
            config_path: "/tmp/config.toml".to_string(),
            database_path: Some("/tmp/flowsense.sqlite".to_string()),
            extraction_strategy: "none".to_string(),
            checks,
            total_duration: Duration::from_millis(12),
        }
    }

    #[test]
    fn check_status_display_formats() {
        let pass = CheckStatus::Pass { details: None };
        let fail = CheckStatus::Fail {
            reason: "database locked".to_string(),
            suggestion: Some("close other flowsense processes".to_string()),
        };
        let skipped = CheckStatus::Skipped {
            reason: "disabled in config".to_string(),
        };

        assert_eq!(pass.to_string(), "pass");
        assert!(fail.to_string().contains("database locked"));
        assert!(fail.to_string().contains("suggestion"));
        assert!(skipped.to_string().contains("disabled in config"));
    }

    #[test]
    fn doctor_report_summary_counts() {
        let ok = DiagnosticCheck::new("Config", CheckStatus::Pass { details: None });
        let warn = DiagnosticCheck::new(
            "Vision",
            CheckStatus::Warning {
                details: "no key".to_string(),
                suggestion: None,
            },
        );
        let bad = DiagnosticCheck::new(
            "Database",
            CheckStatus::Fail {
                reason: "nope".to_string(),
                suggestion: None,
            },
        );

        let report = report(vec![ok, warn, bad]);
        assert_eq!(report.summary(), (2, 2));
        assert!(report.has_failures());
    }

    #[test]
    fn doctor_report_serializes_to_json() {
        let ok = DiagnosticCheck::new("Config", CheckStatus::Pass { details: None });
        let json = serde_json::to_value(report(vec![ok])).unwrap();
        assert_eq!(json["flowsenseVersion"], "0.1.0");
        assert_eq!(json["extractionStrategy"], "none");
        assert_eq!(json["checks"][0]["status"]["status"], "pass");
    }
}
