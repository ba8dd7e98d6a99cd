//! OCR bill extraction.
//!
//! An [`OcrEngine`] turns an image into plain text; [`extract_from_text`]
//! pulls the bill fields out of that text with the regex parsers.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::NaiveDate;

use super::models::ExtractionResult;
use super::parsers;
use super::period::previous_month;
use crate::error::{FlowError, Result};

pub const DEFAULT_BINARY: &str = "tesseract";
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Fields the OCR strategy looks for: date, usage, amount, and the date again
/// standing in for the second boundary.
const FIELD_COUNT: f64 = 4.0;

/// Image-to-text engine.
///
/// Implementations are blocking; the pipeline runs them on the blocking
/// thread pool.
pub trait OcrEngine: Send + Sync {
    /// Short name for logs and diagnostics.
    fn name(&self) -> &str;

    /// Whether the engine can run on this machine.
    fn is_available(&self) -> bool;

    /// Extract raw text from an image.
    ///
    /// # Errors
    ///
    /// Returns error when the engine is missing or fails on the image.
    fn extract_text(&self, image: &Path) -> Result<String>;
}

/// OCR through the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: String,
    language: String,
}

impl TesseractEngine {
    #[must_use]
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    /// Resolved path of the binary, if it is on `PATH`.
    #[must_use]
    pub fn binary_path(&self) -> Option<PathBuf> {
        which::which(&self.binary).ok()
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY, DEFAULT_LANGUAGE)
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        &self.binary
    }

    fn is_available(&self) -> bool {
        self.binary_path().is_some()
    }

    fn extract_text(&self, image: &Path) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .args(["-l", &self.language])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => Err(FlowError::OcrFailed(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FlowError::OcrUnavailable(format!("{} not found", self.binary)))
            }
            Err(e) => Err(FlowError::Io(e)),
        }
    }
}

/// Pull bill fields out of OCR text.
///
/// One date is searched for and used as both period boundaries. Confidence is
/// the share of the four fields that were found; unfound fields take the
/// usual defaults.
#[must_use]
pub fn extract_from_text(text: &str, today: NaiveDate) -> ExtractionResult {
    let date = parsers::parse_date(text);
    let usage = parsers::parse_usage(text);
    let amount = parsers::parse_amount(text);

    // the single date counts once per boundary
    let found = [date.is_some(), date.is_some(), usage.is_some(), amount.is_some()]
        .iter()
        .filter(|hit| **hit)
        .count();

    let (default_start, default_end) = previous_month(today);

    tracing::debug!(
        date = ?date,
        usage = ?usage,
        amount = ?amount,
        found,
        "Parsed OCR text"
    );

    #[allow(clippy::cast_precision_loss)]
    let confidence = found as f64 / FIELD_COUNT;

    ExtractionResult {
        period_start: date.unwrap_or(default_start),
        period_end: date.unwrap_or(default_end),
        usage: usage.unwrap_or(0.0),
        amount: amount.unwrap_or(0.0),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn all_fields_found() {
        let text = "CITY WATER\nService date 03/15/2024\n1,500 gallons\nAmount due: $45.50";
        let result = extract_from_text(text, date(2024, 7, 1));
        assert_eq!(result.period_start, date(2024, 3, 15));
        assert_eq!(result.period_end, date(2024, 3, 15));
        assert!((result.usage - 1500.0).abs() < f64::EPSILON);
        assert!((result.amount - 45.5).abs() < f64::EPSILON);
        assert!((result.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_date_uses_default_period() {
        let text = "Usage: 900\nTotal 30.00";
        let result = extract_from_text(text, date(2024, 7, 1));
        assert_eq!(result.period_start, date(2024, 6, 1));
        assert_eq!(result.period_end, date(2024, 6, 30));
        assert!((result.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_text_scores_zero() {
        let result = extract_from_text("", date(2024, 1, 10));
        assert_eq!(result.period_start, date(2023, 12, 1));
        assert!(result.usage.abs() < f64::EPSILON);
        assert!(result.confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn missing_binary_is_unavailable() {
        let engine = TesseractEngine::new("flowsense-no-such-ocr-binary", "eng");
        assert!(!engine.is_available());
        let err = engine.extract_text(Path::new("bill.jpg")).unwrap_err();
        assert!(matches!(err, FlowError::OcrUnavailable(_)));
    }
}
