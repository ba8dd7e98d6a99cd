//! Test utilities for flowsense.
//!
//! Provides test data factories, an isolated temp directory, and assertion
//! macros shared by unit and integration tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use flowsense::test_utils::*;
//!
//! let dir = TestDir::new();
//! let store = dir.record_store();
//! let check = store.record_leak_check(make_test_leak_check(100.0, 110.0)).unwrap();
//! ```

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::models::{BillAnalysisInput, ExtractionResult, LeakCheckInput, NewLeakCheck};
use crate::storage::RecordStore;

// =============================================================================
// Test Data Factories
// =============================================================================

/// Parse a `YYYY-MM-DD` literal.
///
/// # Panics
///
/// Panics if the literal is not a valid date.
#[must_use]
pub fn date(literal: &str) -> NaiveDate {
    NaiveDate::parse_from_str(literal, "%Y-%m-%d").expect("valid test date")
}

/// Classify two readings taken with no water in use over the default window.
#[must_use]
pub fn make_test_leak_check(reading_a: f64, reading_b: f64) -> NewLeakCheck {
    NewLeakCheck::assess(LeakCheckInput::new(reading_a, reading_b, true))
}

/// Same as [`make_test_leak_check`] with photos attached.
#[must_use]
pub fn make_test_leak_check_with_photos(reading_a: f64, reading_b: f64) -> NewLeakCheck {
    NewLeakCheck::assess(LeakCheckInput {
        photo_path_a: Some("meter-a.jpg".to_string()),
        photo_path_b: Some("meter-b.jpg".to_string()),
        ..LeakCheckInput::new(reading_a, reading_b, true)
    })
}

/// A January bill with the given usage.
#[must_use]
pub fn make_test_bill_input(usage: f64) -> BillAnalysisInput {
    BillAnalysisInput {
        period_start: date("2024-01-01"),
        period_end: date("2024-01-31"),
        usage,
        amount: usage * 0.015,
        photo_path: None,
    }
}

/// A fully extracted bill.
#[must_use]
pub fn make_test_extraction() -> ExtractionResult {
    ExtractionResult {
        period_start: date("2024-01-01"),
        period_end: date("2024-01-31"),
        usage: 4200.0,
        amount: 61.25,
        confidence: 1.0,
    }
}

// =============================================================================
// Test Directory
// =============================================================================

/// An isolated temporary directory removed on drop.
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Write a file, creating parent directories as needed.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.inner.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }

    /// Path of a database file inside the directory.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.file_path("data/flowsense.sqlite")
    }

    /// Open a migrated record store at [`Self::database_path`].
    ///
    /// # Panics
    ///
    /// Panics if the store cannot be opened.
    #[must_use]
    pub fn record_store(&self) -> RecordStore {
        RecordStore::open(&self.database_path()).expect("Failed to open record store")
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string does NOT contain a substring.
#[macro_export]
macro_rules! assert_not_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            !haystack.contains(needle),
            "Expected string NOT to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert two floats are equal within an epsilon (default `1e-9`).
#[macro_export]
macro_rules! assert_float_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_float_eq!($left, $right, 1e-9)
    };
    ($left:expr, $right:expr, $epsilon:expr) => {
        let left: f64 = $left;
        let right: f64 = $right;
        let epsilon: f64 = $epsilon;
        assert!(
            (left - right).abs() < epsilon,
            "Float equality assertion failed: {} != {} (epsilon: {})",
            left,
            right,
            epsilon
        );
    };
}

// =============================================================================
// Test Helpers
// =============================================================================

/// Sample config file enabling OCR and disabling vision.
#[must_use]
pub fn make_test_config_toml() -> String {
    r#"[general]
timeout_seconds = 20

[vision]
enabled = false

[ocr]
enabled = true
binary = "tesseract"
language = "eng"

[output]
format = "human"
color = false
pretty = false
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leak_factory_classifies() {
        let check = make_test_leak_check(100.0, 110.0);
        assert!(check.assessment().leak_detected);
    }

    #[test]
    fn test_dir_store_round_trip() {
        let dir = TestDir::new();
        let store = dir.record_store();
        let record = store.record_bill_analysis(&make_test_bill_input(100.0)).unwrap();
        assert_eq!(store.get_bill_analysis(record.id).unwrap(), record);
        assert!(dir.database_path().exists());
    }

    #[test]
    fn config_fixture_parses() {
        let config: crate::storage::Config = toml::from_str(&make_test_config_toml()).unwrap();
        assert!(!config.vision.enabled);
        assert_eq!(config.general.timeout_seconds, 20);
        assert_contains!(make_test_config_toml(), "[ocr]");
    }
}
