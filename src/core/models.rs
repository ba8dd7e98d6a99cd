//! Core data models.
//!
//! Leak checks and bill analyses are append-only records; extraction results
//! and guardian status are recomputed on demand and never stored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::leak::{self, LeakAssessment};

/// Default observation window for a leak check.
pub const DEFAULT_DURATION_MINUTES: i64 = 10;

// =============================================================================
// Leak Confidence
// =============================================================================

/// Categorical trust level of a leak check.
///
/// Ordered from least to most confident so tiers can be compared directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LeakConfidence {
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl LeakConfidence {
    /// Label used in storage and output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }

    /// Parse a stored label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            "Very High" => Some(Self::VeryHigh),
            _ => None,
        }
    }

    /// Whether a detected leak at this tier counts as confirmed.
    #[must_use]
    pub const fn is_confirming(self) -> bool {
        matches!(self, Self::High | Self::VeryHigh)
    }
}

impl std::fmt::Display for LeakConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Leak Checks
// =============================================================================

/// Raw caller input for a leak check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakCheckInput {
    pub reading_a: f64,
    pub reading_b: f64,
    pub no_water_used: bool,
    #[serde(default = "default_duration")]
    pub duration_minutes: i64,
    #[serde(default)]
    pub photo_path_a: Option<String>,
    #[serde(default)]
    pub photo_path_b: Option<String>,
}

const fn default_duration() -> i64 {
    DEFAULT_DURATION_MINUTES
}

impl LeakCheckInput {
    /// Create an input with the default duration and no photos.
    #[must_use]
    pub const fn new(reading_a: f64, reading_b: f64, no_water_used: bool) -> Self {
        Self {
            reading_a,
            reading_b,
            no_water_used,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            photo_path_a: None,
            photo_path_b: None,
        }
    }

    /// Set the observation window.
    #[must_use]
    pub const fn with_duration(mut self, minutes: i64) -> Self {
        self.duration_minutes = minutes;
        self
    }
}

/// A classified leak check waiting to be stored.
///
/// The derived fields are private: the only way to obtain them is
/// [`NewLeakCheck::assess`], which runs the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeakCheck {
    input: LeakCheckInput,
    assessment: LeakAssessment,
}

impl NewLeakCheck {
    /// Classify the input.
    #[must_use]
    pub fn assess(input: LeakCheckInput) -> Self {
        let assessment = leak::classify(
            input.reading_a,
            input.reading_b,
            input.no_water_used,
            input.duration_minutes,
        );
        Self { input, assessment }
    }

    #[must_use]
    pub const fn input(&self) -> &LeakCheckInput {
        &self.input
    }

    #[must_use]
    pub const fn assessment(&self) -> &LeakAssessment {
        &self.assessment
    }

    /// Attach the identity the record store assigned.
    #[must_use]
    pub fn into_record(self, id: i64, created_at: DateTime<Utc>) -> LeakCheckRecord {
        LeakCheckRecord {
            id,
            reading_a: self.input.reading_a,
            reading_b: self.input.reading_b,
            no_water_used: self.input.no_water_used,
            delta: self.assessment.delta,
            leak_detected: self.assessment.leak_detected,
            confidence: self.assessment.confidence,
            photo_path_a: self.input.photo_path_a,
            photo_path_b: self.input.photo_path_b,
            duration_minutes: self.input.duration_minutes,
            created_at,
        }
    }
}

/// A stored leak check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakCheckRecord {
    pub id: i64,
    pub reading_a: f64,
    pub reading_b: f64,
    pub no_water_used: bool,
    pub delta: f64,
    pub leak_detected: bool,
    pub confidence: LeakConfidence,
    pub photo_path_a: Option<String>,
    pub photo_path_b: Option<String>,
    pub duration_minutes: i64,
    pub created_at: DateTime<Utc>,
}

impl LeakCheckRecord {
    /// Detected leak with High or Very High confidence.
    #[must_use]
    pub const fn is_confirmed_leak(&self) -> bool {
        self.leak_detected && self.confidence.is_confirming()
    }
}

// =============================================================================
// Bill Analyses
// =============================================================================

/// Bill data ready to be stored, from manual entry or extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillAnalysisInput {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub usage: f64,
    pub amount: f64,
    #[serde(default)]
    pub photo_path: Option<String>,
}

impl BillAnalysisInput {
    /// Build an input from an extraction result.
    #[must_use]
    pub fn from_extraction(result: &ExtractionResult, photo_path: Option<String>) -> Self {
        Self {
            period_start: result.period_start,
            period_end: result.period_end,
            usage: result.usage,
            amount: result.amount,
            photo_path,
        }
    }
}

/// A stored bill analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillAnalysisRecord {
    pub id: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub usage: f64,
    pub amount: f64,
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Extraction Result
// =============================================================================

/// Structured bill fields produced by an extraction strategy or by defaults.
///
/// `confidence` is a continuous score in `[0, 1]`, unrelated to
/// [`LeakConfidence`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub usage: f64,
    pub amount: f64,
    pub confidence: f64,
}

// =============================================================================
// Guardian Status
// =============================================================================

/// Household alert level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Normal,
    Warning,
    Confirmed,
}

impl StatusLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Confirmed => "confirmed",
        }
    }
}

impl std::fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rolling household status computed from recent records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardianStatus {
    pub status: StatusLevel,
    pub message: String,
    pub last_check: Option<DateTime<Utc>>,
    pub recent_leaks: usize,
    pub total_checks_30d: usize,
}

// =============================================================================
// Robot Output
// =============================================================================

/// Schema version for JSON output.
pub const SCHEMA_VERSION: &str = "flowsense.v1";

/// Envelope for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotOutput<T> {
    pub schema_version: String,
    pub command: String,
    pub generated_at: DateTime<Utc>,
    pub data: T,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl<T> RobotOutput<T> {
    /// Wrap command data in the envelope.
    pub fn new(command: &str, data: T) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            command: command.to_string(),
            generated_at: Utc::now(),
            data,
            errors: Vec::new(),
        }
    }

    /// Attach non-fatal errors.
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }
}
