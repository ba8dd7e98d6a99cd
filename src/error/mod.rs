//! Error types for flowsense.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Errors are categorized into six main categories:
//! - **Configuration**: Config file parsing, validation, or missing values
//! - **Network**: Connection or timeout issues talking to the vision service
//! - **Extraction**: Vision/OCR strategy failures (never surfaced by the pipeline)
//! - **Storage**: Record store failures
//! - **Input**: Caller-supplied values outside their domain
//! - **Internal**: Unexpected errors, bugs, or unclassified issues
//!
//! Each error has a stable error code (e.g., `FS-C001`) for programmatic handling.

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration issues (parse errors, invalid values, missing files).
    Configuration,
    /// Network issues (timeout, connection refused, HTTP failures).
    Network,
    /// Bill extraction strategy failures.
    Extraction,
    /// Record store failures.
    Storage,
    /// Invalid caller input.
    Input,
    /// Internal errors (bugs, unexpected state, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Configuration error",
            Self::Network => "Network error",
            Self::Extraction => "Extraction error",
            Self::Storage => "Storage error",
            Self::Input => "Input error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Configuration => "C",
            Self::Network => "N",
            Self::Extraction => "E",
            Self::Storage => "S",
            Self::Input => "I",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Required external tool (e.g. tesseract) not found
    ToolNotFound = 2,
    /// Parse/format errors, invalid input, missing records
    InputError = 3,
    /// Timeout
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

impl From<ExitCode> for u8 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

/// Main error type for flowsense operations.
#[derive(Error, Debug)]
pub enum FlowError {
    // ==========================================================================
    // Configuration errors
    // ==========================================================================
    /// Error parsing configuration file.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Invalid value in configuration.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid {
        key: String,
        value: String,
        message: String,
    },

    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    // ==========================================================================
    // Network errors
    // ==========================================================================
    /// Request timeout.
    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    /// Generic network error.
    #[error("network error: {0}")]
    Network(String),

    /// Vision service returned a non-success status.
    #[error("vision API error (HTTP {status_code}): {message}")]
    VisionApi { status_code: u16, message: String },

    // ==========================================================================
    // Extraction errors
    // ==========================================================================
    /// Failed to parse a strategy response.
    #[error("failed to parse response: {0}")]
    ParseResponse(String),

    /// OCR binary is not installed or not runnable.
    #[error("OCR engine not available: {0}")]
    OcrUnavailable(String),

    /// OCR engine ran but failed.
    #[error("OCR failed: {0}")]
    OcrFailed(String),

    /// Bill image could not be read.
    #[error("cannot read image {path}: {source}")]
    ImageRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ==========================================================================
    // Storage errors
    // ==========================================================================
    /// Record store failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// A record with the given id does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: i64 },

    // ==========================================================================
    // Input errors
    // ==========================================================================
    /// A caller-supplied value is outside its domain.
    #[error("invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    // ==========================================================================
    // Internal errors
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlowError {
    /// Shorthand for an [`FlowError::InvalidInput`].
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Map error to process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::OcrUnavailable(_) => ExitCode::ToolNotFound,

            Self::Config(_)
            | Self::ConfigParse { .. }
            | Self::ConfigInvalid { .. }
            | Self::ParseResponse(_)
            | Self::NotFound { .. }
            | Self::InvalidInput { .. } => ExitCode::InputError,

            Self::Timeout(_) => ExitCode::Timeout,

            Self::Network(_)
            | Self::VisionApi { .. }
            | Self::OcrFailed(_)
            | Self::ImageRead { .. }
            | Self::Storage(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::ConfigParse { .. } | Self::ConfigInvalid { .. } => {
                ErrorCategory::Configuration
            }

            Self::Timeout(_) | Self::Network(_) | Self::VisionApi { .. } => ErrorCategory::Network,

            Self::ParseResponse(_)
            | Self::OcrUnavailable(_)
            | Self::OcrFailed(_)
            | Self::ImageRead { .. } => ErrorCategory::Extraction,

            Self::Storage(_) | Self::NotFound { .. } => ErrorCategory::Storage,

            Self::InvalidInput { .. } => ErrorCategory::Input,

            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `FS-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigParse { .. } => "FS-C001",
            Self::ConfigInvalid { .. } => "FS-C002",
            Self::Config(_) => "FS-C003",

            Self::Timeout(_) => "FS-N001",
            Self::VisionApi { .. } => "FS-N002",
            Self::Network(_) => "FS-N099",

            Self::ParseResponse(_) => "FS-E001",
            Self::OcrUnavailable(_) => "FS-E002",
            Self::OcrFailed(_) => "FS-E003",
            Self::ImageRead { .. } => "FS-E004",

            Self::Storage(_) => "FS-S001",
            Self::NotFound { .. } => "FS-S002",

            Self::InvalidInput { .. } => "FS-I001",

            Self::Io(_) => "FS-X001",
            Self::Json(_) => "FS-X002",
            Self::Other(_) => "FS-X099",
        }
    }

    /// Returns whether the error is potentially recoverable by retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Network(_) | Self::VisionApi { status_code: 429 | 500..=599, .. }
        )
    }

    /// One-line hint shown under human-readable errors.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::ConfigParse { path, .. } => Some(format!("Fix or remove {path}")),
            Self::Config(_) | Self::ConfigInvalid { .. } => {
                Some("Run `flowsense doctor` to inspect the resolved configuration".to_string())
            }
            Self::OcrUnavailable(_) => {
                Some("Install tesseract (e.g. `apt install tesseract-ocr`)".to_string())
            }
            Self::Timeout(seconds) => Some(format!(
                "Increase the timeout (currently {seconds}s) with FLOWSENSE_TIMEOUT"
            )),
            Self::NotFound { kind, .. } => Some(format!("List existing entries to find a valid {kind} id")),
            _ => None,
        }
    }
}

/// Result type alias for flowsense operations.
pub type Result<T> = std::result::Result<T, FlowError>;
