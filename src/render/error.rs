//! Error rendering.
//!
//! Human mode prints the error code, message, and hint on stderr. JSON and
//! Markdown modes print a structured error document instead so agents can
//! parse failures the same way as results.

use colored::Colorize;
use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::core::models::SCHEMA_VERSION;
use crate::error::FlowError;

/// Render an error for the selected output format.
#[must_use]
pub fn render_error(error: &FlowError, format: OutputFormat, no_color: bool, pretty: bool) -> String {
    match format {
        OutputFormat::Json => render_error_json(error, pretty),
        OutputFormat::Md => render_error_json(error, true),
        OutputFormat::Human => render_simple(error, no_color),
    }
}

/// Render an error as a structured JSON document.
#[must_use]
pub fn render_error_json(error: &FlowError, pretty: bool) -> String {
    let error_json = ErrorJson::from_error(error);
    let rendered = if pretty {
        serde_json::to_string_pretty(&error_json)
    } else {
        serde_json::to_string(&error_json)
    };
    rendered.unwrap_or_else(|_| render_simple(error, true))
}

fn render_simple(error: &FlowError, no_color: bool) -> String {
    let header = format!("Error [{}]: {error}", error.error_code());
    let mut lines = vec![if no_color {
        header
    } else {
        header.red().bold().to_string()
    }];

    if let Some(hint) = error.hint() {
        let hint = format!("Hint: {hint}");
        lines.push(if no_color {
            hint
        } else {
            hint.dimmed().to_string()
        });
    }

    lines.join("\n")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorJson {
    schema_version: &'static str,
    error_code: &'static str,
    category: String,
    message: String,
    exit_code: u8,
    is_retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl ErrorJson {
    fn from_error(error: &FlowError) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            error_code: error.error_code(),
            category: error.category().to_string(),
            message: error.to_string(),
            exit_code: error.exit_code().into(),
            is_retryable: error.is_retryable(),
            hint: error.hint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_error_has_code_and_hint() {
        let err = FlowError::NotFound {
            kind: "leak check",
            id: 4,
        };
        let output = render_error(&err, OutputFormat::Human, true, false);
        assert!(output.starts_with("Error [FS-S002]"));
        assert!(output.contains("Hint: List existing entries"));
    }

    #[test]
    fn json_error_is_structured() {
        let err = FlowError::invalid_input("limit", "must be between 1 and 100, got 0");
        let output = render_error(&err, OutputFormat::Json, true, false);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(value["exitCode"], 3);
        assert_eq!(value["isRetryable"], false);
        assert!(value["message"].as_str().unwrap().contains("limit"));
        assert!(value.get("hint").is_none());
    }
}
