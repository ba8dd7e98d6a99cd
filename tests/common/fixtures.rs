//! Canned data for integration tests.
#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use serde_json::{Value, json};

// =============================================================================
// Vision responses
// =============================================================================

/// Chat completion body whose first choice says `content`.
#[must_use]
pub fn chat_completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

/// A complete bill answer wrapped in a Markdown fence.
pub const FENCED_FULL_BILL: &str = "```json\n{\"period_start\": \"2024-01-01\", \"period_end\": \"2024-01-31\", \"usage\": 4200, \"amount\": \"$61.25\"}\n```";

/// Only usage is legible.
pub const USAGE_ONLY_BILL: &str =
    r#"{"period_start": null, "period_end": null, "usage": 1500, "amount": null}"#;

/// US-style dates and no amount.
pub const US_DATES_BILL: &str =
    r#"{"period_start": "02/01/2024", "period_end": "02/29/2024", "usage": "2,000", "amount": 0}"#;

pub const NOT_JSON: &str = "I could not read this bill, sorry.";

// =============================================================================
// OCR text
// =============================================================================

pub const OCR_FULL_TEXT: &str =
    "CITY WATER DEPT\nService date 03/15/2024\nYou used 1,500 gallons\nAmount due: $45.50\n";

pub const OCR_AMOUNT_ONLY_TEXT: &str = "Thank you for your payment\nTotal $12.00\n";

pub const OCR_NOISE_TEXT: &str = "~~ ## smudged ## ~~";

// =============================================================================
// Files
// =============================================================================

/// A few bytes that stand in for a JPEG; nothing decodes them.
pub const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

/// Write [`FAKE_JPEG`] to `dir/name` and return the path.
///
/// # Panics
///
/// Panics if the file cannot be written.
#[must_use]
pub fn write_fake_image(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, FAKE_JPEG).expect("write fake image");
    path
}

// =============================================================================
// CLI
// =============================================================================

/// The `flowsense` binary isolated from the host: its own database, a config
/// path that does not exist, no API key, OCR off, and no color.
///
/// # Panics
///
/// Panics if the binary cannot be located.
#[must_use]
#[allow(deprecated)]
pub fn flowsense_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("flowsense").expect("flowsense binary");
    cmd.env("FLOWSENSE_DB", dir.join("flowsense.sqlite"))
        .env("FLOWSENSE_CONFIG", dir.join("missing-config.toml"))
        .env("FLOWSENSE_OCR_ENABLED", "0")
        .env("NO_COLOR", "1")
        .env_remove("OPENAI_API_KEY")
        .env_remove("FLOWSENSE_FORMAT")
        .env_remove("FLOWSENSE_TIMEOUT")
        .env_remove("FLOWSENSE_LOG")
        .env_remove("RUST_LOG");
    cmd
}

/// Parse a JSON envelope from command stdout.
///
/// # Panics
///
/// Panics if stdout is not valid JSON.
#[must_use]
pub fn parse_envelope(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("stdout is JSON")
}
