//! Shared helpers for integration tests.
//!
//! - `fixtures`: canned vision responses, OCR text, and CLI environments
//! - `logger`: per-test structured progress logging
//! - `log_capture`: tracing capture for asserting on emitted logs

pub mod fixtures;
pub mod log_capture;
pub mod logger;
