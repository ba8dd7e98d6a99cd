//! flowsense - household water leak checks and bill analysis
//!
//! Classifies meter-reading pairs into leak verdicts, extracts billing data
//! from bill photos (vision model, OCR fallback, or defaults), stores both in
//! a local `SQLite` database, and aggregates them into a guardian status.

// Note: deny (not forbid) so test helpers can opt out locally
#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod core;
pub mod error;
pub mod render;
pub mod storage;
pub mod util;

/// Test utilities module - included in test builds or when test-utils feature is enabled.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{ExitCode, FlowError, Result};

// Re-export test utilities for external test crates
#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::*;
