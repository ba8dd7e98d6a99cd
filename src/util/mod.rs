//! Utility functions.

pub mod env;
pub mod format;
pub mod time;

pub use format::{format_amount, format_delta, format_gallons, format_reading, format_score};
pub use time::format_relative_time;
