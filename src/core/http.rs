//! HTTP client utilities.
//!
//! Provides the shared HTTP client used by the vision strategy.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::error::{FlowError, Result};

/// Default timeout for HTTP requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(format!("flowsense/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FlowError::Network(e.to_string()))
}

/// Map a transport error, keeping timeouts distinct.
#[must_use]
pub fn map_send_error(err: &reqwest::Error, timeout: Duration) -> FlowError {
    if err.is_timeout() {
        FlowError::Timeout(timeout.as_secs())
    } else {
        FlowError::Network(err.to_string())
    }
}

/// Truncate a response body for log context.
#[must_use]
pub fn preview(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
