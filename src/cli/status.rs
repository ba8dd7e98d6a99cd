//! Guardian status command.

use chrono::{DateTime, Utc};

use crate::cli::print_output;
use crate::core::models::GuardianStatus;
use crate::error::Result;
use crate::render;
use crate::storage::{RecordStore, ResolvedConfig};

/// Execute the status command.
///
/// # Errors
/// Returns an error if the record database cannot be opened or queried.
pub fn execute(config: &ResolvedConfig) -> Result<()> {
    let store = RecordStore::open(&config.database_path)?;
    let now = Utc::now();
    let status = current_status(&store, now)?;

    let output = render::render_status(
        &status,
        now,
        config.format,
        config.pretty,
        config.no_color,
    )?;
    print_output(&output);
    Ok(())
}

/// Aggregate the stored records as of `now`.
///
/// # Errors
/// Returns an error if a query fails.
pub fn current_status(store: &RecordStore, now: DateTime<Utc>) -> Result<GuardianStatus> {
    let status = store.guardian_status(now)?;
    tracing::debug!(
        status = %status.status,
        recent_leaks = status.recent_leaks,
        "Guardian status computed"
    );
    Ok(status)
}
