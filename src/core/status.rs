//! Guardian status aggregation.
//!
//! Synthesizes recent leak checks and bill trends into one of three alert
//! levels. Callers hand in records already filtered to the status window
//! (newest first, bills capped at [`BILL_TREND_LIMIT`]); the aggregator only
//! applies the decision tree.

use chrono::{DateTime, Duration, Utc};

use super::models::{BillAnalysisRecord, GuardianStatus, LeakCheckRecord, StatusLevel};

/// Window of leak checks and bills considered, in days.
pub const STATUS_WINDOW_DAYS: i64 = 30;

/// A confirmed leak newer than this escalates to `confirmed`.
pub const RECENT_LEAK_DAYS: i64 = 7;

/// Most recent bills considered for the usage trend.
pub const BILL_TREND_LIMIT: usize = 3;

/// Newest usage above `oldest * BILL_SPIKE_RATIO` is unusual.
pub const BILL_SPIKE_RATIO: f64 = 1.5;

pub const MSG_LEAK_DETECTED: &str = "Leak detected";
pub const MSG_NEEDS_ATTENTION: &str = "Something might need attention";
pub const MSG_UNUSUAL_USE: &str = "Water use looks unusual";
pub const MSG_ALL_OK: &str = "Everything looks okay";

/// Start of the status window relative to `now`.
#[must_use]
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(STATUS_WINDOW_DAYS)
}

/// Compute the guardian status.
///
/// `leak_checks` and `bills` must be ordered newest first. The bill trend
/// compares index 0 against the last index of `bills`.
#[must_use]
pub fn aggregate(
    leak_checks: &[LeakCheckRecord],
    bills: &[BillAnalysisRecord],
    now: DateTime<Utc>,
) -> GuardianStatus {
    let confirmed: Vec<&LeakCheckRecord> = leak_checks
        .iter()
        .filter(|check| check.is_confirmed_leak())
        .collect();

    let (status, message) = if confirmed.is_empty() {
        bill_trend(bills)
    } else {
        let recent_cutoff = now - Duration::days(RECENT_LEAK_DAYS);
        if confirmed.iter().any(|check| check.created_at >= recent_cutoff) {
            (StatusLevel::Confirmed, MSG_LEAK_DETECTED)
        } else {
            (StatusLevel::Warning, MSG_NEEDS_ATTENTION)
        }
    };

    tracing::debug!(
        status = %status,
        confirmed = confirmed.len(),
        checks = leak_checks.len(),
        bills = bills.len(),
        "Guardian status aggregated"
    );

    GuardianStatus {
        status,
        message: message.to_string(),
        last_check: leak_checks.first().map(|check| check.created_at),
        recent_leaks: confirmed.len(),
        total_checks_30d: leak_checks.len(),
    }
}

fn bill_trend(bills: &[BillAnalysisRecord]) -> (StatusLevel, &'static str) {
    match (bills.first(), bills.last()) {
        (Some(newest), Some(oldest)) if bills.len() >= 2 => {
            if newest.usage > oldest.usage * BILL_SPIKE_RATIO {
                (StatusLevel::Warning, MSG_UNUSUAL_USE)
            } else {
                (StatusLevel::Normal, MSG_ALL_OK)
            }
        }
        _ => (StatusLevel::Normal, MSG_ALL_OK),
    }
}
