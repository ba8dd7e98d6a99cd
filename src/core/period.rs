//! Billing-period defaults and boundary filling.

use chrono::{Datelike, NaiveDate};

/// First and last day of the calendar month before `today`.
#[must_use]
pub fn previous_month(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first_of_this_month = today.with_day(1).unwrap_or(today);
    let end = first_of_this_month.pred_opt().unwrap_or(first_of_this_month);
    let start = end.with_day(1).unwrap_or(end);
    (start, end)
}

/// Fill missing period boundaries so that `start < end` holds.
///
/// Supplied boundaries are never changed. A missing boundary comes from the
/// default period when that keeps the ordering, otherwise from the supplied
/// date's own calendar month. A supplied date at the edge of the calendar
/// that leaves no room for the other boundary yields the default period.
#[must_use]
pub fn fill_period(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    let (default_start, default_end) = previous_month(today);
    match (start, end) {
        (Some(start), Some(end)) => (start, end),
        (None, None) => (default_start, default_end),
        (Some(start), None) => {
            let end = if default_end > start {
                Some(default_end)
            } else {
                let month_end = last_day_of_month(start);
                if month_end > start {
                    Some(month_end)
                } else {
                    start.succ_opt()
                }
            };
            end.map_or((default_start, default_end), |end| (start, end))
        }
        (None, Some(end)) => {
            let start = if default_start < end {
                Some(default_start)
            } else {
                let month_start = end.with_day(1).unwrap_or(end);
                if month_start < end {
                    Some(month_start)
                } else {
                    end.pred_opt()
                }
            };
            start.map_or((default_start, default_end), |start| (start, end))
        }
    }
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn previous_month_mid_year() {
        assert_eq!(
            previous_month(date(2024, 7, 15)),
            (date(2024, 6, 1), date(2024, 6, 30))
        );
    }

    #[test]
    fn previous_month_rolls_back_year_in_january() {
        assert_eq!(
            previous_month(date(2025, 1, 3)),
            (date(2024, 12, 1), date(2024, 12, 31))
        );
    }

    #[test]
    fn previous_month_handles_leap_february() {
        assert_eq!(
            previous_month(date(2024, 3, 31)),
            (date(2024, 2, 1), date(2024, 2, 29))
        );
    }

    #[test]
    fn missing_end_uses_default_when_ordered() {
        let today = date(2024, 7, 15);
        assert_eq!(
            fill_period(Some(date(2024, 1, 5)), None, today),
            (date(2024, 1, 5), date(2024, 6, 30))
        );
    }

    #[test]
    fn missing_end_after_default_uses_month_end() {
        let today = date(2024, 7, 15);
        assert_eq!(
            fill_period(Some(date(2024, 7, 2)), None, today),
            (date(2024, 7, 2), date(2024, 7, 31))
        );
        assert_eq!(
            fill_period(Some(date(2024, 7, 31)), None, today),
            (date(2024, 7, 31), date(2024, 8, 1))
        );
    }

    #[test]
    fn missing_start_before_default_uses_month_start() {
        let today = date(2024, 7, 15);
        assert_eq!(
            fill_period(None, Some(date(2024, 6, 20)), today),
            (date(2024, 6, 1), date(2024, 6, 20))
        );
        assert_eq!(
            fill_period(None, Some(date(2024, 3, 10)), today),
            (date(2024, 3, 1), date(2024, 3, 10))
        );
        assert_eq!(
            fill_period(None, Some(date(2024, 3, 1)), today),
            (date(2024, 2, 29), date(2024, 3, 1))
        );
    }

    #[test]
    fn supplied_boundaries_pass_through() {
        let today = date(2024, 7, 15);
        let same = date(2024, 5, 5);
        assert_eq!(fill_period(Some(same), Some(same), today), (same, same));
    }

    #[test]
    fn one_sided_fill_keeps_ordering() {
        let today = date(2024, 7, 15);
        let mut day = date(2023, 1, 1);
        while day < date(2025, 1, 1) {
            let (s, e) = fill_period(Some(day), None, today);
            assert!(s < e, "start {s} not before end {e}");
            let (s, e) = fill_period(None, Some(day), today);
            assert!(s < e, "start {s} not before end {e}");
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn calendar_edges_fall_back_to_default() {
        let today = date(2024, 7, 15);
        let default = (date(2024, 6, 1), date(2024, 6, 30));
        assert_eq!(fill_period(None, Some(NaiveDate::MIN), today), default);
        assert_eq!(fill_period(Some(NaiveDate::MAX), None, today), default);
        assert_eq!(last_day_of_month(NaiveDate::MAX), NaiveDate::MAX);
    }
}
