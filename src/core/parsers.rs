//! Field parsers for raw OCR text.
//!
//! Each parser tries its patterns in a fixed order and returns the first
//! match that yields a valid value. Numbers may carry thousands separators.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};

/// Number with optional thousands separators and decimals.
const NUMBER: &str = r"(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)";

static SLASH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());

static MONTH_NAME_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z]{3,9})\.?\s+(\d{1,2}),?\s+(\d{4})\b").unwrap());

static DASH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})-(\d{1,2})-(\d{4})\b").unwrap());

static USAGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"(?i){NUMBER}\s*(?:gallons?|gals?)\b"),
        format!(r"(?i)usage[:\s]+{NUMBER}"),
        format!(r"(?i){NUMBER}\s*(?:cubic\s+feet|cu\.?\s*ft|cf)\b"),
        format!(r"(?i){NUMBER}\s*gal"),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static AMOUNT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"\${NUMBER}"),
        format!(r"(?i)total[:\s]+\$?{NUMBER}"),
        format!(r"(?i)amount[:\s]+\$?{NUMBER}"),
        format!(r"(?i)due[:\s]+\$?{NUMBER}"),
        format!(r"(?i)balance[:\s]+\$?{NUMBER}"),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// First calendar date found in `text`.
///
/// Formats, in priority order: `MM/DD/YYYY`, `YYYY-MM-DD`,
/// `Month DD, YYYY`, `MM-DD-YYYY`. Only the first match of each format is
/// considered; when it is not a real date the next format is tried.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    first_match(&SLASH_DATE, text, |c| ymd(&c[3], &c[1], &c[2]))
        .or_else(|| first_match(&ISO_DATE, text, |c| ymd(&c[1], &c[2], &c[3])))
        .or_else(|| {
            first_match(&MONTH_NAME_DATE, text, |c| {
                let month = month_from_name(&c[1])?;
                NaiveDate::from_ymd_opt(c[3].parse().ok()?, month, c[2].parse().ok()?)
            })
        })
        .or_else(|| first_match(&DASH_DATE, text, |c| ymd(&c[3], &c[1], &c[2])))
}

fn first_match(
    pattern: &Regex,
    text: &str,
    build: impl Fn(&Captures<'_>) -> Option<NaiveDate>,
) -> Option<NaiveDate> {
    pattern.captures(text).and_then(|c| build(&c))
}

/// Water usage (gallons or cubic feet, unit not converted).
#[must_use]
pub fn parse_usage(text: &str) -> Option<f64> {
    first_number(&USAGE_PATTERNS, text)
}

/// Dollar amount.
#[must_use]
pub fn parse_amount(text: &str) -> Option<f64> {
    first_number(&AMOUNT_PATTERNS, text)
}

fn first_number(patterns: &[Regex], text: &str) -> Option<f64> {
    patterns.iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|c| c[1].replace(',', "").parse::<f64>().ok())
    })
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn month_from_name(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    let lower = name.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|month| *month == lower || (lower.len() <= 4 && month.starts_with(&lower)))
        .and_then(|index| u32::try_from(index + 1).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn dates_in_each_format() {
        assert_eq!(parse_date("Read on 03/15/2024"), Some(date(2024, 3, 15)));
        assert_eq!(parse_date("Issued 2024-02-01 by city"), Some(date(2024, 2, 1)));
        assert_eq!(parse_date("Due January 5, 2024"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date("Due Sept 5 2024"), Some(date(2024, 9, 5)));
        assert_eq!(parse_date("Date 04-30-2024"), Some(date(2024, 4, 30)));
    }

    #[test]
    fn slash_format_wins_over_iso() {
        let text = "Period 2024-01-01 through 01/31/2024";
        assert_eq!(parse_date(text), Some(date(2024, 1, 31)));
    }

    #[test]
    fn invalid_match_falls_through_to_next_format() {
        let text = "Ref 13/45/2024 billed 2024-06-10";
        assert_eq!(parse_date(text), Some(date(2024, 6, 10)));
    }

    #[test]
    fn no_date() {
        assert_eq!(parse_date("no dates here"), None);
        assert_eq!(parse_date("Account 12, 2024"), None);
    }

    #[test]
    fn only_first_match_of_each_format_counts() {
        let text = "Ref 13/45/2024 read 01/02/2024 billed 2024-06-10";
        assert_eq!(parse_date(text), Some(date(2024, 6, 10)));
        // "Account 12, 2024" is the first month-name match and not a date
        assert_eq!(parse_date("Account 12, 2024 read March 3, 2024"), None);
    }

    #[test]
    fn usage_with_separators_and_units() {
        assert_eq!(parse_usage("You used 1,500 gallons"), Some(1500.0));
        assert_eq!(parse_usage("4500 GAL this period"), Some(4500.0));
        assert_eq!(parse_usage("Usage: 2,345.5"), Some(2345.5));
        assert_eq!(parse_usage("Metered 12 cubic feet"), Some(12.0));
        assert_eq!(parse_usage("Metered 8 CF"), Some(8.0));
        assert_eq!(parse_usage("nothing"), None);
    }

    #[test]
    fn usage_patterns_are_ordered() {
        // gallons outranks the usage: label
        let text = "Usage: 10 units\nTotal 3,000 gallons";
        assert_eq!(parse_usage(text), Some(3000.0));
    }

    #[test]
    fn amounts() {
        assert_eq!(parse_amount("Pay $45.50 now"), Some(45.5));
        assert_eq!(parse_amount("TOTAL: 1,234.00"), Some(1234.0));
        assert_eq!(parse_amount("Amount due: 12"), Some(12.0));
        assert_eq!(parse_amount("Balance 99.99"), Some(99.99));
        assert_eq!(parse_amount("free"), None);
    }

    #[test]
    fn dollar_sign_outranks_labels() {
        assert_eq!(parse_amount("Total: 10.00\nCharges $7.25"), Some(7.25));
    }
}
