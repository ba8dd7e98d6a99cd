//! Number formatting utilities.

/// Format a gallon count with thousands separators, e.g. `1,500 gal`.
#[must_use]
pub fn format_gallons(value: f64) -> String {
    format!("{} gal", group_thousands(value, 0))
}

/// Format a billed amount, e.g. `$1,045.50`.
#[must_use]
pub fn format_amount(value: f64) -> String {
    format!("${}", group_thousands(value, 2))
}

/// Format a meter reading, e.g. `1,045.20`.
#[must_use]
pub fn format_reading(value: f64) -> String {
    format!("{value:.2}")
}

/// Format a reading delta finely enough to tell a leak from the
/// 0.01 noise threshold.
#[must_use]
pub fn format_delta(value: f64) -> String {
    format!("{value:.3}")
}

/// Format an extraction score in `[0, 1]` as a percentage.
#[must_use]
pub fn format_score(value: f64) -> String {
    format!("{:.0}%", value * 100.0)
}

fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (whole, fraction) = formatted
        .split_once('.')
        .map_or((formatted.as_str(), None), |(w, f)| (w, Some(f)));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}
