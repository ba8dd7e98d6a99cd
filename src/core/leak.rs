//! Leak classification.
//!
//! Converts two meter readings taken while no water was used into a delta,
//! a leak verdict, and a confidence tier. Pure and total: every input
//! produces a result.

use serde::{Deserialize, Serialize};

use super::models::LeakConfidence;

/// Deltas at or below this value (in the reading unit) are measurement noise.
pub const LEAK_THRESHOLD: f64 = 0.01;

/// Per-minute rate above which confidence is Very High.
pub const VERY_HIGH_RATE: f64 = 1.0;
/// Per-minute rate above which confidence is High.
pub const HIGH_RATE: f64 = 0.5;
/// Per-minute rate above which confidence is Medium.
pub const MEDIUM_RATE: f64 = 0.1;

/// Output of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeakAssessment {
    pub delta: f64,
    pub leak_detected: bool,
    pub confidence: LeakConfidence,
}

/// Classify a pair of readings.
///
/// `leak_detected` requires `no_water_used`; a test taken while water was
/// in use still yields a result, always at `Low` confidence.
#[must_use]
pub fn classify(
    reading_a: f64,
    reading_b: f64,
    no_water_used: bool,
    duration_minutes: i64,
) -> LeakAssessment {
    let delta = (reading_b - reading_a).abs();
    LeakAssessment {
        delta,
        leak_detected: no_water_used && delta > LEAK_THRESHOLD,
        confidence: confidence_tier(delta, no_water_used, duration_minutes),
    }
}

/// Grade a delta by its per-minute rate.
///
/// A non-positive duration is treated as a one-minute window.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn confidence_tier(delta: f64, no_water_used: bool, duration_minutes: i64) -> LeakConfidence {
    if !no_water_used {
        return LeakConfidence::Low;
    }

    let rate = if duration_minutes > 0 {
        delta / duration_minutes as f64
    } else {
        delta
    };

    if rate > VERY_HIGH_RATE {
        LeakConfidence::VeryHigh
    } else if rate > HIGH_RATE {
        LeakConfidence::High
    } else if rate > MEDIUM_RATE {
        LeakConfidence::Medium
    } else {
        LeakConfidence::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_readings_are_not_a_leak() {
        let result = classify(250.0, 250.0, true, 10);
        assert!(result.delta.abs() < f64::EPSILON);
        assert!(!result.leak_detected);
        assert_eq!(result.confidence, LeakConfidence::Low);
    }

    #[test]
    fn water_in_use_is_always_low() {
        let result = classify(100.0, 105.0, false, 10);
        assert!((result.delta - 5.0).abs() < f64::EPSILON);
        assert!(!result.leak_detected);
        assert_eq!(result.confidence, LeakConfidence::Low);

        let huge = classify(0.0, 10_000.0, false, 1);
        assert_eq!(huge.confidence, LeakConfidence::Low);
    }

    #[test]
    fn delta_is_absolute() {
        let forward = classify(10.0, 12.5, true, 10);
        let backward = classify(12.5, 10.0, true, 10);
        assert!((forward.delta - 2.5).abs() < f64::EPSILON);
        assert_eq!(forward, backward);
    }

    #[test]
    fn noise_threshold_is_exclusive() {
        assert!(!classify(0.0, 0.01, true, 10).leak_detected);
        assert!(classify(0.0, 0.02, true, 10).leak_detected);
    }

    #[test]
    fn tier_boundaries_are_strict() {
        // rate exactly 0.1 -> Low
        assert_eq!(confidence_tier(1.0, true, 10), LeakConfidence::Low);
        // rate exactly 0.5 -> Medium
        assert_eq!(confidence_tier(5.0, true, 10), LeakConfidence::Medium);
        // rate exactly 1.0 -> High
        assert_eq!(confidence_tier(10.0, true, 10), LeakConfidence::High);
        assert_eq!(confidence_tier(10.5, true, 10), LeakConfidence::VeryHigh);
    }

    #[test]
    fn tiers_between_boundaries() {
        assert_eq!(confidence_tier(2.0, true, 10), LeakConfidence::Medium);
        assert_eq!(confidence_tier(7.0, true, 10), LeakConfidence::High);
        assert_eq!(confidence_tier(30.0, true, 10), LeakConfidence::VeryHigh);
    }

    #[test]
    fn non_positive_duration_uses_raw_delta() {
        assert_eq!(confidence_tier(0.8, true, 0), LeakConfidence::High);
        assert_eq!(confidence_tier(0.8, true, -5), LeakConfidence::High);
        assert_eq!(confidence_tier(0.8, true, 10), LeakConfidence::Low);
    }

    #[test]
    fn confidence_is_monotonic_in_rate() {
        let mut previous = LeakConfidence::Low;
        for step in 0..=300 {
            let delta = f64::from(step) * 0.05;
            let tier = classify(0.0, delta, true, 10).confidence;
            assert!(tier >= previous, "tier dropped at delta {delta}");
            previous = tier;
        }
        assert_eq!(previous, LeakConfidence::VeryHigh);
    }

    #[test]
    fn nan_reading_is_never_a_leak() {
        let result = classify(f64::NAN, 1.0, true, 10);
        assert!(result.delta.is_nan());
        assert!(!result.leak_detected);
        assert_eq!(result.confidence, LeakConfidence::Low);
    }
}
