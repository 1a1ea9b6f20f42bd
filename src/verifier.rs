//! Forecast self-check
//!
//! Recomputes the week's average from the readings already taken and the
//! forecast days. Rounding every forecast day to whole grams can move the
//! average by a gram, so a mismatch is reported, never raised.

use crate::types::Verification;

/// Recompute the achieved weekly average and compare it with `target`
pub fn check(target: i64, forecast: &[i64], elapsed: &[f64]) -> Verification {
    let count = forecast.len() + elapsed.len();
    if count == 0 {
        tracing::warn!(target, "no readings or forecast days to verify");
        return Verification {
            target,
            achieved: 0,
            matches: false,
            message: "Nothing to verify for this week".to_string(),
        };
    }

    let total: f64 = elapsed.iter().sum::<f64>() + forecast.iter().map(|&v| v as f64).sum::<f64>();
    let achieved = (total / count as f64).round_ties_even() as i64;
    let matches = achieved == target;

    let message = if matches {
        tracing::info!(target, achieved, "forecast reaches the weekly target");
        format!("Forecast reaches this week's target of {target} g")
    } else {
        tracing::warn!(target, achieved, "forecast misses the weekly target");
        format!("Forecast averages {achieved} g against this week's target of {target} g")
    };

    Verification {
        target,
        achieved,
        matches,
        message,
    }
}

/// `true` when elapsed and forecast days average to `target`
pub fn verify(target: i64, forecast: &[i64], elapsed: &[f64]) -> bool {
    check(target, forecast, elapsed).matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_week() {
        let result = check(80000, &[80133, 80067, 80000, 79933, 79867, 79800], &[80200.0]);
        assert!(result.matches);
        assert_eq!(result.achieved, 80000);
    }

    #[test]
    fn test_mismatch_is_reported_not_raised() {
        let result = check(80000, &[80100, 80100, 80100], &[80100.0, 80100.0, 80100.0, 80100.0]);
        assert!(!result.matches);
        assert_eq!(result.achieved, 80100);
        assert!(result.message.contains("80100"));
        assert!(!verify(80000, &[80100], &[]));
    }

    #[test]
    fn test_whole_week_forecast() {
        assert!(verify(70000, &[70000; 7], &[]));
    }

    #[test]
    fn test_empty_week() {
        let result = check(80000, &[], &[]);
        assert!(!result.matches);
    }
}
