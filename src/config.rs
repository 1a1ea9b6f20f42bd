//! Engine configuration
//!
//! Configuration is an explicit value handed to each stage at construction.
//! It can be read from environment-style key/value pairs where every value is
//! a string, which is how the scheduled job that drives the engine is set up.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Key for the fractional weekly change applied to the rolling average
pub const TARGET_WEEKLY_CHANGE_PERCENTAGE: &str = "TARGET_WEEKLY_CHANGE_PERCENTAGE";
/// Key for the minimum number of look-back days used by the forecaster
pub const LOOKBACK_MINIMUM: &str = "LOOKBACK_MINIMUM";
/// Key for the gap-filling policy
pub const INTERPOLATION_MODE: &str = "INTERPOLATION_MODE";
/// Key for the cumulative-curve fitting method
pub const CURVE_FIT: &str = "CURVE_FIT";

/// Default look-back minimum (days)
pub const DEFAULT_LOOKBACK_MINIMUM: usize = 2;

/// How missing calendar days are synthesized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMode {
    /// Carry the most recent earlier value forward
    Pad,
    /// Straight line between the neighbouring known days, rounded to grams
    #[default]
    Linear,
}

impl InterpolationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterpolationMode::Pad => "pad",
            InterpolationMode::Linear => "linear",
        }
    }
}

impl FromStr for InterpolationMode {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pad" => Ok(InterpolationMode::Pad),
            "linear" => Ok(InterpolationMode::Linear),
            other => Err(ComputeError::InvalidConfig(format!(
                "{INTERPOLATION_MODE} must be 'pad' or 'linear', got '{other}'"
            ))),
        }
    }
}

/// Curve used to fill the unknown points of the cumulative weight curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveFit {
    /// Quadratic while the look-back is short, monotone cubic otherwise
    #[default]
    Auto,
    /// Parabola through the last two look-back points and the week's end
    Quadratic,
    /// Monotone piecewise cubic Hermite (PCHIP) through every known point
    Pchip,
}

impl CurveFit {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurveFit::Auto => "auto",
            CurveFit::Quadratic => "quadratic",
            CurveFit::Pchip => "pchip",
        }
    }
}

impl FromStr for CurveFit {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(CurveFit::Auto),
            "quadratic" => Ok(CurveFit::Quadratic),
            "pchip" => Ok(CurveFit::Pchip),
            other => Err(ComputeError::InvalidConfig(format!(
                "{CURVE_FIT} must be 'auto', 'quadratic' or 'pchip', got '{other}'"
            ))),
        }
    }
}

/// Settings consumed by the resampler, target deriver and forecaster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fractional weekly change applied to last week's rolling average (0.01 = +1%)
    pub target_weekly_change_percentage: f64,
    /// Minimum days of history fed to the forecaster's curve fit
    pub lookback_minimum: usize,
    /// Gap-filling policy
    pub interpolation_mode: InterpolationMode,
    /// Cumulative-curve fitting method
    pub curve_fit: CurveFit,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_weekly_change_percentage: 0.0,
            lookback_minimum: DEFAULT_LOOKBACK_MINIMUM,
            interpolation_mode: InterpolationMode::default(),
            curve_fit: CurveFit::default(),
        }
    }
}

impl EngineConfig {
    /// Build a configuration from string key/values, falling back to defaults
    /// for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ComputeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(TARGET_WEEKLY_CHANGE_PERCENTAGE) {
            config.target_weekly_change_percentage = raw.trim().parse().map_err(|_| {
                ComputeError::InvalidConfig(format!(
                    "{TARGET_WEEKLY_CHANGE_PERCENTAGE} is not a number: '{raw}'"
                ))
            })?;
        }

        if let Some(raw) = lookup(LOOKBACK_MINIMUM) {
            config.lookback_minimum = raw.trim().parse().map_err(|_| {
                ComputeError::InvalidConfig(format!(
                    "{LOOKBACK_MINIMUM} is not a positive integer: '{raw}'"
                ))
            })?;
        }

        if let Some(raw) = lookup(INTERPOLATION_MODE) {
            config.interpolation_mode = raw.parse()?;
        }

        if let Some(raw) = lookup(CURVE_FIT) {
            config.curve_fit = raw.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from the process environment
    pub fn from_env() -> Result<Self, ComputeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ComputeError> {
        if !self.target_weekly_change_percentage.is_finite() {
            return Err(ComputeError::InvalidConfig(format!(
                "{TARGET_WEEKLY_CHANGE_PERCENTAGE} must be finite"
            )));
        }
        // The curve fit needs two known points besides the week's end
        if !(2..=7).contains(&self.lookback_minimum) {
            return Err(ComputeError::InvalidConfig(format!(
                "{LOOKBACK_MINIMUM} must be between 2 and 7, got {}",
                self.lookback_minimum
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = EngineConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.target_weekly_change_percentage, 0.0);
        assert_eq!(config.lookback_minimum, 2);
        assert_eq!(config.interpolation_mode, InterpolationMode::Linear);
        assert_eq!(config.curve_fit, CurveFit::Auto);
    }

    #[test]
    fn test_parse_all_keys() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (TARGET_WEEKLY_CHANGE_PERCENTAGE, "-0.005"),
            (LOOKBACK_MINIMUM, "3"),
            (INTERPOLATION_MODE, "PAD"),
            (CURVE_FIT, " PCHIP "),
        ]))
        .unwrap();

        assert!((config.target_weekly_change_percentage + 0.005).abs() < 1e-12);
        assert_eq!(config.lookback_minimum, 3);
        assert_eq!(config.interpolation_mode, InterpolationMode::Pad);
        assert_eq!(config.curve_fit, CurveFit::Pchip);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_pct =
            EngineConfig::from_lookup(lookup_from(&[(TARGET_WEEKLY_CHANGE_PERCENTAGE, "five")]));
        assert!(matches!(bad_pct, Err(ComputeError::InvalidConfig(_))));

        let bad_mode = EngineConfig::from_lookup(lookup_from(&[(INTERPOLATION_MODE, "spline")]));
        assert!(matches!(bad_mode, Err(ComputeError::InvalidConfig(_))));

        let bad_fit = EngineConfig::from_lookup(lookup_from(&[(CURVE_FIT, "barycentric")]));
        assert!(matches!(bad_fit, Err(ComputeError::InvalidConfig(_))));

        let short_lookback = EngineConfig::from_lookup(lookup_from(&[(LOOKBACK_MINIMUM, "1")]));
        assert!(matches!(short_lookback, Err(ComputeError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"interpolation_mode": "pad"}"#).unwrap();
        assert_eq!(config.interpolation_mode, InterpolationMode::Pad);
        assert_eq!(config.lookback_minimum, DEFAULT_LOOKBACK_MINIMUM);
    }
}
