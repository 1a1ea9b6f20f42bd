//! Daily forecasting
//!
//! Solves for the weights still needed this week so that the week's average
//! lands on its target. The solver works on running totals: the totals of
//! the look-back days are known, the total at the week's end is fixed by the
//! target, and the days in between are interpolated on that curve. Differencing
//! the completed curve gives per-day values that add up to exactly the amount
//! the target requires.
//!
//! When fewer than `lookback_minimum` days of the week have passed, the last
//! days of the previous week are borrowed so the curve has enough shape. The
//! borrowed days are added to both the known totals and the end total, so
//! they stay fixed and only this week's missing days are solved for.

use crate::config::{CurveFit, EngineConfig, DEFAULT_LOOKBACK_MINIMUM};
use crate::error::ComputeError;
use crate::interpolation::{fill_curve, Fit};
use crate::types::{DailySeries, ForecastPoint, ForecastSeries, Verification, DAYS_PER_WEEK};
use crate::verifier;
use chrono::{Duration, NaiveDate};

/// Look-back length below which `CurveFit::Auto` stays quadratic
const PCHIP_MIN_LOOKBACK: usize = 3;

/// Forecast plus its self-check
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastOutcome {
    pub forecast: ForecastSeries,
    pub verification: Verification,
}

/// Forecaster for the open week's remaining days
pub struct DailyForecaster {
    lookback_minimum: usize,
    curve_fit: CurveFit,
}

impl Default for DailyForecaster {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK_MINIMUM, CurveFit::default())
    }
}

impl DailyForecaster {
    pub fn new(lookback_minimum: usize, curve_fit: CurveFit) -> Self {
        Self {
            lookback_minimum,
            curve_fit,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.lookback_minimum, config.curve_fit)
    }

    /// Forecast the days after the latest reading through `week_end` and
    /// verify the result against `target_avg`
    pub fn forecast(
        &self,
        series: &DailySeries,
        week_end: NaiveDate,
        target_avg: i64,
    ) -> Result<ForecastOutcome, ComputeError> {
        let last = series.end();
        let remaining = (week_end - last).num_days();

        if remaining <= 0 {
            return Err(ComputeError::InvalidWeekState(format!(
                "week ending {week_end} is already complete (latest reading {last})"
            )));
        }
        if remaining > DAYS_PER_WEEK as i64 {
            return Err(ComputeError::InvalidWeekState(format!(
                "latest reading {last} is before the week ending {week_end}"
            )));
        }

        let passed = DAYS_PER_WEEK - remaining as usize;
        let values = self.solve(series.values(), passed, target_avg as f64)?;

        let points: Vec<ForecastPoint> = values
            .iter()
            .enumerate()
            .map(|(i, &weight)| ForecastPoint {
                date: last + Duration::days(i as i64 + 1),
                weight_in_grams: weight,
            })
            .collect();

        let elapsed = series.tail(passed).to_vec();
        let verification = verifier::check(target_avg, &values, &elapsed);

        tracing::debug!(
            %week_end,
            target_avg,
            passed,
            remaining,
            "forecast remaining days"
        );

        Ok(ForecastOutcome {
            forecast: ForecastSeries {
                week_end,
                target_avg,
                passed_days: passed,
                elapsed,
                points,
            },
            verification,
        })
    }

    /// Solve the remaining `7 - passed` day values
    ///
    /// `history` is the gap-free daily history ending with the latest
    /// reading; its last `passed` values belong to the current week.
    pub fn solve(
        &self,
        history: &[f64],
        passed: usize,
        target_avg: f64,
    ) -> Result<Vec<i64>, ComputeError> {
        if passed >= DAYS_PER_WEEK {
            return Err(ComputeError::InvalidWeekState(
                "no days remain in the week".to_string(),
            ));
        }
        let remaining = DAYS_PER_WEEK - passed;

        let lookback = passed.max(self.lookback_minimum);
        if lookback < 2 {
            return Err(ComputeError::InvalidWeekState(format!(
                "a look-back of {lookback} day(s) cannot be interpolated"
            )));
        }
        if history.len() < lookback {
            return Err(ComputeError::InsufficientData(format!(
                "forecast needs {lookback} days of history, got {}",
                history.len()
            )));
        }
        if !target_avg.is_finite() {
            return Err(ComputeError::ForecastComputation(format!(
                "target average {target_avg} is not finite"
            )));
        }

        let window = &history[history.len() - lookback..];
        let borrowed = lookback - passed;
        let borrowed_sum: f64 = window[..borrowed].iter().sum();
        let target_sum = target_avg * DAYS_PER_WEEK as f64 + borrowed_sum;

        let mut curve: Vec<Option<f64>> = window
            .iter()
            .scan(0.0, |total, value| {
                *total += value;
                Some(Some(*total))
            })
            .collect();
        curve.extend(std::iter::repeat(None).take(remaining - 1));
        curve.push(Some(target_sum));

        let filled = fill_curve(&curve, self.resolve_fit(lookback))?;

        Ok(filled
            .windows(2)
            .skip(lookback - 1)
            .map(|pair| (pair[1] - pair[0]).round_ties_even() as i64)
            .collect())
    }

    fn resolve_fit(&self, lookback: usize) -> Fit {
        match self.curve_fit {
            CurveFit::Quadratic => Fit::Quadratic,
            CurveFit::Pchip => Fit::Pchip,
            CurveFit::Auto if lookback < PCHIP_MIN_LOOKBACK => Fit::Quadratic,
            CurveFit::Auto => Fit::Pchip,
        }
    }
}
