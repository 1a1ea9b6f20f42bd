//! Gap filling
//!
//! Turns sparse readings into one value per calendar day between the first
//! and last reading. Known days keep their value; missing days are
//! synthesized according to the configured [`InterpolationMode`].

use crate::config::InterpolationMode;
use crate::error::ComputeError;
use crate::types::{DailyReading, DailySeries};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Resampler producing gap-free daily series
pub struct Resampler {
    mode: InterpolationMode,
}

impl Default for Resampler {
    fn default() -> Self {
        Self::new(InterpolationMode::default())
    }
}

impl Resampler {
    pub fn new(mode: InterpolationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> InterpolationMode {
        self.mode
    }

    /// Resample readings to a daily series
    ///
    /// Readings may arrive in any order. When a date appears more than once
    /// the first reading in source order is kept.
    pub fn resample(&self, readings: &[DailyReading]) -> Result<DailySeries, ComputeError> {
        let points: Vec<(NaiveDate, f64)> = first_per_day(readings)?.into_iter().collect();

        let Some(&(start, first)) = points.first() else {
            return Err(ComputeError::InsufficientData(
                "no readings to resample".to_string(),
            ));
        };

        let mut values = vec![first];

        for pair in points.windows(2) {
            let (from_date, from_value) = pair[0];
            let (to_date, to_value) = pair[1];
            let span = (to_date - from_date).num_days();

            for step in 1..span {
                let filled = match self.mode {
                    InterpolationMode::Pad => from_value,
                    InterpolationMode::Linear => {
                        let fraction = step as f64 / span as f64;
                        (from_value + (to_value - from_value) * fraction).round_ties_even()
                    }
                };
                values.push(filled);
            }
            values.push(to_value);
        }

        tracing::debug!(
            mode = self.mode.as_str(),
            readings = readings.len(),
            days = values.len(),
            "resampled daily series"
        );

        DailySeries::from_values(start, values)
    }
}

/// Collapse readings to one per date, keeping the first seen
fn first_per_day(readings: &[DailyReading]) -> Result<BTreeMap<NaiveDate, f64>, ComputeError> {
    let mut by_date = BTreeMap::new();
    for reading in readings {
        if !reading.value.is_finite() {
            return Err(ComputeError::InsufficientData(format!(
                "reading on {} is not a finite number",
                reading.date
            )));
        }
        by_date.entry(reading.date).or_insert(reading.value);
    }
    Ok(by_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reading(date: &str, value: f64) -> DailyReading {
        DailyReading::parse(date, value).unwrap()
    }

    #[test]
    fn test_linear_fill_rounds_to_grams() {
        let readings = vec![
            reading("2023-01-01", 70.0),
            reading("2023-01-03", 72.0),
            reading("2023-01-05", 74.0),
        ];

        let series = Resampler::new(InterpolationMode::Linear)
            .resample(&readings)
            .unwrap();

        assert_eq!(series.start(), NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(series.values(), &[70.0, 71.0, 72.0, 73.0, 74.0]);
    }

    #[test]
    fn test_single_gap_linear_is_mean_pad_is_earlier() {
        let readings = vec![reading("2023-03-01", 80100.0), reading("2023-03-03", 80500.0)];

        let linear = Resampler::new(InterpolationMode::Linear)
            .resample(&readings)
            .unwrap();
        assert_eq!(linear.values()[1], 80300.0);

        let pad = Resampler::new(InterpolationMode::Pad)
            .resample(&readings)
            .unwrap();
        assert_eq!(pad.values()[1], 80100.0);
    }

    #[test]
    fn test_linear_fill_over_wide_gap() {
        let readings = vec![reading("2023-03-01", 80000.0), reading("2023-03-04", 80100.0)];

        let series = Resampler::default().resample(&readings).unwrap();

        // 80033.33 and 80066.67
        assert_eq!(series.values(), &[80000.0, 80033.0, 80067.0, 80100.0]);
    }

    #[test]
    fn test_unordered_input_and_first_duplicate_wins() {
        let readings = vec![
            reading("2023-01-03", 72.0),
            reading("2023-01-01", 70.0),
            reading("2023-01-03", 99.0),
            reading("2023-01-02", 71.5),
        ];

        let series = Resampler::default().resample(&readings).unwrap();
        assert_eq!(series.values(), &[70.0, 71.5, 72.0]);
    }

    #[test]
    fn test_gap_free_series_is_unchanged() {
        let readings: Vec<DailyReading> = (0..10)
            .map(|i| {
                DailyReading::new(
                    NaiveDate::from_ymd_opt(2024, 2, 1).unwrap() + chrono::Duration::days(i),
                    80000.0 + (i as f64) * 37.5,
                )
            })
            .collect();

        for mode in [InterpolationMode::Pad, InterpolationMode::Linear] {
            let once = Resampler::new(mode).resample(&readings).unwrap();
            let twice = Resampler::new(mode)
                .resample(&once.iter().collect::<Vec<_>>())
                .unwrap();

            let original: Vec<f64> = readings.iter().map(|r| r.value).collect();
            assert_eq!(once.values(), original.as_slice());
            assert_eq!(twice, once);
        }
    }

    #[test]
    fn test_empty_input_fails() {
        let result = Resampler::default().resample(&[]);
        assert!(matches!(result, Err(ComputeError::InsufficientData(_))));
    }

    #[test]
    fn test_non_finite_reading_fails() {
        let result = Resampler::default().resample(&[reading("2023-01-01", f64::NAN)]);
        assert!(matches!(result, Err(ComputeError::InsufficientData(_))));
    }
}
