//! Pipeline orchestration
//!
//! This module provides the public API for weightcast.
//! It runs every stage from raw readings to the report handed to the chart
//! renderer and notification sender.

use crate::adapters::{GarminWeighInAdapter, ReadingListAdapter, WeighInAdapter};
use crate::aggregator::TrendAggregator;
use crate::config::EngineConfig;
use crate::error::ComputeError;
use crate::forecaster::DailyForecaster;
use crate::resampler::Resampler;
use crate::targets::TargetDeriver;
use crate::types::{week_ending, DailyReading, DailySeries, WeeklyTrend, WeightReport};
use chrono::{Duration, Utc};
use uuid::Uuid;

/// Convert a raw Garmin weigh-ins payload into a report.
///
/// # Arguments
/// * `raw_json` - Garmin Connect weigh-ins JSON
/// * `config` - Engine configuration
///
/// # Example
/// ```ignore
/// let report = garmin_to_report(&garmin_json, EngineConfig::from_env()?)?;
/// ```
pub fn garmin_to_report(
    raw_json: &str,
    config: EngineConfig,
) -> Result<WeightReport, ComputeError> {
    WeightProcessor::new(config)?.process_payload(&GarminWeighInAdapter, raw_json)
}

/// Convert a `[{date, value}]` JSON array into a report.
pub fn readings_to_report(
    raw_json: &str,
    config: EngineConfig,
) -> Result<WeightReport, ComputeError> {
    WeightProcessor::new(config)?.process_payload(&ReadingListAdapter, raw_json)
}

/// Processor holding the configured stages.
///
/// Every call recomputes from the readings it is given; nothing is carried
/// between runs.
pub struct WeightProcessor {
    config: EngineConfig,
    resampler: Resampler,
    deriver: TargetDeriver,
    forecaster: DailyForecaster,
}

impl WeightProcessor {
    /// Create a processor after validating `config`
    pub fn new(config: EngineConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self {
            resampler: Resampler::new(config.interpolation_mode),
            deriver: TargetDeriver::new(config.target_weekly_change_percentage),
            forecaster: DailyForecaster::from_config(&config),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse a payload with `adapter` and process it
    pub fn process_payload(
        &self,
        adapter: &dyn WeighInAdapter,
        raw_json: &str,
    ) -> Result<WeightReport, ComputeError> {
        let readings = adapter.parse(raw_json)?;
        self.process(&readings)
    }

    /// Run all stages.
    ///
    /// Pipeline stages:
    /// 1. Resampler - gap-free daily series
    /// 2. TrendAggregator - daily rolling means and weekly trends
    /// 3. TargetDeriver - weekly targets, ending with the placeholder week
    /// 4. DailyForecaster - remaining days of the placeholder week, self-checked
    pub fn process(&self, readings: &[DailyReading]) -> Result<WeightReport, ComputeError> {
        // Stage 1: Fill gaps
        let series = self.resampler.resample(readings)?;

        // Stage 2: Aggregate
        let daily = TrendAggregator::daily_trends(&series);
        let trends = TrendAggregator::weekly_trends(&series);
        let mut weekly_rows = TrendAggregator::weekly_changes(&trends);

        // Stage 3: Targets
        let weekly = if weekly_rows.is_empty() {
            tracing::warn!(
                days = series.len(),
                "not enough history for a weekly change; skipping targets"
            );
            Vec::new()
        } else {
            weekly_rows.push(placeholder_week(&series));
            self.deriver.apply(&weekly_rows)
        };

        // Stage 4: Forecast the open week
        let mut forecast = None;
        let mut verification = None;
        if let Some(open_week) = weekly.last() {
            match open_week.target_7d {
                Some(target) => {
                    match self.forecaster.forecast(&series, open_week.week_end, target) {
                        Ok(outcome) => {
                            forecast = Some(outcome.forecast);
                            verification = Some(outcome.verification);
                        }
                        Err(ComputeError::InvalidWeekState(reason)) => {
                            tracing::warn!(%reason, "skipping forecast this cycle");
                        }
                        Err(e) => return Err(e),
                    }
                }
                None => tracing::warn!(week_end = %open_week.week_end, "open week has no target"),
            }
        }

        Ok(WeightReport {
            run_id: Uuid::new_v4().to_string(),
            computed_at: Utc::now(),
            config: self.config.clone(),
            daily,
            weekly,
            forecast,
            verification,
        })
    }
}

/// Row for the week still to be reached: the week of the latest reading, or
/// the following week once the latest reading is a Sunday
fn placeholder_week(series: &DailySeries) -> WeeklyTrend {
    let last = series.end();
    let mut week_end = week_ending(last);
    if week_end == last {
        week_end += Duration::days(7);
    }

    WeeklyTrend {
        week_end,
        avg_7d: None,
        change_7d: None,
        avg_14d: None,
        change_14d: None,
        in_progress: true,
    }
}
