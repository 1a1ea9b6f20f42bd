//! Core types for the weightcast pipeline
//!
//! This module defines the tables that flow between stages: raw readings, the
//! gap-free daily series, rolling aggregates, weekly trend and target rows,
//! the forecast for the open week and the final report.

use crate::config::EngineConfig;
use crate::error::ComputeError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Days in a target week
pub const DAYS_PER_WEEK: usize = 7;

/// Sunday closing the week that contains `date`
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    let days_left = 6 - date.weekday().num_days_from_monday();
    date + Duration::days(i64::from(days_left))
}

/// A single body-weight measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyReading {
    /// Calendar day of the measurement
    pub date: NaiveDate,
    /// Mass in grams
    #[serde(alias = "weight_in_grams")]
    pub value: f64,
}

impl DailyReading {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }

    /// Build a reading from an ISO-8601 calendar date (`YYYY-MM-DD`)
    pub fn parse(date: &str, value: f64) -> Result<Self, ComputeError> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|e| ComputeError::DateParseError(format!("'{date}': {e}")))?;
        Ok(Self { date, value })
    }
}

/// Gap-free daily series, one value per calendar day
///
/// Only the resampler builds series from raw readings; once built a series is
/// never modified and every later stage borrows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySeries {
    start: NaiveDate,
    values: Vec<f64>,
}

impl DailySeries {
    /// Series of consecutive days beginning at `start`
    pub fn from_values(start: NaiveDate, values: Vec<f64>) -> Result<Self, ComputeError> {
        if values.is_empty() {
            return Err(ComputeError::InsufficientData(
                "a daily series needs at least one day".to_string(),
            ));
        }
        Ok(Self { start, values })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Date of the most recent value
    pub fn end(&self) -> NaiveDate {
        self.date_at(self.values.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Date at position `index`
    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start + Duration::days(index as i64)
    }

    /// Position of `date`, if the series covers it
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.start).num_days();
        if offset < 0 || offset as usize >= self.values.len() {
            None
        } else {
            Some(offset as usize)
        }
    }

    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.index_of(date).map(|i| self.values[i])
    }

    /// Last `n` values (all of them when the series is shorter)
    pub fn tail(&self, n: usize) -> &[f64] {
        &self.values[self.values.len().saturating_sub(n)..]
    }

    pub fn iter(&self) -> impl Iterator<Item = DailyReading> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, &value)| DailyReading::new(self.date_at(i), value))
    }
}

/// Trailing mean over a fixed window, aligned with a daily series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingAggregate {
    window: usize,
    start: NaiveDate,
    values: Vec<Option<f64>>,
}

impl RollingAggregate {
    pub(crate) fn new(window: usize, start: NaiveDate, values: Vec<Option<f64>>) -> Self {
        Self {
            window,
            start,
            values,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Per-day means; `None` until a full window of history exists
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        let offset = (date - self.start).num_days();
        if offset < 0 {
            return None;
        }
        self.values.get(offset as usize).copied().flatten()
    }
}

/// Daily row handed to the chart renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTrend {
    pub date: NaiveDate,
    pub weight_in_grams: f64,
    pub avg_7d: Option<f64>,
    pub avg_14d: Option<f64>,
}

/// Rolling aggregates sampled on a week's last day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTrend {
    /// Sunday closing the week
    pub week_end: NaiveDate,
    pub avg_7d: Option<f64>,
    /// Difference to the previous week's 7-day aggregate
    pub change_7d: Option<f64>,
    pub avg_14d: Option<f64>,
    /// Difference to the previous week's 14-day aggregate
    pub change_14d: Option<f64>,
    /// The week's Sunday lies after the latest reading
    pub in_progress: bool,
}

/// Weekly row with the targets derived from the previous week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySnapshot {
    pub week_end: NaiveDate,
    pub avg_7d: Option<f64>,
    pub change_7d: Option<f64>,
    pub avg_14d: Option<f64>,
    pub change_14d: Option<f64>,
    pub target_change_7d: Option<i64>,
    pub target_7d: Option<i64>,
    pub target_change_14d: Option<i64>,
    pub target_14d: Option<i64>,
    /// Upcoming week that only carries targets
    pub placeholder: bool,
}

/// One forecast day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub weight_in_grams: i64,
}

/// Weights needed on each remaining day of the open week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    /// Sunday closing the forecast week
    pub week_end: NaiveDate,
    /// Target weekly average (grams)
    pub target_avg: i64,
    /// Days of the week already measured
    pub passed_days: usize,
    /// Readings already taken this week, oldest first
    pub elapsed: Vec<f64>,
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn remaining_days(&self) -> usize {
        self.points.len()
    }

    pub fn values(&self) -> Vec<i64> {
        self.points.iter().map(|p| p.weight_in_grams).collect()
    }
}

/// Outcome of recomputing the week's average from elapsed and forecast days
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub target: i64,
    pub achieved: i64,
    pub matches: bool,
    pub message: String,
}

/// Everything one run produces for the renderer and sender
#[derive(Debug, Clone, Serialize)]
pub struct WeightReport {
    pub run_id: String,
    pub computed_at: DateTime<Utc>,
    pub config: EngineConfig,
    pub daily: Vec<DailyTrend>,
    pub weekly: Vec<WeeklySnapshot>,
    pub forecast: Option<ForecastSeries>,
    pub verification: Option<Verification>,
}
