//! Trend aggregation
//!
//! Rolling means over the daily series and their weekly view. Weeks end on
//! Sunday; a week's aggregate is the rolling mean on its last day present in
//! the series, and its change is the difference to the previous week.

use crate::error::ComputeError;
use crate::types::{week_ending, DailySeries, DailyTrend, RollingAggregate, WeeklyTrend};
use chrono::Duration;

/// Short trend window in days
pub const SHORT_WINDOW: usize = 7;

/// Long trend window in days
pub const LONG_WINDOW: usize = 14;

/// Aggregator for rolling and weekly trends
pub struct TrendAggregator;

impl TrendAggregator {
    /// Trailing mean of `window` days for every day of the series
    pub fn rolling_mean(
        series: &DailySeries,
        window: usize,
    ) -> Result<RollingAggregate, ComputeError> {
        if window == 0 {
            return Err(ComputeError::InvalidConfig(
                "rolling window must be at least one day".to_string(),
            ));
        }
        Ok(RollingAggregate::new(
            window,
            series.start(),
            trailing_means(series.values(), window),
        ))
    }

    /// Daily rows with the 7- and 14-day means
    pub fn daily_trends(series: &DailySeries) -> Vec<DailyTrend> {
        let short = trailing_means(series.values(), SHORT_WINDOW);
        let long = trailing_means(series.values(), LONG_WINDOW);

        series
            .iter()
            .zip(short.into_iter().zip(long))
            .map(|(reading, (avg_7d, avg_14d))| DailyTrend {
                date: reading.date,
                weight_in_grams: reading.value,
                avg_7d,
                avg_14d,
            })
            .collect()
    }

    /// One row per Sunday-ending week, from the week of the first reading to
    /// the week of the latest one
    pub fn weekly_trends(series: &DailySeries) -> Vec<WeeklyTrend> {
        let short = trailing_means(series.values(), SHORT_WINDOW);
        let long = trailing_means(series.values(), LONG_WINDOW);
        let last = series.end();
        let final_week = week_ending(last);

        let mut rows: Vec<WeeklyTrend> = Vec::new();
        let mut week_end = week_ending(series.start());

        while week_end <= final_week {
            let Some(index) = series.index_of(week_end.min(last)) else {
                break;
            };
            let avg_7d = short[index];
            let avg_14d = long[index];

            let (change_7d, change_14d) = match rows.last() {
                Some(prev) => (
                    difference(avg_7d, prev.avg_7d),
                    difference(avg_14d, prev.avg_14d),
                ),
                None => (None, None),
            };

            rows.push(WeeklyTrend {
                week_end,
                avg_7d,
                change_7d,
                avg_14d,
                change_14d,
                in_progress: week_end > last,
            });

            week_end += Duration::days(7);
        }

        tracing::debug!(weeks = rows.len(), "computed weekly trends");
        rows
    }

    /// Completed weeks whose long-window change is defined
    ///
    /// Weeks too early in the history to have a change are dropped rather
    /// than reported as zero.
    pub fn weekly_changes(trends: &[WeeklyTrend]) -> Vec<WeeklyTrend> {
        trends
            .iter()
            .filter(|row| !row.in_progress && row.change_14d.is_some())
            .cloned()
            .collect()
    }
}

fn trailing_means(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let sum: f64 = values[i + 1 - window..=i].iter().sum();
            Some(sum / window as f64)
        })
        .collect()
}

fn difference(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    match (current, previous) {
        (Some(curr), Some(prev)) => Some(curr - prev),
        _ => None,
    }
}
