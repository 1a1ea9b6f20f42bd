//! Weekly target derivation
//!
//! Each week's target average is last week's realized aggregate plus last
//! week's target delta, where the delta is the aggregate scaled by the
//! configured weekly change fraction. The first week has no predecessor and
//! targets its own aggregate. Targets never depend on the week they apply to.

use crate::types::{WeeklySnapshot, WeeklyTrend};

/// One derived target row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetRow {
    /// Delta this week sets for the next one; `None` for the placeholder week
    pub change: Option<i64>,
    pub target: Option<i64>,
}

/// Deriver for weekly target averages
pub struct TargetDeriver {
    weekly_change_percentage: f64,
}

impl Default for TargetDeriver {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl TargetDeriver {
    pub fn new(weekly_change_percentage: f64) -> Self {
        Self {
            weekly_change_percentage,
        }
    }

    /// Derive targets for a weekly aggregate column
    ///
    /// The last element is the placeholder week: it gets a target but no
    /// change of its own.
    pub fn derive(&self, aggregates: &[Option<f64>]) -> Vec<TargetRow> {
        let last = aggregates.len().saturating_sub(1);
        // Targets are built on the whole-gram weekly table
        let aggregates: Vec<Option<i64>> = aggregates.iter().map(|a| a.map(round_grams)).collect();

        let changes: Vec<Option<i64>> = aggregates
            .iter()
            .enumerate()
            .map(|(i, aggregate)| {
                if i == last {
                    None
                } else {
                    aggregate.map(|a| round_grams(a as f64 * self.weekly_change_percentage))
                }
            })
            .collect();

        aggregates
            .iter()
            .enumerate()
            .map(|(i, aggregate)| {
                let target = if i == 0 {
                    *aggregate
                } else {
                    match (aggregates[i - 1], changes[i - 1]) {
                        (Some(prev), Some(change)) => Some(prev + change),
                        _ => None,
                    }
                };
                TargetRow {
                    change: changes[i],
                    target,
                }
            })
            .collect()
    }

    /// Attach 7- and 14-day targets to weekly rows
    ///
    /// `trends` must end with the placeholder week.
    pub fn apply(&self, trends: &[WeeklyTrend]) -> Vec<WeeklySnapshot> {
        let short: Vec<Option<f64>> = trends.iter().map(|t| t.avg_7d).collect();
        let long: Vec<Option<f64>> = trends.iter().map(|t| t.avg_14d).collect();
        let short_targets = self.derive(&short);
        let long_targets = self.derive(&long);
        let last = trends.len().saturating_sub(1);

        trends
            .iter()
            .zip(short_targets.into_iter().zip(long_targets))
            .enumerate()
            .map(|(i, (trend, (short_row, long_row)))| WeeklySnapshot {
                week_end: trend.week_end,
                avg_7d: trend.avg_7d,
                change_7d: trend.change_7d,
                avg_14d: trend.avg_14d,
                change_14d: trend.change_14d,
                target_change_7d: short_row.change,
                target_7d: short_row.target,
                target_change_14d: long_row.change,
                target_14d: long_row.target,
                placeholder: i == last,
            })
            .collect()
    }
}

fn round_grams(value: f64) -> i64 {
    value.round_ties_even() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use pretty_assertions::assert_eq;

    fn aggregates_70_to_99() -> Vec<Option<f64>> {
        (70..100).map(|v| Some(v as f64)).collect()
    }

    #[test]
    fn test_five_percent_change() {
        let rows = TargetDeriver::new(0.05).derive(&aggregates_70_to_99());

        let mut expected_changes = vec![4; 21];
        expected_changes.extend(vec![5; 8]);
        let changes: Vec<i64> = rows[..29].iter().map(|r| r.change.unwrap()).collect();
        assert_eq!(changes, expected_changes);
        assert_eq!(rows[29].change, None);

        let mut expected_targets = vec![70];
        expected_targets.extend(74..=94);
        expected_targets.extend(96..=103);
        let targets: Vec<i64> = rows.iter().map(|r| r.target.unwrap()).collect();
        assert_eq!(targets, expected_targets);
    }

    #[test]
    fn test_zero_change_targets_previous_week() {
        let rows = TargetDeriver::default().derive(&[Some(80100.4), Some(80300.0), None]);

        assert_eq!(rows[0].target, Some(80100));
        assert_eq!(rows[1].target, Some(80100));
        assert_eq!(rows[2].target, Some(80300));
        assert_eq!(rows[0].change, Some(0));
        assert_eq!(rows[2].change, None);
    }

    #[test]
    fn test_undefined_aggregate_propagates() {
        let rows = TargetDeriver::new(0.01).derive(&[None, Some(80000.0), Some(80000.0)]);

        assert_eq!(rows[0].target, None);
        assert_eq!(rows[0].change, None);
        assert_eq!(rows[1].target, None);
        assert_eq!(rows[2].target, Some(80800));
    }

    #[test]
    fn test_negative_change_for_loss() {
        let rows = TargetDeriver::new(-0.005).derive(&[Some(90000.0), None]);
        assert_eq!(rows[0].change, Some(-450));
        assert_eq!(rows[1].target, Some(89550));
    }

    #[test]
    fn test_change_uses_whole_gram_aggregate() {
        // 80.5 g rounds to 80 g before the change is applied
        let rows = TargetDeriver::new(0.1).derive(&[Some(80.5), None]);
        assert_eq!(rows[0].target, Some(80));
        assert_eq!(rows[0].change, Some(8));
        assert_eq!(rows[1].target, Some(88));
    }

    #[test]
    fn test_empty_column() {
        assert!(TargetDeriver::default().derive(&[]).is_empty());
    }

    #[test]
    fn test_apply_marks_placeholder() {
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let trend = |weeks: i64, avg: Option<f64>| WeeklyTrend {
            week_end: sunday + Duration::weeks(weeks),
            avg_7d: avg,
            change_7d: None,
            avg_14d: avg.map(|a| a - 100.0),
            change_14d: None,
            in_progress: false,
        };
        let trends = vec![trend(0, Some(80000.0)), trend(1, Some(80200.0)), trend(2, None)];

        let snapshots = TargetDeriver::new(0.001).apply(&trends);

        assert_eq!(snapshots.len(), 3);
        assert!(!snapshots[1].placeholder);
        assert!(snapshots[2].placeholder);
        assert_eq!(snapshots[1].target_7d, Some(80080));
        assert_eq!(snapshots[2].target_7d, Some(80280));
        assert_eq!(snapshots[2].target_14d, Some(80180));
        assert_eq!(snapshots[2].target_change_7d, None);
    }
}
