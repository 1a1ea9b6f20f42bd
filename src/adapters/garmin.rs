//! Garmin weigh-in adapter
//!
//! Parses the Garmin Connect weigh-ins payload and maps each daily summary to
//! a reading.

use crate::error::ComputeError;
use crate::types::DailyReading;
use serde::Deserialize;

use super::WeighInAdapter;

/// Garmin weigh-ins payload adapter
///
/// Takes the first weight metric of each daily summary, rounded to whole
/// grams. Summaries without a weight are skipped.
pub struct GarminWeighInAdapter;

impl WeighInAdapter for GarminWeighInAdapter {
    fn parse(&self, raw_json: &str) -> Result<Vec<DailyReading>, ComputeError> {
        let payload: GarminWeighIns = serde_json::from_str(raw_json)?;
        let summaries = payload.daily_weight_summaries.ok_or_else(|| {
            ComputeError::ParseError("missing dailyWeightSummaries".to_string())
        })?;

        let mut readings = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let weight = summary
                .all_weight_metrics
                .first()
                .and_then(|metric| metric.weight);

            match weight {
                Some(grams) => {
                    readings.push(DailyReading::parse(
                        &summary.summary_date,
                        grams.round_ties_even(),
                    )?);
                }
                None => {
                    tracing::debug!(date = %summary.summary_date, "skipping summary without weight");
                }
            }
        }

        Ok(readings)
    }
}

// Garmin API response structures

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GarminWeighIns {
    daily_weight_summaries: Option<Vec<GarminWeightSummary>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GarminWeightSummary {
    summary_date: String,
    #[serde(default)]
    all_weight_metrics: Vec<GarminWeightMetric>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GarminWeightMetric {
    /// Grams
    weight: Option<f64>,
}
