//! Plain reading-list adapter
//!
//! Accepts `[{"date": "YYYY-MM-DD", "value": grams}, ...]`.

use crate::error::ComputeError;
use crate::types::DailyReading;
use serde::Deserialize;

use super::WeighInAdapter;

/// Adapter for a JSON array of date/value pairs
pub struct ReadingListAdapter;

impl WeighInAdapter for ReadingListAdapter {
    fn parse(&self, raw_json: &str) -> Result<Vec<DailyReading>, ComputeError> {
        let entries: Vec<ReadingEntry> = serde_json::from_str(raw_json)?;
        entries
            .into_iter()
            .map(|entry| DailyReading::parse(&entry.date, entry.value))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ReadingEntry {
    date: String,
    #[serde(alias = "weight_in_grams")]
    value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reading_list() {
        let json = r#"[
            {"date": "2024-01-16", "value": 80100.5},
            {"date": "2024-01-14", "weight_in_grams": 80300}
        ]"#;

        let readings = ReadingListAdapter.parse(json).unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].date.to_string(), "2024-01-16");
        assert_eq!(readings[0].value, 80100.5);
        assert_eq!(readings[1].value, 80300.0);
    }

    #[test]
    fn test_bad_date() {
        let result = ReadingListAdapter.parse(r#"[{"date": "yesterday", "value": 1}]"#);
        assert!(matches!(result, Err(ComputeError::DateParseError(_))));
    }

    #[test]
    fn test_invalid_json() {
        let result = ReadingListAdapter.parse("not json");
        assert!(matches!(result, Err(ComputeError::JsonError(_))));
    }
}
