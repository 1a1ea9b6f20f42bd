//! Weigh-in payload adapters
//!
//! This module provides adapters that parse downloaded source payloads into
//! raw daily readings. Adapters only map fields; gap filling and dedup happen
//! in the resampler.

mod garmin;
mod readings;

pub use garmin::GarminWeighInAdapter;
pub use readings::ReadingListAdapter;

use crate::error::ComputeError;
use crate::types::DailyReading;

/// Trait for weigh-in payload adapters
pub trait WeighInAdapter {
    /// Parse raw JSON into readings, in source order
    fn parse(&self, raw_json: &str) -> Result<Vec<DailyReading>, ComputeError>;
}
