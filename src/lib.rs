//! weightcast - Daily body-weight trend and weekly target forecasting engine
//!
//! weightcast turns a sparse daily weight series into weekly targets and the
//! day-by-day weights needed to hit this week's target through a
//! deterministic pipeline: gap filling → rolling trends → weekly targets →
//! cumulative-sum forecast → self-check.
//!
//! ## Modules
//!
//! - **Adapters**: Parse downloaded weigh-in payloads (Garmin, plain reading lists)
//! - **Engine**: Resampler, trend aggregator, target deriver, forecaster and verifier
//! - **Pipeline**: One call from readings to a serializable report

pub mod adapters;
pub mod aggregator;
pub mod config;
pub mod error;
pub mod forecaster;
pub mod interpolation;
pub mod pipeline;
pub mod resampler;
pub mod targets;
pub mod types;
pub mod verifier;

pub use config::{CurveFit, EngineConfig, InterpolationMode};
pub use error::ComputeError;
pub use forecaster::{DailyForecaster, ForecastOutcome};
pub use pipeline::{garmin_to_report, readings_to_report, WeightProcessor};
pub use types::{
    DailyReading, DailySeries, ForecastSeries, Verification, WeeklySnapshot, WeightReport,
};

/// Crate version embedded in CLI output
pub const WEIGHTCAST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "weightcast";
