//! weightcast CLI - Command-line interface for the weightcast engine
//!
//! Commands:
//! - report: Process a weigh-in payload into daily, weekly and forecast tables
//! - forecast: Print only this week's forecast and its self-check
//! - config: Print the effective configuration

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use weightcast::adapters::{GarminWeighInAdapter, ReadingListAdapter, WeighInAdapter};
use weightcast::{
    CurveFit, EngineConfig, InterpolationMode, WeightProcessor, PRODUCER_NAME, WEIGHTCAST_VERSION,
};

/// weightcast - Weekly weight targets and the daily weights that reach them
#[derive(Parser)]
#[command(name = "weightcast")]
#[command(version = WEIGHTCAST_VERSION)]
#[command(about = "Forecast the daily weights needed to hit this week's target", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a weigh-in payload into the full report
    Report {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Payload layout
        #[arg(long, default_value = "garmin")]
        source: SourceFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Print this week's forecast and its self-check
    Forecast {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Payload layout
        #[arg(long, default_value = "garmin")]
        source: SourceFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Print the effective configuration
    Config {
        #[command(flatten)]
        overrides: ConfigOverrides,
    },
}

/// Flags that take precedence over environment configuration
#[derive(Args)]
struct ConfigOverrides {
    /// Fractional weekly change of the rolling average (e.g. -0.005)
    #[arg(long, allow_hyphen_values = true)]
    target_weekly_change: Option<f64>,

    /// Minimum look-back days for the forecast curve
    #[arg(long)]
    lookback_minimum: Option<usize>,

    /// Gap-filling policy
    #[arg(long)]
    interpolation_mode: Option<ModeArg>,

    /// Cumulative-curve fitting method
    #[arg(long)]
    curve_fit: Option<FitArg>,
}

#[derive(Clone, ValueEnum)]
enum SourceFormat {
    /// Garmin Connect weigh-ins payload
    Garmin,
    /// JSON array of {"date", "value"} objects
    Readings,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Pad,
    Linear,
}

#[derive(Clone, Copy, ValueEnum)]
enum FitArg {
    Auto,
    Quadratic,
    Pchip,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), WeightcastCliError> {
    match cli.command {
        Commands::Report {
            input,
            output,
            source,
            output_format,
            overrides,
        } => cmd_report(&input, &output, source, output_format, overrides),

        Commands::Forecast {
            input,
            source,
            output_format,
            overrides,
        } => cmd_forecast(&input, source, output_format, overrides),

        Commands::Config { overrides } => cmd_config(overrides),
    }
}

fn cmd_report(
    input: &Path,
    output: &Path,
    source: SourceFormat,
    output_format: OutputFormat,
    overrides: ConfigOverrides,
) -> Result<(), WeightcastCliError> {
    let processor = WeightProcessor::new(effective_config(overrides)?)?;
    let raw_json = read_input(input)?;
    let report = processor.process_payload(adapter_for(&source), &raw_json)?;

    let output_data = format_output(&report, &output_format)?;

    if output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
        tracing::info!(path = %output.display(), run_id = %report.run_id, "report written");
    }

    Ok(())
}

fn cmd_forecast(
    input: &Path,
    source: SourceFormat,
    output_format: OutputFormat,
    overrides: ConfigOverrides,
) -> Result<(), WeightcastCliError> {
    let processor = WeightProcessor::new(effective_config(overrides)?)?;
    let raw_json = read_input(input)?;
    let report = processor.process_payload(adapter_for(&source), &raw_json)?;

    let (Some(forecast), Some(verification)) = (report.forecast, report.verification) else {
        return Err(WeightcastCliError::NoForecast);
    };

    let summary = ForecastSummary {
        run_id: report.run_id,
        forecast,
        verification,
    };
    println!("{}", format_output(&summary, &output_format)?);

    Ok(())
}

fn cmd_config(overrides: ConfigOverrides) -> Result<(), WeightcastCliError> {
    let config = effective_config(overrides)?;
    let summary = ConfigSummary {
        producer: PRODUCER_NAME.to_string(),
        version: WEIGHTCAST_VERSION.to_string(),
        config,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn effective_config(overrides: ConfigOverrides) -> Result<EngineConfig, WeightcastCliError> {
    let mut config = EngineConfig::from_env()?;

    if let Some(pct) = overrides.target_weekly_change {
        config.target_weekly_change_percentage = pct;
    }
    if let Some(days) = overrides.lookback_minimum {
        config.lookback_minimum = days;
    }
    if let Some(mode) = overrides.interpolation_mode {
        config.interpolation_mode = match mode {
            ModeArg::Pad => InterpolationMode::Pad,
            ModeArg::Linear => InterpolationMode::Linear,
        };
    }
    if let Some(fit) = overrides.curve_fit {
        config.curve_fit = match fit {
            FitArg::Auto => CurveFit::Auto,
            FitArg::Quadratic => CurveFit::Quadratic,
            FitArg::Pchip => CurveFit::Pchip,
        };
    }

    config.validate()?;
    Ok(config)
}

fn adapter_for(source: &SourceFormat) -> &'static dyn WeighInAdapter {
    match source {
        SourceFormat::Garmin => &GarminWeighInAdapter,
        SourceFormat::Readings => &ReadingListAdapter,
    }
}

fn read_input(input: &Path) -> Result<String, WeightcastCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(WeightcastCliError::InteractiveStdin);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn format_output<T: serde::Serialize>(
    value: &T,
    format: &OutputFormat,
) -> Result<String, WeightcastCliError> {
    let data = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    };
    Ok(data)
}

#[derive(serde::Serialize)]
struct ForecastSummary {
    run_id: String,
    forecast: weightcast::ForecastSeries,
    verification: weightcast::Verification,
}

#[derive(serde::Serialize)]
struct ConfigSummary {
    producer: String,
    version: String,
    config: EngineConfig,
}

#[derive(Debug)]
enum WeightcastCliError {
    Io(io::Error),
    Compute(weightcast::ComputeError),
    Json(serde_json::Error),
    InteractiveStdin,
    NoForecast,
}

impl From<io::Error> for WeightcastCliError {
    fn from(e: io::Error) -> Self {
        WeightcastCliError::Io(e)
    }
}

impl From<weightcast::ComputeError> for WeightcastCliError {
    fn from(e: weightcast::ComputeError) -> Self {
        WeightcastCliError::Compute(e)
    }
}

impl From<serde_json::Error> for WeightcastCliError {
    fn from(e: serde_json::Error) -> Self {
        WeightcastCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<WeightcastCliError> for CliError {
    fn from(e: WeightcastCliError) -> Self {
        use weightcast::ComputeError;

        match e {
            WeightcastCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            WeightcastCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::InvalidConfig(_) => (
                        "CONFIG_ERROR",
                        Some("Check TARGET_WEEKLY_CHANGE_PERCENTAGE, LOOKBACK_MINIMUM, INTERPOLATION_MODE and CURVE_FIT"),
                    ),
                    ComputeError::InsufficientData(_) => (
                        "INSUFFICIENT_DATA",
                        Some("The payload needs at least one weigh-in"),
                    ),
                    ComputeError::ForecastComputation(_) => ("FORECAST_ERROR", None),
                    ComputeError::InvalidWeekState(_) => ("WEEK_STATE_ERROR", None),
                    ComputeError::ParseError(_)
                    | ComputeError::JsonError(_)
                    | ComputeError::DateParseError(_) => (
                        "PARSE_ERROR",
                        Some("Ensure --source matches the payload layout"),
                    ),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: hint.map(str::to_string),
                }
            }
            WeightcastCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            WeightcastCliError::InteractiveStdin => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a TTY; nothing was piped in".to_string(),
                hint: Some("Pipe a payload or pass --input <file>".to_string()),
            },
            WeightcastCliError::NoForecast => CliError {
                code: "NO_FORECAST".to_string(),
                message: "No forecast could be made for this week".to_string(),
                hint: Some("At least three weeks of history are needed for a target".to_string()),
            },
        }
    }
}
