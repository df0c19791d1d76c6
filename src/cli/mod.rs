//! Command-line parsing for the price/rainfall analysis.
//!
//! Argument parsing stays here; turning flags into an `AnalysisConfig` and
//! dispatching happens in `app`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::{Commodity, DEFAULT_ALPHA, DEFAULT_PRICE_FLOOR};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "rainprice",
    version,
    about = "Relate daily commodity prices to local rainfall"
)]
pub struct Cli {
    /// More log output (-v debug, -vv trace). Overridden by RUST_LOG.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, clean and analyze one commodity; print the report and optionally plot/export.
    Analyze(AnalyzeArgs),
    /// Launch the interactive TUI.
    ///
    /// Runs the same pipeline as `analyze`, rendered with Ratatui.
    Tui(AnalyzeArgs),
    /// List the supported commodities.
    Commodities,
    /// Re-print the text report from a saved JSON summary.
    Show(ShowArgs),
}

/// Options shared by `analyze` and `tui`.
#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Commodity to analyze (sugar, chili, rice; gula/cabai/beras also accepted).
    #[arg(short = 'c', long, value_enum, default_value_t = Commodity::Sugar)]
    pub commodity: Commodity,

    /// Province id of the price grid.
    #[arg(long, default_value_t = 27)]
    pub province_id: u32,

    /// Regency id of the price grid.
    #[arg(long, default_value = "72")]
    pub regency_id: String,

    /// Market id of the price grid (empty = all markets).
    #[arg(long, default_value = "")]
    pub market_id: String,

    /// Latitude of the weather location.
    #[arg(long, default_value_t = -4.04, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude of the weather location.
    #[arg(long, default_value_t = 122.49, allow_negative_numbers = true)]
    pub lon: f64,

    /// Number of days to look back from the end date.
    #[arg(short = 'n', long, default_value_t = 365)]
    pub ndays: u32,

    /// Last day of the window (YYYY-MM-DD); defaults to today.
    #[arg(long, value_name = "DATE")]
    pub end_date: Option<NaiveDate>,

    /// Location label used in report headers.
    #[arg(long, default_value = "Kendari")]
    pub location: String,

    /// Use seeded synthetic data instead of the live sources.
    #[arg(long)]
    pub demo: bool,

    /// Seed for `--demo`.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Weather API key (defaults to RAINPRICE_WEATHER_API_KEY, also read from .env).
    #[arg(long)]
    pub weather_api_key: Option<String>,

    /// Prices at or below this value are dropped as invalid.
    #[arg(long, default_value_t = DEFAULT_PRICE_FLOOR)]
    pub price_floor: f64,

    /// Significance level for the dry/wet comparison.
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    pub alpha: f64,

    /// Disable the terminal chart.
    #[arg(long)]
    pub no_plot: bool,

    /// Chart width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Chart height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Write the chart to an SVG file.
    #[arg(long, value_name = "SVG")]
    pub chart: Option<PathBuf>,

    /// Export the cleaned daily table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the run summary (statistics, test, conclusion) to JSON.
    #[arg(long = "export-summary", value_name = "JSON")]
    pub export_summary: Option<PathBuf>,
}

/// Options for re-printing a saved summary.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Summary JSON produced by `rainprice analyze --export-summary`.
    #[arg(value_name = "JSON")]
    pub summary: PathBuf,
}
