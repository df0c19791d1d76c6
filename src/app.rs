//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main that:
//! - parses CLI arguments and installs logging
//! - builds the analysis config
//! - runs the pipeline
//! - feeds the result to the selected report sinks

use std::io;
use std::path::Path;

use chrono::Local;
use clap::Parser;

use crate::cli::{AnalyzeArgs, Cli, Command};
use crate::domain::{AnalysisConfig, CleaningRules, Commodity, DataSource, Region};
use crate::error::AppError;
use crate::io::{CsvExport, JsonSummary, read_summary_json};
use crate::plot::{AsciiChart, SvgChart};
use crate::report::{ReportSink, TextReport, format_report};

pub mod pipeline;

/// Entry point for the `rainprice` binary.
pub fn run() -> Result<(), AppError> {
    // `rainprice` and `rainprice -c rice` behave like `rainprice analyze ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    // The TUI owns the terminal, so it runs without a stderr subscriber.
    if !matches!(cli.command, Command::Tui(_)) {
        crate::logging::init(cli.verbose, cli.quiet);
    }

    match cli.command {
        Command::Analyze(args) => handle_analyze(&args),
        Command::Tui(args) => crate::tui::run(config_from_args(&args)?),
        Command::Commodities => {
            print!("{}", format_commodities());
            Ok(())
        }
        Command::Show(args) => handle_show(&args.summary),
    }
}

fn handle_analyze(args: &AnalyzeArgs) -> Result<(), AppError> {
    let config = config_from_args(args)?;
    let output = pipeline::run_analysis(&config, Local::now().date_naive())?;

    for mut sink in sinks_for(&config) {
        sink.emit(&output)?;
    }
    Ok(())
}

fn handle_show(path: &Path) -> Result<(), AppError> {
    let summary = read_summary_json(path)?;
    println!("{}", format_report(&summary));
    Ok(())
}

/// Report sinks for a config, in output order.
pub fn sinks_for(config: &AnalysisConfig) -> Vec<Box<dyn ReportSink>> {
    let mut sinks: Vec<Box<dyn ReportSink>> = vec![Box::new(TextReport::new(io::stdout()))];
    if config.plot {
        sinks.push(Box::new(AsciiChart::new(
            io::stdout(),
            config.plot_width,
            config.plot_height,
        )));
    }
    if let Some(path) = &config.chart_path {
        sinks.push(Box::new(SvgChart::new(path.clone())));
    }
    if let Some(path) = &config.export_csv {
        sinks.push(Box::new(CsvExport { path: path.clone() }));
    }
    if let Some(path) = &config.export_summary {
        sinks.push(Box::new(JsonSummary { path: path.clone() }));
    }
    sinks
}

/// Validate flags and build the pipeline config.
pub fn config_from_args(args: &AnalyzeArgs) -> Result<AnalysisConfig, AppError> {
    if !(args.alpha > 0.0 && args.alpha < 1.0) {
        return Err(AppError::config(format!(
            "--alpha must be in (0, 1), got {}.",
            args.alpha
        )));
    }
    if !args.price_floor.is_finite() || args.price_floor < 0.0 {
        return Err(AppError::config(format!(
            "--price-floor must be a non-negative number, got {}.",
            args.price_floor
        )));
    }
    if args.ndays == 0 {
        return Err(AppError::config("--ndays must be at least 1."));
    }
    if !(-90.0..=90.0).contains(&args.lat) || !(-180.0..=180.0).contains(&args.lon) {
        return Err(AppError::config(format!(
            "Invalid coordinate lat={} lon={}.",
            args.lat, args.lon
        )));
    }

    Ok(AnalysisConfig {
        commodity: args.commodity,
        region: Region {
            province_id: args.province_id,
            regency_id: args.regency_id.clone(),
            market_id: args.market_id.clone(),
            ..Region::default()
        },
        latitude: args.lat,
        longitude: args.lon,
        lookback_days: args.ndays,
        end_date: args.end_date,
        location_label: args.location.clone(),
        source: if args.demo {
            DataSource::Sample { seed: args.seed }
        } else {
            DataSource::Live
        },
        weather_api_key: args.weather_api_key.clone(),
        cleaning: CleaningRules {
            price_floor: args.price_floor,
        },
        alpha: args.alpha,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        chart_path: args.chart.clone(),
        export_csv: args.export.clone(),
        export_summary: args.export_summary.clone(),
    })
}

/// Table of supported commodities.
pub fn format_commodities() -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<8} {:<18} {:<8} {:<16} {}\n",
        "name", "label", "keyword", "column", "categories"
    ));
    for c in Commodity::ALL {
        out.push_str(&format!(
            "{:<8} {:<18} {:<8} {:<16} {}\n",
            c.to_string(),
            c.label(),
            c.keyword(),
            c.column_name(),
            c.category_ids().join(",")
        ));
    }
    out
}

/// Rewrite argv so `rainprice` defaults to `rainprice analyze`.
///
/// Rules:
/// - `rainprice`                      -> `rainprice analyze`
/// - `rainprice -c rice ...`          -> `rainprice analyze -c rice ...`
/// - `rainprice --help/--version/-h`  -> unchanged (top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("analyze".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "analyze" | "tui" | "commodities" | "show");
    if is_subcommand {
        return argv;
    }

    // A leading flag means "analyze flags".
    if arg1.starts_with('-') {
        argv.insert(1, "analyze".to_string());
    }
    argv
}
