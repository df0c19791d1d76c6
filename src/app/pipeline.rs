//! Shared analysis pipeline used by both the CLI and the TUI.
//!
//! fetch prices + weather -> normalize -> align/clean -> stats -> wet/dry test
//! -> conclusion
//!
//! Front-ends only deal with presentation; every hard error leaving this
//! module carries the run context (commodity and date range).

use chrono::NaiveDate;
use tracing::{info, info_span, warn};

use crate::data::{
    BiPriceClient, MsnWeatherClient, PriceFetcher, PriceQuery, SampleSource, WeatherFetcher,
    WeatherQuery,
};
use crate::domain::{
    AlignedRecord, AnalysisConfig, CleaningReport, ComparisonResult, ConclusionReport, DailySeries,
    DataSource, DateWindow, DescriptiveStats, RunContext,
};
use crate::error::AppError;
use crate::io::{align_and_clean, normalize_price_table, normalize_weather_table};
use crate::report::build_conclusion;
use crate::stats::{compare_wet_vs_dry, compute_stats};

/// All computed outputs of a single analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub context: RunContext,
    /// Significance level the comparison is interpreted at.
    pub alpha: f64,
    pub price_series: DailySeries,
    pub cleaned: Vec<AlignedRecord>,
    pub cleaning: CleaningReport,
    pub price_stats: Option<DescriptiveStats>,
    pub rain_stats: Option<DescriptiveStats>,
    pub comparison: ComparisonResult,
    pub conclusion: ConclusionReport,
}

/// Run the analysis with the fetchers selected by `config.source`.
pub fn run_analysis(config: &AnalysisConfig, today: NaiveDate) -> Result<AnalysisOutput, AppError> {
    let window = config.window(today);
    match config.source {
        DataSource::Live => {
            let context = run_context(config, window);
            let prices = BiPriceClient::new().map_err(|e| e.with_context(&context))?;
            let weather = MsnWeatherClient::from_env(config.weather_api_key.clone())
                .map_err(|e| e.with_context(&context))?;
            run_with_fetchers(config, window, &prices, &weather)
        }
        DataSource::Sample { seed } => {
            let source = SampleSource::new(seed);
            run_with_fetchers(config, window, &source, &source)
        }
    }
}

/// Run the analysis against explicit fetchers.
pub fn run_with_fetchers(
    config: &AnalysisConfig,
    window: DateWindow,
    prices: &dyn PriceFetcher,
    weather: &dyn WeatherFetcher,
) -> Result<AnalysisOutput, AppError> {
    let context = run_context(config, window);
    let _span = info_span!("analysis", %context).entered();
    info!("Starting analysis");

    let raw_prices = prices
        .fetch_prices(&PriceQuery {
            commodity: config.commodity,
            region: config.region.clone(),
            window,
        })
        .map_err(|e| e.with_context(&context))?;
    let chart = weather
        .fetch_weather(&WeatherQuery {
            latitude: config.latitude,
            longitude: config.longitude,
            window,
        })
        .map_err(|e| e.with_context(&context))?;

    let price_series = normalize_price_table(
        &raw_prices,
        config.commodity.keyword(),
        config.commodity.column_name(),
    )
    .map_err(|e| e.with_context(&context))?;
    let weather_table = normalize_weather_table(&chart).map_err(|e| e.with_context(&context))?;

    let (cleaned, cleaning) = align_and_clean(&price_series, &weather_table, &config.cleaning)
        .map_err(|e| e.with_context(&context))?;
    if cleaned.is_empty() {
        warn!(%context, "Every aligned row was dropped by cleaning");
    }

    let price: Vec<f64> = cleaned.iter().map(|r| r.price).collect();
    let rain: Vec<f64> = cleaned.iter().map(|r| r.rainfall_mm).collect();
    let price_stats = compute_stats(&price);
    let rain_stats = compute_stats(&rain);

    let comparison = compare_wet_vs_dry(&cleaned);
    let conclusion = build_conclusion(&cleaned, price_stats.as_ref());

    info!(
        rows = cleaned.len(),
        reason = ?comparison.reason,
        correlation = ?conclusion.correlation,
        "Analysis finished"
    );

    Ok(AnalysisOutput {
        context,
        alpha: config.alpha,
        price_series,
        cleaned,
        cleaning,
        price_stats,
        rain_stats,
        comparison,
        conclusion,
    })
}

fn run_context(config: &AnalysisConfig, window: DateWindow) -> RunContext {
    RunContext {
        commodity: config.commodity,
        window,
        location: config.location_label.clone(),
    }
}
