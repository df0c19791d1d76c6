use chrono::NaiveDate;
use serde_json::{Map, Value, json};

use rainprice::app::pipeline::{run_analysis, run_with_fetchers};
use rainprice::data::{
    PriceFetcher, PriceQuery, RawPriceTable, TrendChart, TrendEntry, WeatherFetcher, WeatherQuery,
};
use rainprice::domain::{
    AnalysisConfig, Commodity, ComparisonReason, CorrelationBand, DataSource, DateWindow,
    StabilityBand,
};
use rainprice::error::{AppError, ErrorKind};
use rainprice::io::{
    AnalysisSummary, CsvExport, JsonSummary, align_and_clean, normalize_price_table,
    normalize_weather_table, read_summary_json,
};
use rainprice::plot::{AsciiChart, SvgChart};
use rainprice::report::{ReportSink, TextReport, format_report};

/// Serves fixed tables and ignores the query.
struct StubSource {
    prices: Result<RawPriceTable, AppError>,
    weather: Result<TrendChart, AppError>,
}

impl PriceFetcher for StubSource {
    fn fetch_prices(&self, _query: &PriceQuery) -> Result<RawPriceTable, AppError> {
        self.prices.clone()
    }
}

impl WeatherFetcher for StubSource {
    fn fetch_weather(&self, _query: &WeatherQuery) -> Result<TrendChart, AppError> {
        self.weather.clone()
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn window() -> DateWindow {
    DateWindow {
        start: d(2024, 1, 1),
        end: d(2024, 1, 31),
    }
}

/// One sugar entity with a price cell per day, plus an unrelated entity.
fn price_table(start: NaiveDate, cells: &[Value]) -> RawPriceTable {
    let mut sugar = Map::new();
    sugar.insert("name".to_string(), json!("Gula Pasir Lokal"));
    let mut oil = Map::new();
    oil.insert("name".to_string(), json!("Minyak Goreng Curah"));
    for (i, cell) in cells.iter().enumerate() {
        let key = (start + chrono::Duration::days(i as i64))
            .format("%d/%m/%Y")
            .to_string();
        sugar.insert(key.clone(), cell.clone());
        oil.insert(key, json!("19.000"));
    }
    RawPriceTable {
        data: vec![sugar, oil],
    }
}

fn trend_chart(start: NaiveDate, rain: &[f64]) -> TrendChart {
    rain.iter()
        .enumerate()
        .map(|(i, &r)| {
            let mut entry = TrendEntry::default();
            entry.trend_days.insert("11".to_string(), json!(r));
            entry.trend_days.insert("72".to_string(), json!(if r > 0.0 { 80 } else { 10 }));
            let key = (start + chrono::Duration::days(i as i64))
                .format("%Y-%m-%dT00:00:00")
                .to_string();
            (key, entry)
        })
        .collect()
}

fn stub(prices: &[&str], rain: &[f64]) -> StubSource {
    let cells: Vec<Value> = prices.iter().map(|p| json!(p)).collect();
    StubSource {
        prices: Ok(price_table(d(2024, 1, 1), &cells)),
        weather: Ok(trend_chart(d(2024, 1, 1), rain)),
    }
}

fn run(source: &StubSource) -> Result<rainprice::app::pipeline::AnalysisOutput, AppError> {
    run_with_fetchers(&AnalysisConfig::default(), window(), source, source)
}

#[test]
fn five_day_table_runs_the_test_with_two_wet_days() {
    let source = stub(
        &["2.000", "2.100", "2.200", "2.050", "2.150"],
        &[0.0, 0.0, 5.0, 0.0, 10.0],
    );
    let out = run(&source).unwrap();

    assert_eq!(out.cleaned.len(), 5);
    assert_eq!(out.comparison.dry_count, 3);
    assert_eq!(out.comparison.wet_count, 2);
    assert_eq!(out.comparison.reason, ComparisonReason::Completed);
    assert!((out.comparison.statistic.unwrap() + 3.2733).abs() < 1e-3);

    let stats = out.price_stats.as_ref().unwrap();
    assert_eq!(stats.mean, 2100.0);
    assert_eq!(stats.cv, Some(3.76));
    assert_eq!(out.conclusion.stability_band, StabilityBand::VeryStable);
    assert_eq!(out.conclusion.zero_rain_day_count, 3);
    assert_eq!(out.conclusion.total_day_count, 5);
}

#[test]
fn constant_price_skips_the_test() {
    let source = stub(&["5.000"; 5], &[0.0, 0.0, 5.0, 0.0, 10.0]);
    let out = run(&source).unwrap();

    let stats = out.price_stats.as_ref().unwrap();
    assert_eq!(stats.std, Some(0.0));
    assert_eq!(stats.var, Some(0.0));
    assert_eq!(stats.cv, None);
    assert_eq!(out.comparison.reason, ComparisonReason::ConstantPrice);
    assert_eq!(out.comparison.p_value, None);
    assert_eq!(out.conclusion.correlation, None);
    assert_eq!(out.conclusion.correlation_band, CorrelationBand::Undefined);
    assert_eq!(out.conclusion.stability_band, StabilityBand::Constant);
}

#[test]
fn locale_formatted_price_is_read_as_thousands() {
    let table = price_table(d(2024, 1, 1), &[json!("15.000")]);
    let series = normalize_price_table(&table, "GULA", "sugar_avg").unwrap();
    assert_eq!(series.get(&d(2024, 1, 1)), Some(Some(15000.0)));
}

#[test]
fn disjoint_dates_fail_with_context() {
    let source = StubSource {
        prices: Ok(price_table(d(2024, 1, 1), &[json!("15.000"), json!("15.100")])),
        weather: Ok(trend_chart(d(2024, 1, 3), &[1.0])),
    };
    let err = run(&source).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyJoin);
    assert_eq!(err.exit_code(), 5);
    assert!(err.message().starts_with("[commodity=sugar range=2024-01-01..2024-01-31] "));
}

#[test]
fn transport_error_reaches_caller_with_context_only() {
    let source = StubSource {
        prices: Err(AppError::transport("Price request failed: connection refused")),
        weather: Ok(trend_chart(d(2024, 1, 1), &[0.0])),
    };
    let err = run(&source).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(
        err.to_string(),
        "[commodity=sugar range=2024-01-01..2024-01-31] Price request failed: connection refused"
    );
}

#[test]
fn no_matching_entity_is_empty_result() {
    let config = AnalysisConfig {
        commodity: Commodity::Rice,
        ..AnalysisConfig::default()
    };
    let source = stub(&["15.000"], &[0.0]);
    let err = run_with_fetchers(&config, window(), &source, &source).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyResult);
}

#[test]
fn invalid_and_missing_rows_are_counted_not_fatal() {
    let source = stub(
        &["15.000", "-", "155", "15.200", "15.100"],
        &[0.0, 1.0, 2.0, 0.0, 3.0],
    );
    let out = run(&source).unwrap();
    assert_eq!(out.cleaning.initial_count, 5);
    assert_eq!(out.cleaning.dropped_missing, 1);
    assert_eq!(out.cleaning.dropped_invalid_price, 1);
    assert_eq!(out.cleaning.final_count, 3);
    assert!(out.cleaned.iter().all(|r| r.price > 1000.0 && r.rainfall_mm >= 0.0));
}

#[test]
fn cleaning_twice_changes_nothing() {
    let source = stub(
        &["15.000", "-", "155", "15.200", "15.100"],
        &[0.0, 1.0, 2.0, 0.0, 3.0],
    );
    let out = run(&source).unwrap();

    // Rebuild inputs from the cleaned rows and clean again.
    let mut price = rainprice::domain::DailySeries::new("sugar_avg");
    let mut weather = rainprice::domain::WeatherTable::default();
    for r in &out.cleaned {
        price.values.insert(r.date, Some(r.price));
        weather.days.insert(
            r.date,
            rainprice::domain::WeatherDay {
                rainfall_mm: Some(r.rainfall_mm),
                rain_probability_pct: r.rain_probability_pct,
            },
        );
    }
    let (again, report) =
        align_and_clean(&price, &weather, &AnalysisConfig::default().cleaning).unwrap();
    assert_eq!(again, out.cleaned);
    assert_eq!(report.final_count, report.initial_count);
}

#[test]
fn correlation_is_symmetric_end_to_end() {
    let source = stub(
        &["15.000", "15.400", "15.100", "15.900", "15.300", "15.050"],
        &[0.0, 4.0, 1.0, 12.0, 2.5, 0.0],
    );
    let out = run(&source).unwrap();
    let price: Vec<f64> = out.cleaned.iter().map(|r| r.price).collect();
    let rain: Vec<f64> = out.cleaned.iter().map(|r| r.rainfall_mm).collect();
    let r = out.conclusion.correlation.unwrap();
    assert_eq!(rainprice::stats::pearson(&rain, &price), Some(r));
    assert!(r > 0.9);
    assert_eq!(out.conclusion.correlation_band, CorrelationBand::Strong);
}

#[test]
fn weather_table_drops_duplicate_days() {
    let mut chart = trend_chart(d(2024, 1, 1), &[3.0]);
    let mut dup = TrendEntry::default();
    dup.trend_days.insert("11".to_string(), json!(99.0));
    chart.insert("20240101".to_string(), dup);
    let table = normalize_weather_table(&chart).unwrap();
    assert_eq!(table.len(), 1);
}

#[test]
fn demo_run_is_deterministic_and_renders() {
    let config = AnalysisConfig {
        source: DataSource::Sample { seed: 5 },
        lookback_days: 120,
        ..AnalysisConfig::default()
    };
    let today = d(2025, 6, 30);
    let a = run_analysis(&config, today).unwrap();
    let b = run_analysis(&config, today).unwrap();

    assert_eq!(a.cleaned, b.cleaned);
    assert_eq!(a.comparison, b.comparison);
    assert!(a.cleaned.len() > 100);
    assert!(a.comparison.dry_count > 1 && a.comparison.wet_count > 1);
    assert!(a.conclusion.correlation.is_some());

    let text = format_report(&AnalysisSummary::from_output(&a));
    assert!(text.starts_with("=== rainprice - Sugar price vs rainfall ===\n"));
    assert!(text.contains("Descriptive statistics:"));
    assert!(text.contains("Conclusion:"));
}

#[test]
fn every_sink_completes_when_cleaning_drops_all_rows() {
    let out = run(&stub(&["500", "600", "700"], &[0.0, 1.0, 0.0])).unwrap();
    assert!(out.cleaned.is_empty());

    let dir = std::env::temp_dir().join(format!("rainprice-sinks-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let svg_path = dir.join("chart.svg");
    let csv_path = dir.join("clean.csv");
    let json_path = dir.join("summary.json");

    let mut text = TextReport::new(Vec::new());
    text.emit(&out).unwrap();
    let mut ascii = AsciiChart::new(Vec::new(), 40, 10);
    ascii.emit(&out).unwrap();
    SvgChart::new(svg_path.clone()).emit(&out).unwrap();
    CsvExport { path: csv_path.clone() }.emit(&out).unwrap();
    JsonSummary { path: json_path.clone() }.emit(&out).unwrap();

    let report = String::from_utf8(text.into_inner()).unwrap();
    assert!(report.contains("Conclusion:"));
    assert!(!svg_path.exists());
    assert_eq!(
        std::fs::read_to_string(&csv_path).unwrap(),
        "date,price,rainfall_mm,rain_probability_pct\n"
    );
    let summary = read_summary_json(&json_path).unwrap();
    assert_eq!(summary, AnalysisSummary::from_output(&out));

    let _ = std::fs::remove_dir_all(&dir);
}

#[derive(Clone, Default)]
struct SharedBuf(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn analysis_span_is_closed_with_run_context() {
    use tracing_subscriber::fmt::format::FmtSpan;

    let buf = SharedBuf::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(move || writer.clone())
        .finish();

    let source = stub(&["15.000", "15.100"], &[0.0, 2.0]);
    tracing::subscriber::with_default(subscriber, || run(&source).unwrap());

    let logs = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("analysis{context=commodity=sugar range=2024-01-01..2024-01-31}"));
    assert!(logs.contains("close"));
}
