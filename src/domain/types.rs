//! Shared domain types.
//!
//! Everything here is a plain, immutable value built once per pipeline run.
//! Result records derive `Serialize`/`Deserialize` so they can be:
//!
//! - rendered by any report sink
//! - exported to a JSON summary and reloaded later

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Default lower bound (exclusive) for a plausible retail price, in currency units.
///
/// Values at or below this are parsing artifacts (e.g. `"15.5"` read as 155).
pub const DEFAULT_PRICE_FLOOR: f64 = 1000.0;

/// Default significance level for the wet/dry comparison.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Commodities known to the price source.
///
/// The category ids select the product group in the price grid; the keyword
/// then narrows the grid rows to the entities of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Commodity {
    #[value(alias = "gula")]
    Sugar,
    #[value(alias = "cabai")]
    Chili,
    #[value(alias = "beras")]
    Rice,
}

impl Commodity {
    pub const ALL: [Commodity; 3] = [Commodity::Sugar, Commodity::Chili, Commodity::Rice];

    /// Case-insensitive substring matched against entity names.
    pub fn keyword(self) -> &'static str {
        match self {
            Commodity::Sugar => "GULA",
            Commodity::Chili => "RAWIT",
            Commodity::Rice => "BERAS",
        }
    }

    /// Column name used for the aggregated daily price.
    pub fn column_name(self) -> &'static str {
        match self {
            Commodity::Sugar => "sugar_avg",
            Commodity::Chili => "bird_chili_avg",
            Commodity::Rice => "rice_avg",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Commodity::Sugar => "Sugar",
            Commodity::Chili => "Bird's-eye chili",
            Commodity::Rice => "Rice",
        }
    }

    pub fn category_ids(self) -> &'static [&'static str] {
        match self {
            Commodity::Sugar | Commodity::Chili => &["cat_10", "com_20", "com_21"],
            Commodity::Rice => &["cat_8", "com_15", "com_16"],
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for Commodity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Commodity::Sugar => "sugar",
            Commodity::Chili => "chili",
            Commodity::Rice => "rice",
        };
        write!(f, "{name}")
    }
}

/// One (entity, date) cell of the wide price table after reshaping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeriesRecord {
    pub entity_name: String,
    pub date: NaiveDate,
    /// `None` when the cell was empty or could not be coerced to a number.
    pub value: Option<f64>,
}

/// A daily series keyed by calendar date (unique keys by construction).
///
/// A date may carry a missing value: every contributing cell was missing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailySeries {
    pub name: String,
    pub values: BTreeMap<NaiveDate, Option<f64>>,
}

impl DailySeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, date: &NaiveDate) -> Option<Option<f64>> {
        self.values.get(date).copied()
    }
}

/// Weather metrics for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherDay {
    pub rainfall_mm: Option<f64>,
    pub rain_probability_pct: Option<f64>,
}

/// Normalized weather table (rainfall + rain probability per date).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeatherTable {
    pub days: BTreeMap<NaiveDate, WeatherDay>,
}

impl WeatherTable {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// A cleaned, date-aligned observation.
///
/// Invariants: `price` is finite and above the configured floor,
/// `rainfall_mm` is finite and `>= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedRecord {
    pub date: NaiveDate,
    pub price: f64,
    pub rainfall_mm: f64,
    pub rain_probability_pct: Option<f64>,
}

impl AlignedRecord {
    pub fn is_dry(&self) -> bool {
        self.rainfall_mm == 0.0
    }

    pub fn is_wet(&self) -> bool {
        self.rainfall_mm > 0.0
    }
}

/// Row-level validity thresholds applied after the join.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleaningRules {
    /// Prices `<= price_floor` are dropped as invalid.
    pub price_floor: f64,
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self {
            price_floor: DEFAULT_PRICE_FLOOR,
        }
    }
}

/// Counts produced by the cleaner. Observability only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub price_column: String,
    pub initial_count: usize,
    pub dropped_missing: usize,
    pub dropped_invalid_price: usize,
    pub dropped_negative_rain: usize,
    pub final_count: usize,
}

/// Summary statistics of one numeric column, rounded to 2 decimals.
///
/// Statistics that need more data than available (or a non-zero spread)
/// are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub std: Option<f64>,
    pub var: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    /// Coefficient of variation in percent.
    pub cv: Option<f64>,
    /// Mean absolute deviation around the mean.
    pub mad: f64,
    pub skew: Option<f64>,
    /// Excess kurtosis.
    pub kurt: Option<f64>,
}

/// Why the wet/dry comparison did (or did not) produce a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonReason {
    ConstantPrice,
    InsufficientGroupSize,
    ZeroVarianceBothGroups,
    Completed,
    IndeterminateResult,
}

impl ComparisonReason {
    pub fn describe(self) -> &'static str {
        match self {
            ComparisonReason::ConstantPrice => "price is constant; test not performed",
            ComparisonReason::InsufficientGroupSize => {
                "one of the groups has too few days; test not performed"
            }
            ComparisonReason::ZeroVarianceBothGroups => {
                "both groups have zero variance; test not performed"
            }
            ComparisonReason::Completed => "test completed",
            ComparisonReason::IndeterminateResult => "p-value undefined (likely identical data)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Significant,
    NotSignificant,
}

/// Outcome of the dry-vs-wet price comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub reason: ComparisonReason,
    pub dry_count: usize,
    pub wet_count: usize,
    pub dry_mean: Option<f64>,
    pub wet_mean: Option<f64>,
    /// Welch–Satterthwaite degrees of freedom.
    pub degrees_of_freedom: Option<f64>,
}

impl ComparisonResult {
    /// Interpret the p-value at level `alpha`; `None` when no p-value exists.
    pub fn significance(&self, alpha: f64) -> Option<Significance> {
        self.p_value.map(|p| {
            if p < alpha {
                Significance::Significant
            } else {
                Significance::NotSignificant
            }
        })
    }
}

/// Strength label of the price/rainfall correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationBand {
    Undefined,
    Negligible,
    Weak,
    Moderate,
    Strong,
}

impl CorrelationBand {
    pub fn describe(self) -> &'static str {
        match self {
            CorrelationBand::Undefined => "relationship undefined",
            CorrelationBand::Negligible => "very weak / practically no relationship",
            CorrelationBand::Weak => "weak relationship",
            CorrelationBand::Moderate => "moderate relationship",
            CorrelationBand::Strong => "strong relationship",
        }
    }
}

/// Price variability label derived from the coefficient of variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityBand {
    Constant,
    VeryStable,
    ModeratelyStable,
    Volatile,
}

impl StabilityBand {
    pub fn describe(self) -> &'static str {
        match self {
            StabilityBand::Constant => "price is essentially constant",
            StabilityBand::VeryStable => "price is very stable",
            StabilityBand::ModeratelyStable => "price is moderately stable",
            StabilityBand::Volatile => "price is volatile",
        }
    }
}

/// Final narrative facts consumed by the renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConclusionReport {
    pub correlation: Option<f64>,
    pub correlation_band: CorrelationBand,
    /// Correlation between price and rain probability.
    pub probability_correlation: Option<f64>,
    pub cv_percent: Option<f64>,
    pub stability_band: StabilityBand,
    pub zero_rain_day_count: usize,
    pub total_day_count: usize,
}

impl ConclusionReport {
    pub fn dry_day_fraction(&self) -> Option<f64> {
        if self.total_day_count == 0 {
            None
        } else {
            Some(self.zero_rain_day_count as f64 / self.total_day_count as f64)
        }
    }
}

/// Where the two input tables come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Live HTTP fetchers.
    Live,
    /// Seeded synthetic tables (offline).
    Sample { seed: u64 },
}

/// Inclusive date window for both fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Window ending at `end` and reaching `days` back.
    pub fn lookback(end: NaiveDate, days: u32) -> Self {
        Self {
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Parameters identifying a run; attached to hard errors and report headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunContext {
    pub commodity: Commodity,
    pub window: DateWindow,
    pub location: String,
}

impl std::fmt::Display for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "commodity={} range={}", self.commodity, self.window)
    }
}

/// Price-grid region selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub province_id: u32,
    pub regency_id: String,
    pub market_id: String,
    pub price_type_id: u32,
    pub report_type: u32,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            province_id: 27,
            regency_id: "72".to_string(),
            market_id: String::new(),
            price_type_id: 1,
            report_type: 5,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub commodity: Commodity,
    pub region: Region,
    pub latitude: f64,
    pub longitude: f64,
    pub lookback_days: u32,
    /// Last day of the window; `None` means today.
    pub end_date: Option<NaiveDate>,
    pub location_label: String,
    pub source: DataSource,
    pub weather_api_key: Option<String>,

    pub cleaning: CleaningRules,
    pub alpha: f64,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub chart_path: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
    pub export_summary: Option<PathBuf>,
}

impl AnalysisConfig {
    pub fn window(&self, today: NaiveDate) -> DateWindow {
        DateWindow::lookback(self.end_date.unwrap_or(today), self.lookback_days)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            commodity: Commodity::Sugar,
            region: Region::default(),
            latitude: -4.04,
            longitude: 122.49,
            lookback_days: 365,
            end_date: None,
            location_label: "Kendari".to_string(),
            source: DataSource::Live,
            weather_api_key: None,
            cleaning: CleaningRules::default(),
            alpha: DEFAULT_ALPHA,
            plot: true,
            plot_width: 100,
            plot_height: 20,
            chart_path: None,
            export_csv: None,
            export_summary: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commodity_cycle_wraps() {
        assert_eq!(Commodity::Rice.next(), Commodity::Sugar);
        assert_eq!(Commodity::Sugar.prev(), Commodity::Rice);
        for c in Commodity::ALL {
            assert_eq!(c.next().prev(), c);
        }
    }

    #[test]
    fn lookback_window_spans_requested_days() {
        let end = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let w = DateWindow::lookback(end, 30);
        assert_eq!(w.start, NaiveDate::from_ymd_opt(2025, 1, 30).unwrap());
        assert_eq!(w.days(), 30);
        assert_eq!(w.to_string(), "2025-01-30..2025-03-01");
    }

    #[test]
    fn significance_uses_strict_threshold() {
        let mut r = ComparisonResult {
            statistic: Some(2.0),
            p_value: Some(0.05),
            reason: ComparisonReason::Completed,
            dry_count: 3,
            wet_count: 3,
            dry_mean: None,
            wet_mean: None,
            degrees_of_freedom: None,
        };
        assert_eq!(r.significance(0.05), Some(Significance::NotSignificant));
        r.p_value = Some(0.0499);
        assert_eq!(r.significance(0.05), Some(Significance::Significant));
        r.p_value = None;
        assert_eq!(r.significance(0.05), None);
    }
}
