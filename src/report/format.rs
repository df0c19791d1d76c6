//! Plain-text report rendering.
//!
//! All formatting works on `AnalysisSummary`, so a fresh run and a reloaded
//! JSON summary print identically.

use std::io::Write;

use crate::app::pipeline::AnalysisOutput;
use crate::domain::{
    CleaningReport, ComparisonReason, ComparisonResult, ConclusionReport, DescriptiveStats,
    Significance,
};
use crate::error::AppError;
use crate::io::summary::AnalysisSummary;
use crate::report::ReportSink;

type StatGetter = fn(&DescriptiveStats) -> Option<f64>;

const STAT_ROWS: [(&str, StatGetter); 16] = [
    ("count", |s| Some(s.count as f64)),
    ("mean", |s| Some(s.mean)),
    ("median", |s| Some(s.median)),
    ("mode", |s| Some(s.mode)),
    ("std", |s| s.std),
    ("var", |s| s.var),
    ("min", |s| Some(s.min)),
    ("max", |s| Some(s.max)),
    ("range", |s| Some(s.range)),
    ("q1", |s| Some(s.q1)),
    ("q3", |s| Some(s.q3)),
    ("iqr", |s| Some(s.iqr)),
    ("cv", |s| s.cv),
    ("mad", |s| Some(s.mad)),
    ("skew", |s| s.skew),
    ("kurt", |s| s.kurt),
];

/// Format the full report.
pub fn format_report(summary: &AnalysisSummary) -> String {
    let mut out = String::new();

    let ctx = &summary.context;
    out.push_str(&format!(
        "=== rainprice - {} price vs rainfall ===\n",
        ctx.commodity.label()
    ));
    out.push_str(&format!("Location: {}\n", ctx.location));
    out.push_str(&format!("Window: {} ({} days)\n", ctx.window, ctx.window.days()));
    out.push('\n');

    out.push_str(&format_cleaning(&summary.cleaning));
    out.push('\n');
    out.push_str(&format_stats_table(
        &summary.cleaning.price_column,
        summary.price_stats.as_ref(),
        summary.rain_stats.as_ref(),
    ));
    out.push('\n');
    out.push_str(&format_dry_days(&summary.conclusion));
    out.push('\n');
    out.push_str(&format_comparison(&summary.comparison, summary.alpha));
    out.push('\n');
    out.push_str(&format_conclusion(&summary.conclusion, &summary.comparison, summary.alpha));

    out
}

pub fn format_cleaning(report: &CleaningReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Cleaning ({}):\n", report.price_column));
    out.push_str(&format!("- joined rows:                {:>6}\n", report.initial_count));
    out.push_str(&format!("- dropped, missing value:     {:>6}\n", report.dropped_missing));
    out.push_str(&format!("- dropped, price at floor:    {:>6}\n", report.dropped_invalid_price));
    out.push_str(&format!("- dropped, negative rainfall: {:>6}\n", report.dropped_negative_rain));
    out.push_str(&format!("- final rows:                 {:>6}\n", report.final_count));
    out
}

/// Side-by-side statistics for the price and rainfall columns.
pub fn format_stats_table(
    price_column: &str,
    price: Option<&DescriptiveStats>,
    rain: Option<&DescriptiveStats>,
) -> String {
    let mut out = String::new();
    out.push_str("Descriptive statistics:\n");
    out.push_str(&format!("{:<10} {:>14} {:>14}\n", "statistic", price_column, "rainfall_mm"));
    out.push_str(&format!("{:-<10} {:-<14} {:-<14}\n", "", "", ""));

    for (name, get) in STAT_ROWS {
        let cell = |stats: Option<&DescriptiveStats>| match stats.and_then(get) {
            Some(v) if name == "count" => format!("{v:.0}"),
            other => fmt_opt(other, 2),
        };
        out.push_str(&format!("{:<10} {:>14} {:>14}\n", name, cell(price), cell(rain)));
    }
    out
}

pub fn format_dry_days(conclusion: &ConclusionReport) -> String {
    let pct = conclusion
        .dry_day_fraction()
        .map(|f| format!("{:.1}%", f * 100.0))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "Days without rain: {} of {} days ({pct})\n",
        conclusion.zero_rain_day_count, conclusion.total_day_count
    )
}

pub fn format_comparison(result: &ComparisonResult, alpha: f64) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Dry vs wet price comparison (Welch t-test, alpha = {alpha}):\n"
    ));
    out.push_str(&format!(
        "- dry days: n={}, mean={}\n",
        result.dry_count,
        fmt_opt(result.dry_mean, 2)
    ));
    out.push_str(&format!(
        "- wet days: n={}, mean={}\n",
        result.wet_count,
        fmt_opt(result.wet_mean, 2)
    ));

    if result.statistic.is_some() || result.p_value.is_some() {
        out.push_str(&format!(
            "- t = {}, df = {}, p = {}\n",
            fmt_opt(result.statistic, 4),
            fmt_opt(result.degrees_of_freedom, 2),
            fmt_opt(result.p_value, 4)
        ));
    }

    match result.significance(alpha) {
        Some(Significance::Significant) => {
            out.push_str("- significant: prices differ between dry and wet days\n")
        }
        Some(Significance::NotSignificant) => out.push_str(
            "- not significant: no evidence that prices differ between dry and wet days\n",
        ),
        None => out.push_str(&format!("- {}\n", result.reason.describe())),
    }
    out
}

pub fn format_conclusion(
    conclusion: &ConclusionReport,
    comparison: &ComparisonResult,
    alpha: f64,
) -> String {
    let mut out = String::new();
    out.push_str("Conclusion:\n");
    out.push_str(&format!(
        "1. Price vs rainfall: r = {} ({})\n",
        fmt_opt(conclusion.correlation, 3),
        conclusion.correlation_band.describe()
    ));
    out.push_str(&format!(
        "2. Price vs rain probability: r = {}\n",
        fmt_opt(conclusion.probability_correlation, 3)
    ));
    let cv = conclusion
        .cv_percent
        .map(|v| format!("{}%", fmt_num(v, 2)))
        .unwrap_or_else(|| "N/A".to_string());
    out.push_str(&format!(
        "3. Price variability: CV = {cv} ({})\n",
        conclusion.stability_band.describe()
    ));
    let verdict = match (comparison.reason, comparison.significance(alpha)) {
        (_, Some(Significance::Significant)) => {
            format!("rainfall matters, significant price difference at alpha = {alpha}")
        }
        (_, Some(Significance::NotSignificant)) => {
            format!("no significant price difference at alpha = {alpha}")
        }
        (ComparisonReason::Completed, None) => "result undefined".to_string(),
        (reason, None) => format!("not tested ({})", reason.describe()),
    };
    out.push_str(&format!("4. Dry vs wet days: {verdict}\n"));
    out
}

fn fmt_num(v: f64, decimals: usize) -> String {
    // Avoid printing "-0.00".
    let v = if v == 0.0 { 0.0 } else { v };
    format!("{v:.decimals$}")
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) if v.is_finite() => fmt_num(v, decimals),
        _ => "-".to_string(),
    }
}

/// Sink printing the text report to a writer (stdout in the CLI).
pub struct TextReport<W: Write> {
    writer: W,
}

impl<W: Write> TextReport<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for TextReport<W> {
    fn emit(&mut self, output: &AnalysisOutput) -> Result<(), AppError> {
        let text = format_report(&AnalysisSummary::from_output(output));
        writeln!(self.writer, "{text}")
            .map_err(|e| AppError::io(format!("Failed to write report: {e}")))
    }
}
