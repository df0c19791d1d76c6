//! Conclusion building and report sinks.
//!
//! Band classification is an ordered table lookup: the first band whose
//! exclusive upper bound exceeds the value wins, the fallback covers the rest.
//! Boundaries are therefore explicit (`<`), and each table can be tested on
//! its own.

use crate::app::pipeline::AnalysisOutput;
use crate::domain::{AlignedRecord, ConclusionReport, CorrelationBand, DescriptiveStats, StabilityBand};
use crate::error::AppError;
use crate::stats::pearson;

pub mod format;

pub use format::*;

/// Exclusive upper bounds on `|r|`, checked in order.
pub const CORRELATION_BANDS: [(f64, CorrelationBand); 3] = [
    (0.1, CorrelationBand::Negligible),
    (0.3, CorrelationBand::Weak),
    (0.5, CorrelationBand::Moderate),
];

/// Exclusive upper bounds on the CV (percent), checked in order.
pub const STABILITY_BANDS: [(f64, StabilityBand); 2] = [
    (5.0, StabilityBand::VeryStable),
    (15.0, StabilityBand::ModeratelyStable),
];

/// Classify a correlation coefficient by its absolute value.
pub fn classify_correlation(r: Option<f64>) -> CorrelationBand {
    let Some(r) = r.filter(|v| v.is_finite()) else {
        return CorrelationBand::Undefined;
    };
    let abs = r.abs();
    CORRELATION_BANDS
        .iter()
        .find(|(upper, _)| abs < *upper)
        .map(|(_, band)| *band)
        .unwrap_or(CorrelationBand::Strong)
}

/// Classify price variability from the raw CV value (percent).
pub fn classify_stability(cv: Option<f64>) -> StabilityBand {
    let Some(cv) = cv.filter(|v| v.is_finite() && *v != 0.0) else {
        return StabilityBand::Constant;
    };
    STABILITY_BANDS
        .iter()
        .find(|(upper, _)| cv < *upper)
        .map(|(_, band)| *band)
        .unwrap_or(StabilityBand::Volatile)
}

/// Package the narrative facts for the cleaned table.
///
/// `price_stats` is the price column's battery (`None` for an empty table);
/// its CV drives the stability band.
pub fn build_conclusion(
    cleaned: &[AlignedRecord],
    price_stats: Option<&DescriptiveStats>,
) -> ConclusionReport {
    let price: Vec<f64> = cleaned.iter().map(|r| r.price).collect();
    let rain: Vec<f64> = cleaned.iter().map(|r| r.rainfall_mm).collect();

    let correlation = pearson(&price, &rain);

    // Days without a probability reading are left out of this pairing only.
    let (p_price, p_prob): (Vec<f64>, Vec<f64>) = cleaned
        .iter()
        .filter_map(|r| r.rain_probability_pct.map(|p| (r.price, p)))
        .unzip();
    let probability_correlation = pearson(&p_price, &p_prob);

    let cv_percent = price_stats.and_then(|s| s.cv);

    ConclusionReport {
        correlation,
        correlation_band: classify_correlation(correlation),
        probability_correlation,
        cv_percent,
        stability_band: classify_stability(cv_percent),
        zero_rain_day_count: cleaned.iter().filter(|r| r.is_dry()).count(),
        total_day_count: cleaned.len(),
    }
}

/// A consumer of finished pipeline results (text, chart, export, ...).
pub trait ReportSink {
    fn emit(&mut self, output: &AnalysisOutput) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::compute_stats;
    use chrono::NaiveDate;

    #[test]
    fn correlation_band_boundaries_are_exclusive() {
        assert_eq!(classify_correlation(None), CorrelationBand::Undefined);
        assert_eq!(classify_correlation(Some(f64::NAN)), CorrelationBand::Undefined);
        assert_eq!(classify_correlation(Some(0.0)), CorrelationBand::Negligible);
        assert_eq!(classify_correlation(Some(0.0999)), CorrelationBand::Negligible);
        assert_eq!(classify_correlation(Some(0.1)), CorrelationBand::Weak);
        assert_eq!(classify_correlation(Some(-0.29)), CorrelationBand::Weak);
        assert_eq!(classify_correlation(Some(0.3)), CorrelationBand::Moderate);
        assert_eq!(classify_correlation(Some(-0.5)), CorrelationBand::Strong);
        assert_eq!(classify_correlation(Some(0.99)), CorrelationBand::Strong);
    }

    #[test]
    fn stability_band_boundaries_are_exclusive() {
        assert_eq!(classify_stability(None), StabilityBand::Constant);
        assert_eq!(classify_stability(Some(0.0)), StabilityBand::Constant);
        assert_eq!(classify_stability(Some(4.99)), StabilityBand::VeryStable);
        assert_eq!(classify_stability(Some(5.0)), StabilityBand::ModeratelyStable);
        assert_eq!(classify_stability(Some(14.99)), StabilityBand::ModeratelyStable);
        assert_eq!(classify_stability(Some(15.0)), StabilityBand::Volatile);
    }

    #[test]
    fn conclusion_counts_dry_days() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let prices = [2000.0, 2100.0, 2200.0, 2050.0, 2150.0];
        let rain = [0.0, 0.0, 5.0, 0.0, 10.0];
        let cleaned: Vec<AlignedRecord> = prices
            .iter()
            .zip(rain)
            .enumerate()
            .map(|(i, (&price, rainfall_mm))| AlignedRecord {
                date: start + chrono::Duration::days(i as i64),
                price,
                rainfall_mm,
                rain_probability_pct: Some(if rainfall_mm > 0.0 { 80.0 } else { 10.0 }),
            })
            .collect();

        let stats = compute_stats(&prices);
        let c = build_conclusion(&cleaned, stats.as_ref());
        assert_eq!(c.zero_rain_day_count, 3);
        assert_eq!(c.total_day_count, 5);
        assert_eq!(c.dry_day_fraction(), Some(0.6));
        assert_eq!(c.cv_percent, Some(3.76));
        assert_eq!(c.stability_band, StabilityBand::VeryStable);
        let r = c.correlation.unwrap();
        assert!(r > 0.5);
        assert_eq!(c.correlation_band, CorrelationBand::Strong);
        assert!(c.probability_correlation.is_some());
    }

    #[test]
    fn constant_price_gives_undefined_correlation_and_constant_band() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let cleaned: Vec<AlignedRecord> = (0..4)
            .map(|i| AlignedRecord {
                date: start + chrono::Duration::days(i),
                price: 5000.0,
                rainfall_mm: i as f64,
                rain_probability_pct: None,
            })
            .collect();
        let stats = compute_stats(&[5000.0; 4]);
        let c = build_conclusion(&cleaned, stats.as_ref());
        assert_eq!(c.correlation, None);
        assert_eq!(c.correlation_band, CorrelationBand::Undefined);
        assert_eq!(c.probability_correlation, None);
        assert_eq!(c.stability_band, StabilityBand::Constant);
        assert_eq!(c.zero_rain_day_count, 1);
    }
}
