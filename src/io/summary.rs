//! Read/write the JSON run summary.
//!
//! The summary is the portable form of a finished run: context, cleaning
//! counts, both statistics batteries, the wet/dry comparison and the
//! conclusion. It can be reloaded later to re-render the text report
//! without fetching anything.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::pipeline::AnalysisOutput;
use crate::domain::{CleaningReport, ComparisonResult, ConclusionReport, DescriptiveStats, RunContext};
use crate::error::AppError;
use crate::report::ReportSink;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub tool: String,
    pub context: RunContext,
    pub alpha: f64,
    pub cleaning: CleaningReport,
    pub price_stats: Option<DescriptiveStats>,
    pub rain_stats: Option<DescriptiveStats>,
    pub comparison: ComparisonResult,
    pub conclusion: ConclusionReport,
}

impl AnalysisSummary {
    pub fn from_output(output: &AnalysisOutput) -> Self {
        Self {
            tool: "rainprice".to_string(),
            context: output.context.clone(),
            alpha: output.alpha,
            cleaning: output.cleaning.clone(),
            price_stats: output.price_stats.clone(),
            rain_stats: output.rain_stats.clone(),
            comparison: output.comparison.clone(),
            conclusion: output.conclusion.clone(),
        }
    }
}

/// Write a summary JSON file.
pub fn write_summary_json(path: &Path, summary: &AnalysisSummary) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::io(format!("Failed to create summary JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::io(format!("Failed to write summary JSON: {e}")))?;
    info!(path = %path.display(), "Wrote summary JSON");
    Ok(())
}

/// Read a summary JSON file.
pub fn read_summary_json(path: &Path) -> Result<AnalysisSummary, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::io(format!("Failed to open summary JSON '{}': {e}", path.display()))
    })?;
    serde_json::from_reader(file).map_err(|e| AppError::io(format!("Invalid summary JSON: {e}")))
}

/// Sink writing the run summary to a JSON file.
#[derive(Debug, Clone)]
pub struct JsonSummary {
    pub path: PathBuf,
}

impl ReportSink for JsonSummary {
    fn emit(&mut self, output: &AnalysisOutput) -> Result<(), AppError> {
        write_summary_json(&self.path, &AnalysisSummary::from_output(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Commodity, ComparisonReason, CorrelationBand, DateWindow, StabilityBand,
    };
    use chrono::NaiveDate;

    fn summary() -> AnalysisSummary {
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        AnalysisSummary {
            tool: "rainprice".to_string(),
            context: RunContext {
                commodity: Commodity::Chili,
                window: DateWindow::lookback(end, 30),
                location: "Kendari".to_string(),
            },
            alpha: 0.05,
            cleaning: CleaningReport {
                price_column: "bird_chili_avg".to_string(),
                initial_count: 31,
                dropped_missing: 2,
                dropped_invalid_price: 0,
                dropped_negative_rain: 0,
                final_count: 29,
            },
            price_stats: None,
            rain_stats: None,
            comparison: ComparisonResult {
                statistic: None,
                p_value: None,
                reason: ComparisonReason::InsufficientGroupSize,
                dry_count: 29,
                wet_count: 0,
                dry_mean: Some(45_000.0),
                wet_mean: None,
                degrees_of_freedom: None,
            },
            conclusion: ConclusionReport {
                correlation: None,
                correlation_band: CorrelationBand::Undefined,
                probability_correlation: None,
                cv_percent: Some(4.2),
                stability_band: StabilityBand::VeryStable,
                zero_rain_day_count: 29,
                total_day_count: 29,
            },
        }
    }

    #[test]
    fn summary_survives_a_file_round_trip() {
        let path = std::env::temp_dir().join(format!("rainprice-summary-{}.json", std::process::id()));
        let original = summary();
        write_summary_json(&path, &original).unwrap();
        let loaded = read_summary_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, original);
    }

    #[test]
    fn reason_is_serialized_in_upper_snake_case() {
        let json = serde_json::to_value(summary()).unwrap();
        assert_eq!(json["comparison"]["reason"], "INSUFFICIENT_GROUP_SIZE");
        assert_eq!(json["context"]["commodity"], "chili");
        assert_eq!(json["conclusion"]["stability_band"], "very_stable");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_summary_json(Path::new("/nonexistent/rainprice/summary.json")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }
}
