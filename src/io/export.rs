//! Export the cleaned, aligned table to CSV.
//!
//! One row per day, ascending by date, easy to load into a spreadsheet.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::app::pipeline::AnalysisOutput;
use crate::domain::AlignedRecord;
use crate::error::AppError;
use crate::report::ReportSink;

/// Write aligned records as CSV into any writer.
pub fn write_aligned_csv_to<W: Write>(writer: W, records: &[AlignedRecord]) -> Result<(), AppError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["date", "price", "rainfall_mm", "rain_probability_pct"])
        .map_err(|e| AppError::io(format!("Failed to write export CSV header: {e}")))?;

    for r in records {
        out.write_record([
            r.date.to_string(),
            r.price.to_string(),
            r.rainfall_mm.to_string(),
            r.rain_probability_pct
                .map(|p| p.to_string())
                .unwrap_or_default(),
        ])
        .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::io(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Write aligned records to a CSV file.
pub fn write_aligned_csv(path: &Path, records: &[AlignedRecord]) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::io(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;
    write_aligned_csv_to(file, records)?;
    info!(path = %path.display(), rows = records.len(), "Wrote aligned CSV");
    Ok(())
}

/// Sink writing the cleaned table to a CSV file.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub path: PathBuf,
}

impl ReportSink for CsvExport {
    fn emit(&mut self, output: &AnalysisOutput) -> Result<(), AppError> {
        write_aligned_csv(&self.path, &output.cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn csv_has_header_and_blank_missing_probability() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let records = vec![
            AlignedRecord {
                date: d,
                price: 17_500.0,
                rainfall_mm: 0.0,
                rain_probability_pct: Some(12.0),
            },
            AlignedRecord {
                date: d.succ_opt().unwrap(),
                price: 17_550.0,
                rainfall_mm: 4.25,
                rain_probability_pct: None,
            },
        ];

        let mut buf = Vec::new();
        write_aligned_csv_to(&mut buf, &records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "date,price,rainfall_mm,rain_probability_pct\n\
             2024-01-01,17500,0,12\n\
             2024-01-02,17550,4.25,\n"
        );
    }

    #[test]
    fn csv_keeps_fractional_values() {
        let records = vec![AlignedRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            price: 15_000.333,
            rainfall_mm: 0.125,
            rain_probability_pct: Some(55.5),
        }];

        let mut buf = Vec::new();
        write_aligned_csv_to(&mut buf, &records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text.lines().nth(1),
            Some("2024-01-01,15000.333,0.125,55.5")
        );
    }
}
