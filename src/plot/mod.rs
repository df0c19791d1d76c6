//! Chart rendering: ASCII for the terminal, SVG via Plotters.
//!
//! `ChartData` holds the series prepared once for the Plotters-based charts
//! (SVG file and TUI widget). The x axis is days since the first aligned date.

use chrono::{Duration, NaiveDate};

use crate::domain::AlignedRecord;

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub origin: NaiveDate,
    pub price: Vec<(f64, f64)>,
    pub rain: Vec<(f64, f64)>,
    pub x_bounds: [f64; 2],
    pub price_bounds: [f64; 2],
    pub rain_bounds: [f64; 2],
}

impl ChartData {
    /// `None` for an empty table.
    pub fn from_records(records: &[AlignedRecord]) -> Option<Self> {
        let origin = records.first()?.date;
        let x = |r: &AlignedRecord| (r.date - origin).num_days() as f64;

        let price: Vec<(f64, f64)> = records.iter().map(|r| (x(r), r.price)).collect();
        let rain: Vec<(f64, f64)> = records.iter().map(|r| (x(r), r.rainfall_mm)).collect();

        let x_max = price.last().map(|p| p.0).unwrap_or(0.0).max(1.0);
        let min = records.iter().map(|r| r.price).fold(f64::INFINITY, f64::min);
        let max = records.iter().map(|r| r.price).fold(f64::NEG_INFINITY, f64::max);
        let (lo, hi) = if max > min { (min, max) } else { (min - 1.0, max + 1.0) };
        let (lo, hi) = ascii::pad_range(lo, hi, 0.05);

        Some(Self {
            origin,
            price,
            rain,
            x_bounds: [-0.5, x_max + 0.5],
            price_bounds: [lo, hi],
            rain_bounds: [0.0, rain_axis_max(records)],
        })
    }

    /// Calendar label for an x-axis position.
    pub fn date_label(&self, x: f64) -> String {
        (self.origin + Duration::days(x.round() as i64))
            .format("%Y-%m-%d")
            .to_string()
    }
}
