//! Date alignment and row-level cleaning.
//!
//! Inner-joins the price series with the weather table on calendar date,
//! then applies three filters in order, counting each separately:
//!
//! 1. missing price or missing rainfall
//! 2. price at or below the configured floor
//! 3. negative rainfall
//!
//! Only an empty *join* is an error; cleaning may legitimately remove every
//! row, and downstream stages handle tiny inputs themselves.

use chrono::NaiveDate;
use tracing::info;

use crate::domain::{AlignedRecord, CleaningReport, CleaningRules, DailySeries, WeatherTable};
use crate::error::AppError;

/// A joined row before validity filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinedRow {
    pub date: NaiveDate,
    pub price: Option<f64>,
    pub rainfall_mm: Option<f64>,
    pub rain_probability_pct: Option<f64>,
}

/// Inner join on date, ascending.
pub fn inner_join(price: &DailySeries, weather: &WeatherTable) -> Vec<JoinedRow> {
    price
        .values
        .iter()
        .filter_map(|(date, price)| {
            weather.days.get(date).map(|w| JoinedRow {
                date: *date,
                price: *price,
                rainfall_mm: w.rainfall_mm,
                rain_probability_pct: w.rain_probability_pct,
            })
        })
        .collect()
}

/// Join and clean. Fails only when the two series share no dates.
pub fn align_and_clean(
    price: &DailySeries,
    weather: &WeatherTable,
    rules: &CleaningRules,
) -> Result<(Vec<AlignedRecord>, CleaningReport), AppError> {
    let joined = inner_join(price, weather);
    if joined.is_empty() {
        return Err(AppError::empty_join(format!(
            "No matching dates between price series '{}' ({} days) and weather table ({} days).",
            price.name,
            price.len(),
            weather.len()
        )));
    }
    let initial_count = joined.len();
    info!(rows = initial_count, "Price and weather series joined");

    let complete: Vec<(NaiveDate, f64, f64, Option<f64>)> = joined
        .iter()
        .filter_map(|r| match (r.price, r.rainfall_mm) {
            (Some(p), Some(rain)) if p.is_finite() && rain.is_finite() => {
                Some((r.date, p, rain, r.rain_probability_pct))
            }
            _ => None,
        })
        .collect();
    let dropped_missing = initial_count - complete.len();

    let priced: Vec<_> = complete
        .into_iter()
        .filter(|(_, p, _, _)| *p > rules.price_floor)
        .collect();
    let dropped_invalid_price = initial_count - dropped_missing - priced.len();

    let cleaned: Vec<AlignedRecord> = priced
        .into_iter()
        .filter(|(_, _, rain, _)| *rain >= 0.0)
        .map(|(date, price, rainfall_mm, rain_probability_pct)| AlignedRecord {
            date,
            price,
            rainfall_mm,
            rain_probability_pct,
        })
        .collect();
    let dropped_negative_rain = initial_count - dropped_missing - dropped_invalid_price - cleaned.len();

    let report = CleaningReport {
        price_column: price.name.clone(),
        initial_count,
        dropped_missing,
        dropped_invalid_price,
        dropped_negative_rain,
        final_count: cleaned.len(),
    };

    info!(
        initial = report.initial_count,
        dropped_missing = report.dropped_missing,
        dropped_invalid_price = report.dropped_invalid_price,
        dropped_negative_rain = report.dropped_negative_rain,
        remaining = report.final_count,
        "Aligned rows cleaned"
    );

    Ok((cleaned, report))
}
