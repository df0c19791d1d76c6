//! Series normalization.
//!
//! Turns the two raw upstream shapes into keyed daily series:
//!
//! - wide price grid → long records → keyword filter → per-day mean
//! - nested weather trend chart → per-day rainfall / rain probability
//!
//! Malformed *values* are never errors (they become missing); malformed
//! *date tokens* are, because a wrong date would silently corrupt the join.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info};

use crate::data::{RawPriceTable, TrendChart};
use crate::domain::{DailySeries, RawSeriesRecord, WeatherDay, WeatherTable};
use crate::error::AppError;

/// Entity name column of the price grid.
const NAME_FIELD: &str = "name";
/// Trend-day sub-field holding rainfall (mm).
pub const RAINFALL_FIELD: &str = "11";
/// Trend-day sub-field holding rain probability (%).
pub const RAIN_PROBABILITY_FIELD: &str = "72";

/// Reshape the wide grid into one record per (entity, date column).
///
/// Only headers containing `/` are date columns; they must parse as `dd/mm/yyyy`.
pub fn melt_price_table(table: &RawPriceTable) -> Result<Vec<RawSeriesRecord>, AppError> {
    let mut out = Vec::new();
    for row in &table.data {
        let entity_name = row
            .get(NAME_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        for (header, cell) in row.iter().filter(|(k, _)| k.contains('/')) {
            let date = NaiveDate::parse_from_str(header.trim(), "%d/%m/%Y").map_err(|e| {
                AppError::malformed(format!("Invalid price date column '{header}': {e}"))
            })?;
            out.push(RawSeriesRecord {
                entity_name: entity_name.clone(),
                date,
                value: coerce_price(cell),
            });
        }
    }
    Ok(out)
}

/// Coerce a grid cell to a number.
///
/// Strings are locale formatted (`"15.000"` is fifteen thousand): every `.`
/// and `,` is stripped before parsing. Anything unparseable is missing.
pub fn coerce_price(cell: &Value) -> Option<f64> {
    let v = match cell {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != '.' && *c != ',').collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    v.is_finite().then_some(v)
}

/// Build the daily price series for entities whose name contains `name_filter`.
///
/// The value for a date is the arithmetic mean over all matching entities
/// with a value on that date; a date where every matching cell is missing
/// keeps a missing value.
pub fn normalize_price_table(
    table: &RawPriceTable,
    name_filter: &str,
    column: &str,
) -> Result<DailySeries, AppError> {
    let records = melt_price_table(table)?;
    if records.is_empty() {
        return Err(AppError::empty_result("Price table has no date columns."));
    }

    let needle = name_filter.to_lowercase();
    let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    let mut matched = 0usize;

    for rec in records
        .iter()
        .filter(|r| r.entity_name.to_lowercase().contains(&needle))
    {
        matched += 1;
        let slot = sums.entry(rec.date).or_insert((0.0, 0));
        if let Some(v) = rec.value {
            slot.0 += v;
            slot.1 += 1;
        }
    }

    if matched == 0 {
        return Err(AppError::empty_result(format!(
            "No entity name contains '{name_filter}' in the price table."
        )));
    }

    let mut series = DailySeries::new(column);
    for (date, (sum, n)) in sums {
        let mean = if n > 0 { Some(sum / n as f64) } else { None };
        series.values.insert(date, mean);
    }

    info!(column, records = matched, days = series.len(), "Price series normalized");
    Ok(series)
}

/// Build the weather table from the trend chart.
///
/// An absent sub-field defaults to `0.0`; a present but `null` (or
/// non-numeric) sub-field is missing.
pub fn normalize_weather_table(chart: &TrendChart) -> Result<WeatherTable, AppError> {
    if chart.is_empty() {
        return Err(AppError::empty_result("Weather trend chart is empty."));
    }

    let mut table = WeatherTable::default();
    for (key, entry) in chart {
        let date = parse_weather_date(key)?;
        let day = WeatherDay {
            rainfall_mm: read_metric(&entry.trend_days, RAINFALL_FIELD),
            rain_probability_pct: read_metric(&entry.trend_days, RAIN_PROBABILITY_FIELD),
        };
        if table.days.contains_key(&date) {
            debug!(key = %key, "Duplicate weather day ignored");
            continue;
        }
        table.days.insert(date, day);
    }

    info!(days = table.len(), "Weather table normalized");
    Ok(table)
}

fn read_metric(fields: &BTreeMap<String, Value>, key: &str) -> Option<f64> {
    match fields.get(key) {
        None => Some(0.0),
        Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Some(_) => None,
    }
}

/// Parse a weather date key into a calendar day, discarding any time part.
fn parse_weather_date(key: &str) -> Result<NaiveDate, AppError> {
    let key = key.trim();
    if let Some(prefix) = key.get(..10) {
        if let Ok(d) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Ok(d);
        }
    }
    NaiveDate::parse_from_str(key, "%Y%m%d").map_err(|_| {
        AppError::malformed(format!(
            "Invalid weather date '{key}'. Expected YYYY-MM-DD, YYYYMMDD or an ISO timestamp."
        ))
    })
}
