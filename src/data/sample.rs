//! Seeded synthetic price and weather tables.
//!
//! The tables come out in the same raw shapes the live clients return
//! (locale-formatted price strings, string-keyed trend chart), so an offline
//! run still exercises normalization end to end.

use chrono::NaiveDate;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Bernoulli, Gamma, Normal};
use serde_json::{Map, Value};

use crate::data::{
    PriceFetcher, PriceQuery, RawPriceTable, TrendChart, TrendEntry, WeatherFetcher, WeatherQuery,
};
use crate::domain::{Commodity, DateWindow};
use crate::error::AppError;

/// Probability that a day has measurable rain.
const WET_DAY_PROB: f64 = 0.45;
/// Gamma shape/scale for rain amounts on wet days (mm).
const RAIN_SHAPE: f64 = 0.8;
const RAIN_SCALE: f64 = 9.0;
/// Probability that a price cell is published as `-`.
const GAP_PROB: f64 = 0.03;
/// Probability that the rain-probability field is absent for a day.
const MISSING_PROBABILITY_PROB: f64 = 0.02;
/// Daily log-price volatility.
const DAILY_SIGMA: f64 = 0.004;
/// Log-price bump applied on wet days (supply disruption).
const WET_DAY_PREMIUM: f64 = 0.002;
/// Prices are quoted in steps of this many currency units.
const PRICE_TICK: f64 = 50.0;

const DECOY_ENTITY: &str = "Minyak Goreng Curah";
const DECOY_BASE: f64 = 19_000.0;

#[derive(Debug, Clone, Copy)]
struct SampleDay {
    date: NaiveDate,
    rainfall_mm: f64,
    probability_pct: Option<f64>,
}

/// Offline data source. Same seed and window give identical tables.
#[derive(Debug, Clone, Copy)]
pub struct SampleSource {
    seed: u64,
}

impl SampleSource {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn sample_days(&self, window: &DateWindow) -> Result<Vec<SampleDay>, AppError> {
        if window.end < window.start {
            return Err(AppError::config(format!("Invalid sample window {window}.")));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let wet = Bernoulli::new(WET_DAY_PROB)
            .map_err(|e| AppError::config(format!("Rain distribution error: {e}")))?;
        let amount = Gamma::new(RAIN_SHAPE, RAIN_SCALE)
            .map_err(|e| AppError::config(format!("Rain distribution error: {e}")))?;

        let mut days = Vec::new();
        for date in window.start.iter_days().take_while(|d| *d <= window.end) {
            let is_wet = wet.sample(&mut rng);
            let rainfall_mm = if is_wet {
                round1(amount.sample(&mut rng).max(0.1))
            } else {
                0.0
            };
            let probability_pct = if rng.gen_bool(MISSING_PROBABILITY_PROB) {
                None
            } else if is_wet {
                Some(rng.gen_range(50.0_f64..95.0).round())
            } else {
                Some(rng.gen_range(0.0_f64..40.0).round())
            };
            days.push(SampleDay {
                date,
                rainfall_mm,
                probability_pct,
            });
        }
        Ok(days)
    }

    fn price_seed(&self, commodity: Commodity) -> u64 {
        let idx = Commodity::ALL.iter().position(|c| *c == commodity).unwrap_or(0) as u64;
        self.seed ^ (0x9E37_79B9_7F4A_7C15_u64.wrapping_mul(idx + 1))
    }
}

fn base_price(commodity: Commodity) -> f64 {
    match commodity {
        Commodity::Sugar => 17_500.0,
        Commodity::Chili => 45_000.0,
        Commodity::Rice => 13_500.0,
    }
}

fn entity_names(commodity: Commodity) -> &'static [&'static str] {
    match commodity {
        Commodity::Sugar => &["Gula Pasir Lokal", "Gula Pasir Kualitas Premium"],
        Commodity::Chili => &["Cabai Rawit Hijau", "Cabai Rawit Merah"],
        Commodity::Rice => &[
            "Beras Kualitas Bawah I",
            "Beras Kualitas Medium I",
            "Beras Kualitas Super I",
        ],
    }
}

/// Format an integer with `.` as thousands separator (`17500` → `"17.500"`).
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

impl PriceFetcher for SampleSource {
    fn fetch_prices(&self, query: &PriceQuery) -> Result<RawPriceTable, AppError> {
        let days = self.sample_days(&query.window)?;
        let mut rng = StdRng::seed_from_u64(self.price_seed(query.commodity));
        let normal = Normal::new(0.0, DAILY_SIGMA)
            .map_err(|e| AppError::config(format!("Noise distribution error: {e}")))?;

        let base = base_price(query.commodity);
        let mut entities: Vec<(&str, f64)> = entity_names(query.commodity)
            .iter()
            .enumerate()
            .map(|(i, name)| (*name, base * (1.0 + 0.04 * i as f64)))
            .collect();
        entities.push((DECOY_ENTITY, DECOY_BASE));

        let mut data = Vec::with_capacity(entities.len());
        for (idx, (name, level)) in entities.iter_mut().enumerate() {
            let mut row = Map::new();
            row.insert("no".to_string(), Value::from(idx as u64 + 1));
            row.insert("name".to_string(), Value::from(*name));

            for day in &days {
                let premium = if day.rainfall_mm > 0.0 { WET_DAY_PREMIUM } else { 0.0 };
                *level *= (normal.sample(&mut rng) + premium).exp();

                let cell = if rng.gen_bool(GAP_PROB) {
                    "-".to_string()
                } else {
                    let quoted = (*level / PRICE_TICK).round() * PRICE_TICK;
                    format_thousands(quoted as i64)
                };
                row.insert(day.date.format("%d/%m/%Y").to_string(), Value::from(cell));
            }
            data.push(row);
        }

        Ok(RawPriceTable { data })
    }
}

impl WeatherFetcher for SampleSource {
    fn fetch_weather(&self, query: &WeatherQuery) -> Result<TrendChart, AppError> {
        let days = self.sample_days(&query.window)?;
        let mut chart = TrendChart::new();
        for day in days {
            let mut entry = TrendEntry::default();
            entry
                .trend_days
                .insert("11".to_string(), Value::from(day.rainfall_mm));
            if let Some(p) = day.probability_pct {
                entry.trend_days.insert("72".to_string(), Value::from(p));
            }
            chart.insert(day.date.format("%Y-%m-%dT00:00:00").to_string(), entry);
        }
        Ok(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Region;

    fn window() -> DateWindow {
        DateWindow {
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        }
    }

    #[test]
    fn thousands_separator_formatting() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(950), "950");
        assert_eq!(format_thousands(17_500), "17.500");
        assert_eq!(format_thousands(1_234_567), "1.234.567");
        assert_eq!(format_thousands(-15_000), "-15.000");
    }

    #[test]
    fn same_seed_gives_identical_tables() {
        let query = PriceQuery {
            commodity: Commodity::Sugar,
            region: Region::default(),
            window: window(),
        };
        let a = SampleSource::new(7).fetch_prices(&query).unwrap();
        let b = SampleSource::new(7).fetch_prices(&query).unwrap();
        assert_eq!(a.data, b.data);

        let c = SampleSource::new(8).fetch_prices(&query).unwrap();
        assert_ne!(a.data, c.data);
    }

    #[test]
    fn price_rows_cover_every_day_plus_decoy() {
        let query = PriceQuery {
            commodity: Commodity::Rice,
            region: Region::default(),
            window: window(),
        };
        let table = SampleSource::new(1).fetch_prices(&query).unwrap();
        assert_eq!(table.data.len(), 4);
        for row in &table.data {
            let date_cols = row.keys().filter(|k| k.contains('/')).count();
            assert_eq!(date_cols, 31);
        }
        assert_eq!(table.data[3]["name"], Value::from(DECOY_ENTITY));
    }

    #[test]
    fn weather_chart_has_non_negative_rain() {
        let query = WeatherQuery {
            latitude: -4.04,
            longitude: 122.49,
            window: window(),
        };
        let chart = SampleSource::new(3).fetch_weather(&query).unwrap();
        assert_eq!(chart.len(), 31);
        for entry in chart.values() {
            let rain = entry.trend_days["11"].as_f64().unwrap();
            assert!(rain >= 0.0);
        }
    }
}
