//! Upstream data sources.
//!
//! The pipeline only sees the two fetcher traits. Implementations:
//!
//! - `bi`: retail price grid over HTTP
//! - `msn`: weather trend chart over HTTP
//! - `sample`: seeded synthetic tables for offline runs and tests
//!
//! Fetchers never retry; transport errors reach the caller unmodified.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::{Commodity, DateWindow, Region};
use crate::error::AppError;

pub mod bi;
pub mod msn;
pub mod sample;

pub use bi::BiPriceClient;
pub use msn::MsnWeatherClient;
pub use sample::SampleSource;

/// Browser-like agent; both upstreams reject the default reqwest agent.
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Wide price table: one object per entity, one key per date column.
///
/// Besides the date columns (`dd/mm/yyyy`) a row carries a `name` and
/// whatever bookkeeping fields the upstream adds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPriceTable {
    #[serde(default)]
    pub data: Vec<Map<String, Value>>,
}

/// Per-day entry of the weather trend chart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendEntry {
    #[serde(rename = "trendDays", default)]
    pub trend_days: BTreeMap<String, Value>,
}

/// Weather trend chart keyed by the upstream's date string.
pub type TrendChart = BTreeMap<String, TrendEntry>;

#[derive(Debug, Clone)]
pub struct PriceQuery {
    pub commodity: Commodity,
    pub region: Region,
    pub window: DateWindow,
}

#[derive(Debug, Clone)]
pub struct WeatherQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub window: DateWindow,
}

pub trait PriceFetcher {
    fn fetch_prices(&self, query: &PriceQuery) -> Result<RawPriceTable, AppError>;
}

pub trait WeatherFetcher {
    fn fetch_weather(&self, query: &WeatherQuery) -> Result<TrendChart, AppError>;
}
