//! Weather trend client (daily precipitation history for a coordinate).

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, REFERER};
use serde_json::Value;
use tracing::{debug, info};

use crate::data::{TrendChart, USER_AGENT, WeatherFetcher, WeatherQuery};
use crate::error::AppError;

const BASE_URL: &str = "https://assets.msn.com/service/weather/weathertrends";
pub const API_KEY_ENV: &str = "RAINPRICE_WEATHER_API_KEY";

pub struct MsnWeatherClient {
    client: Client,
    api_key: String,
}

impl MsnWeatherClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }

    /// Build a client from an explicit key, falling back to the environment (.env).
    pub fn from_env(explicit_key: Option<String>) -> Result<Self, AppError> {
        if let Some(key) = explicit_key {
            return Self::new(key);
        }
        dotenvy::dotenv().ok();
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            AppError::config(format!("Missing {API_KEY_ENV} in environment (.env)."))
        })?;
        Self::new(api_key)
    }
}

fn query_params(query: &WeatherQuery, api_key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("apiKey", api_key.to_string()),
        ("cm", "id-id".to_string()),
        ("locale", "id-id".to_string()),
        ("lon", query.longitude.to_string()),
        ("lat", query.latitude.to_string()),
        ("units", "C".to_string()),
        ("ocid", "msftweather".to_string()),
        ("includeWeatherTrends", "true".to_string()),
        ("includeCalendar", "false".to_string()),
        ("fdhead", "PRG-1SW-WXNCVF,PRG-1SW-WXTRLOG,PRG-1SW-WXTRLOGP-C".to_string()),
        ("weatherTrendsScenarios", "PrecipitationTrend".to_string()),
        ("days", query.window.days().to_string()),
        ("insights", "1".to_string()),
        ("startDate", query.window.start.format("%Y%m%d").to_string()),
        ("endDate", query.window.end.format("%Y%m%d").to_string()),
    ]
}

/// Locate the trend chart in a response body.
///
/// The chart normally sits at `value[0].responses[0].trendChart`; older
/// responses carry it at the top level.
pub fn extract_trend_chart(body: &Value) -> Result<TrendChart, AppError> {
    let chart = body
        .pointer("/value/0/responses/0/trendChart")
        .or_else(|| body.get("trendChart"));

    let Some(chart) = chart else {
        return Err(AppError::empty_result(
            "Weather trend data not found in response.",
        ));
    };

    let chart: TrendChart = serde_json::from_value(chart.clone())
        .map_err(|e| AppError::malformed(format!("Failed to parse weather trend chart: {e}")))?;

    if chart.is_empty() {
        return Err(AppError::empty_result(
            "Weather trend data not found in response.",
        ));
    }
    Ok(chart)
}

impl WeatherFetcher for MsnWeatherClient {
    fn fetch_weather(&self, query: &WeatherQuery) -> Result<TrendChart, AppError> {
        info!(
            url = BASE_URL,
            lat = query.latitude,
            lon = query.longitude,
            window = %query.window,
            "Downloading weather trends"
        );

        let resp = self
            .client
            .get(BASE_URL)
            .query(&query_params(query, &self.api_key))
            .header(ACCEPT, "*/*")
            .header(REFERER, "https://www.msn.com/")
            .send()
            .map_err(|e| AppError::transport(format!("Weather request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::transport(format!(
                "Weather request failed with status {}.",
                resp.status()
            )));
        }

        let body: Value = resp
            .json()
            .map_err(|e| AppError::malformed(format!("Failed to parse weather response: {e}")))?;

        let chart = extract_trend_chart(&body)?;
        debug!(days = chart.len(), "Weather trends received");
        Ok(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn extracts_nested_chart() {
        let body = json!({
            "value": [{ "responses": [{ "trendChart": {
                "2025-02-01": { "trendDays": { "11": 3.5, "72": 60 } }
            }}]}]
        });
        let chart = extract_trend_chart(&body).unwrap();
        assert_eq!(chart.len(), 1);
        assert_eq!(chart["2025-02-01"].trend_days["11"], json!(3.5));
    }

    #[test]
    fn falls_back_to_top_level_chart() {
        let body = json!({ "trendChart": { "2025-02-01": { "trendDays": {} } } });
        let chart = extract_trend_chart(&body).unwrap();
        assert!(chart["2025-02-01"].trend_days.is_empty());
    }

    #[test]
    fn missing_or_empty_chart_is_empty_result() {
        let err = extract_trend_chart(&json!({ "value": [] })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResult);

        let err = extract_trend_chart(&json!({ "trendChart": {} })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResult);
    }
}
