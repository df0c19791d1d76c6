//! Retail price grid client (regional daily price table).

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use tracing::{debug, info};

use crate::data::{PriceFetcher, PriceQuery, RawPriceTable, USER_AGENT};
use crate::error::AppError;

const BASE_URL: &str = "https://www.bi.go.id/hargapangan/WebSite/TabelHarga/GetGridDataDaerah";

pub struct BiPriceClient {
    client: Client,
}

impl BiPriceClient {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

/// Query parameters for one grid request.
fn query_params(query: &PriceQuery) -> Vec<(&'static str, String)> {
    vec![
        ("price_type_id", query.region.price_type_id.to_string()),
        ("comcat_id", query.commodity.category_ids().join(",")),
        ("province_id", query.region.province_id.to_string()),
        ("regency_id", query.region.regency_id.clone()),
        ("market_id", query.region.market_id.clone()),
        ("tipe_laporan", query.region.report_type.to_string()),
        ("start_date", query.window.start.format("%Y-%m-%d").to_string()),
        ("end_date", query.window.end.format("%Y-%m-%d").to_string()),
    ]
}

impl PriceFetcher for BiPriceClient {
    fn fetch_prices(&self, query: &PriceQuery) -> Result<RawPriceTable, AppError> {
        let params = query_params(query);
        info!(url = BASE_URL, commodity = %query.commodity, window = %query.window, "Downloading price grid");

        let resp = self
            .client
            .get(BASE_URL)
            .query(&params)
            .header(ACCEPT, "*/*")
            .send()
            .map_err(|e| AppError::transport(format!("Price request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::transport(format!(
                "Price request failed with status {}.",
                resp.status()
            )));
        }

        let table: RawPriceTable = resp
            .json()
            .map_err(|e| AppError::malformed(format!("Failed to parse price grid: {e}")))?;

        if table.data.is_empty() {
            return Err(AppError::empty_result(
                "Price grid is empty or its JSON format changed.",
            ));
        }

        debug!(rows = table.data.len(), "Price grid received");
        Ok(table)
    }
}
