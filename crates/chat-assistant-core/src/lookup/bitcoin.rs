use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::LOOKUP_TIMEOUT;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Deserialize)]
struct HistoricalCloseResponse {
    bpi: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Daily closing prices, sorted by date.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PriceHistory {
    points: Vec<PricePoint>,
}

impl PriceHistory {
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn min(&self) -> Option<PricePoint> {
        self.points
            .iter()
            .copied()
            .min_by(|a, b| a.price.total_cmp(&b.price))
    }

    pub fn max(&self) -> Option<PricePoint> {
        self.points
            .iter()
            .copied()
            .max_by(|a, b| a.price.total_cmp(&b.price))
    }

    /// Parses a `{"bpi": {"YYYY-MM-DD": price, ...}}` body.
    pub fn from_json(body: &str) -> Result<Self> {
        let response: HistoricalCloseResponse =
            serde_json::from_str(body).context("Unexpected price response format")?;

        let mut points = response
            .bpi
            .into_iter()
            .map(|(date, price)| {
                NaiveDate::parse_from_str(&date, DATE_FORMAT)
                    .map(|date| PricePoint { date, price })
                    .with_context(|| format!("Invalid date in price data: {}", date))
            })
            .collect::<Result<Vec<_>>>()?;
        points.sort_by_key(|p| p.date);

        Ok(Self { points })
    }
}

/// Historical Bitcoin closing prices from the CoinDesk price index.
#[derive(Clone)]
pub struct BitcoinClient {
    client: Client,
    base_url: String,
}

impl BitcoinClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn history_request(&self, start: NaiveDate, end: NaiveDate) -> RequestBuilder {
        let url = format!("{}/v1/bpi/historical/close.json", self.base_url);
        let start = start.format(DATE_FORMAT).to_string();
        let end = end.format(DATE_FORMAT).to_string();

        self.client
            .get(&url)
            .timeout(LOOKUP_TIMEOUT)
            .query(&[("start", start.as_str()), ("end", end.as_str())])
    }

    pub async fn fetch_history(&self, start: NaiveDate, end: NaiveDate) -> Result<PriceHistory> {
        if start > end {
            bail!("Start date must be on or before the end date");
        }

        info!(%start, %end, "downloading bitcoin price history");
        let response = self.history_request(start, end).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Price download failed with status code: {}",
                response.status().as_u16()
            ));
        }

        let body = response.text().await?;
        PriceHistory::from_json(&body)
    }
}
