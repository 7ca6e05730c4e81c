//! Historical-price provider: range keywords and the HTTP chart client

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Production price API host
pub const DEFAULT_PRICE_API_URL: &str = "https://cloud.iexapis.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("price API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("no price API token configured; pass --price-token or set FOLIOSCOPE_PRICE_TOKEN")]
    MissingToken,
}

/// Chart range keywords accepted by the price API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRange {
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    Max,
}

impl FetchRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchRange::FiveDays => "5d",
            FetchRange::OneMonth => "1m",
            FetchRange::ThreeMonths => "3m",
            FetchRange::SixMonths => "6m",
            FetchRange::OneYear => "1y",
            FetchRange::TwoYears => "2y",
            FetchRange::Max => "max",
        }
    }

    /// Pick the smallest range that covers the gap between the last cached
    /// date and the target date. Thresholds compare calendar components,
    /// not elapsed days.
    pub fn for_gap(last_cached: NaiveDate, target: NaiveDate) -> FetchRange {
        let year_diff = target.year() - last_cached.year();
        if year_diff >= 2 {
            return FetchRange::Max;
        }
        if year_diff == 1 {
            return FetchRange::TwoYears;
        }

        let month_diff = year_diff * 12 + target.month() as i32 - last_cached.month() as i32;
        if month_diff > 6 {
            FetchRange::OneYear
        } else if month_diff > 3 {
            FetchRange::SixMonths
        } else if month_diff > 1 {
            FetchRange::ThreeMonths
        } else if (target - last_cached).num_days() > 5 {
            FetchRange::OneMonth
        } else {
            FetchRange::FiveDays
        }
    }
}

impl fmt::Display for FetchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One daily close from the chart endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Decimal,
}

/// Source of historical daily closes
#[async_trait]
pub trait PriceProvider {
    /// Name of the provider, for logging
    fn name(&self) -> &str;

    /// Fetch the close series for a symbol over a range keyword
    async fn fetch_history(
        &self,
        symbol: &str,
        range: FetchRange,
    ) -> Result<Vec<PricePoint>, ProviderError>;
}

/// Chart-endpoint provider. The API token is optional at construction and
/// only demanded when a request is actually made, so fully cached runs
/// work without one.
pub struct HttpPriceProvider {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpPriceProvider {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait]
impl PriceProvider for HttpPriceProvider {
    fn name(&self) -> &str {
        "chart API"
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        range: FetchRange,
    ) -> Result<Vec<PricePoint>, ProviderError> {
        let token = self.token.as_deref().ok_or(ProviderError::MissingToken)?;
        let url = format!("{}/stock/{}/chart/{}", self.base_url, symbol, range);

        let response = self
            .client
            .get(&url)
            .query(&[("token", token), ("chartCloseOnly", "true")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "No error details".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let points: Vec<PricePoint> = response.json().await?;
        debug!("Fetched {} price points for {} ({})", points.len(), symbol, range);
        Ok(points)
    }
}
