//! Historical price cache
//!
//! Keeps one CSV of daily closes per symbol under the data directory and
//! tops each one up from the price API before a returns run. Fetch windows
//! are sized to the cache gap, so a warm cache costs zero requests.

pub mod provider;
pub mod store;

pub use provider::{
    FetchRange, HttpPriceProvider, PricePoint, PriceProvider, ProviderError,
    DEFAULT_PRICE_API_URL,
};
pub use store::PriceStore;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::data_paths::DataPaths;

pub struct PriceCache {
    store: PriceStore,
}

impl PriceCache {
    pub fn new(data_paths: &DataPaths) -> Self {
        Self {
            store: PriceStore::new(data_paths.price_history()),
        }
    }

    /// Bring every symbol's cached series up to `end_date`. Symbols with no
    /// cache get a full-history fetch; stale ones get the smallest window
    /// that spans the gap; current ones are left alone.
    pub async fn ensure_coverage(
        &self,
        provider: &dyn PriceProvider,
        symbols: &BTreeSet<String>,
        end_date: NaiveDate,
    ) -> Result<()> {
        debug!(
            "Checking price coverage for {} symbols via {}",
            symbols.len(),
            provider.name()
        );
        for symbol in symbols {
            let last_cached = self
                .store
                .last_cached_date(symbol)
                .with_context(|| format!("Failed to read cached prices for {}", symbol))?;

            match last_cached {
                None => {
                    info!("No cached prices for {}, requesting full history", symbol);
                    let points = provider
                        .fetch_history(symbol, FetchRange::Max)
                        .await
                        .with_context(|| format!("Failed to fetch price history for {}", symbol))?;
                    self.store
                        .write_full(symbol, &points)
                        .with_context(|| format!("Failed to cache prices for {}", symbol))?;
                }
                Some(last) if last < end_date => {
                    let range = FetchRange::for_gap(last, end_date);
                    info!(
                        "Prices for {} cached through {}, requesting {} window",
                        symbol, last, range
                    );
                    let points = provider
                        .fetch_history(symbol, range)
                        .await
                        .with_context(|| format!("Failed to fetch price history for {}", symbol))?;
                    let added = self
                        .store
                        .append_newer(symbol, &points, last)
                        .with_context(|| format!("Failed to cache prices for {}", symbol))?;
                    debug!("Cached {} new closes for {}", added, symbol);
                }
                Some(last) => {
                    debug!("Prices for {} current through {}", symbol, last);
                }
            }
        }
        Ok(())
    }

    /// Date -> symbol -> close over the inclusive range, from cache only
    pub fn table_for_range(
        &self,
        symbols: &BTreeSet<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, BTreeMap<String, Decimal>>> {
        let list: Vec<String> = symbols.iter().cloned().collect();
        self.store
            .table_for_range(&list, start, end)
            .context("Failed to load cached prices")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn symbols(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn cache_in(dir: &std::path::Path) -> (PriceCache, DataPaths) {
        let paths = DataPaths::new(dir);
        paths.ensure_directories().unwrap();
        (PriceCache::new(&paths), paths)
    }

    #[tokio::test]
    async fn test_cold_cache_requests_full_history() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stock/AAPL/chart/max"))
            .and(query_param("token", "tok"))
            .and(query_param("chartCloseOnly", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"date": "2021-01-04", "close": 10.0},
                {"date": "2021-01-05", "close": 10.5},
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (cache, _paths) = cache_in(dir.path());
        let provider = HttpPriceProvider::new(&server.uri(), Some("tok".to_string())).unwrap();

        cache
            .ensure_coverage(&provider, &symbols(&["AAPL"]), date(2021, 1, 5))
            .await
            .unwrap();

        let table = cache
            .table_for_range(&symbols(&["AAPL"]), date(2021, 1, 4), date(2021, 1, 5))
            .unwrap();
        assert_eq!(table[&date(2021, 1, 5)]["AAPL"], dec!(10.5));
    }

    #[tokio::test]
    async fn test_stale_cache_fetches_gap_window_only() {
        let server = MockServer::start().await;
        // Two days behind resolves to the five day window
        Mock::given(method("GET"))
            .and(path("/stock/AAPL/chart/5d"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"date": "2021-01-04", "close": 99.0},
                {"date": "2021-01-05", "close": 10.5},
                {"date": "2021-01-06", "close": 11.0},
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (cache, paths) = cache_in(dir.path());
        let seed = PriceStore::new(paths.price_history());
        seed.write_full(
            "AAPL",
            &[PricePoint {
                date: date(2021, 1, 4),
                close: dec!(10.0),
            }],
        )
        .unwrap();

        let provider = HttpPriceProvider::new(&server.uri(), Some("tok".to_string())).unwrap();
        cache
            .ensure_coverage(&provider, &symbols(&["AAPL"]), date(2021, 1, 6))
            .await
            .unwrap();

        let table = cache
            .table_for_range(&symbols(&["AAPL"]), date(2021, 1, 4), date(2021, 1, 6))
            .unwrap();
        assert_eq!(table.len(), 3);
        // Overlapping row from the fetch did not rewrite cached history
        assert_eq!(table[&date(2021, 1, 4)]["AAPL"], dec!(10.0));
        assert_eq!(table[&date(2021, 1, 6)]["AAPL"], dec!(11.0));
    }

    #[tokio::test]
    async fn test_current_cache_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (cache, paths) = cache_in(dir.path());
        let seed = PriceStore::new(paths.price_history());
        seed.write_full(
            "AAPL",
            &[PricePoint {
                date: date(2021, 1, 6),
                close: dec!(11.0),
            }],
        )
        .unwrap();

        let provider = HttpPriceProvider::new(&server.uri(), Some("tok".to_string())).unwrap();
        cache
            .ensure_coverage(&provider, &symbols(&["AAPL"]), date(2021, 1, 6))
            .await
            .unwrap();
        // A second pass over the same state is also free
        cache
            .ensure_coverage(&provider, &symbols(&["AAPL"]), date(2021, 1, 6))
            .await
            .unwrap();
    }
}
