//! Authenticated brokerage client: paginated order/transfer fetch and
//! instrument-to-symbol resolution

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::broker::session::{Session, REQUEST_TIMEOUT};
use crate::broker::types::{
    BrokerError, InstrumentRecord, OrderRecord, OrdersPage, TransferEvent, TransfersPage,
};

/// Resolves an opaque instrument reference to a ticker symbol
#[async_trait]
pub trait SymbolResolver {
    async fn resolve(&mut self, instrument_url: &str) -> Result<String, BrokerError>;
}

pub struct BrokerClient {
    client: reqwest::Client,
    base_url: String,
    session: Session,
    instrument_cache: HashMap<String, String>,
}

impl BrokerClient {
    pub fn new(base_url: &str, session: Session) -> Result<Self, BrokerError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            instrument_cache: HashMap::new(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, BrokerError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(self.session.token())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "No error details".to_string());
            return Err(BrokerError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch the complete order history, following the `next` cursor until
    /// exhausted. Records come back most-recent-first.
    pub async fn fetch_all_orders(&self) -> Result<Vec<OrderRecord>, BrokerError> {
        let mut records = Vec::new();
        let mut url = format!("{}/orders/", self.base_url);
        let mut page_num = 0usize;

        loop {
            let page: OrdersPage = self.get_json(&url).await?;
            page_num += 1;
            debug!(
                "Fetched order page {} ({} records)",
                page_num,
                page.results.len()
            );
            records.extend(page.results);
            match page.next {
                Some(next) => url = next,
                None => break,
            }
        }

        info!("Fetched {} order records from brokerage", records.len());
        Ok(records)
    }

    /// Fetch and validate the complete transfer history, following the
    /// `next` cursor until exhausted.
    pub async fn fetch_all_transfers(&self) -> Result<Vec<TransferEvent>, BrokerError> {
        let mut transfers = Vec::new();
        let mut url = format!("{}/ach/transfers/", self.base_url);

        loop {
            let page: TransfersPage = self.get_json(&url).await?;
            for record in page.results {
                transfers.push(record.into_event()?);
            }
            match page.next {
                Some(next) => url = next,
                None => break,
            }
        }

        info!("Fetched {} transfers from brokerage", transfers.len());
        Ok(transfers)
    }
}

#[async_trait]
impl SymbolResolver for BrokerClient {
    async fn resolve(&mut self, instrument_url: &str) -> Result<String, BrokerError> {
        if let Some(symbol) = self.instrument_cache.get(instrument_url) {
            return Ok(symbol.clone());
        }

        let instrument: InstrumentRecord = self.get_json(instrument_url).await?;
        debug!("Resolved instrument {} -> {}", instrument_url, instrument.symbol);
        self.instrument_cache
            .insert(instrument_url.to_string(), instrument.symbol.clone());
        Ok(instrument.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::types::TransferKind;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BrokerClient {
        BrokerClient::new(&server.uri(), Session::new("tok".to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_orders_pagination_accumulates_all_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/orders/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "state": "filled",
                    "side": "buy",
                    "quantity": "2.00000000",
                    "instrument": format!("{}/instruments/abc/", server.uri()),
                    "executions": [{"price": "11.00", "timestamp": "2021-02-02T15:00:00Z"}]
                }],
                "next": format!("{}/orders/page2/", server.uri())
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/orders/page2/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "state": "filled",
                    "side": "buy",
                    "quantity": "10.00000000",
                    "instrument": format!("{}/instruments/abc/", server.uri()),
                    "executions": [{"price": "10.00", "timestamp": "2021-01-04T15:00:00Z"}]
                }],
                "next": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let records = client.fetch_all_orders().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].quantity, "2.00000000");
        assert_eq!(records[1].quantity, "10.00000000");
    }

    #[tokio::test]
    async fn test_api_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders/"))
            .respond_with(ResponseTemplate::new(403).set_body_string("expired token"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.fetch_all_orders().await.unwrap_err();

        match err {
            BrokerError::Api { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "expired token");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_transfers_are_validated_on_ingestion() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ach/transfers/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"created_at": "2021-01-04T10:00:00Z", "amount": "100.00", "direction": "deposit"},
                    {"created_at": "2021-02-01T10:00:00Z", "amount": "25.00", "direction": "withdraw"}
                ],
                "next": null
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let transfers = client.fetch_all_transfers().await.unwrap();

        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].amount, dec!(100.00));
        assert_eq!(transfers[0].kind, TransferKind::Deposit);
        assert_eq!(transfers[1].signed_amount(), dec!(-25.00));
    }

    #[tokio::test]
    async fn test_unknown_transfer_direction_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ach/transfers/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"created_at": "2021-01-04T10:00:00Z", "amount": "100.00", "direction": "teleport"}
                ],
                "next": null
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.fetch_all_transfers().await.unwrap_err();
        assert!(matches!(err, BrokerError::InvalidTransfer(_)));
    }

    #[tokio::test]
    async fn test_symbol_resolution_is_memoized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instruments/abc/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "symbol": "AAPL",
                "id": "abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let url = format!("{}/instruments/abc/", server.uri());

        let first = client.resolve(&url).await.unwrap();
        let second = client.resolve(&url).await.unwrap();

        assert_eq!(first, "AAPL");
        assert_eq!(second, "AAPL");
    }
}
