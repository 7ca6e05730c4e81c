//! Order ledger: normalizes raw brokerage orders into trade events and
//! caches them locally so repeat runs can skip the network

pub mod store;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::broker::{BrokerClient, BrokerError, OrderRecord, SymbolResolver};
use crate::data_paths::DataPaths;

pub use store::LedgerStore;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("unrecognized trade side {0:?}")]
    UnknownSide(String),

    #[error("invalid {field} value {value:?} in order record")]
    InvalidField { field: &'static str, value: String },

    #[error("symbol resolution failed: {0}")]
    Resolve(#[from] BrokerError),
}

/// Buy or sell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl FromStr for TradeSide {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(TradeSide::Buy),
            "sell" => Ok(TradeSide::Sell),
            other => Err(LedgerError::UnknownSide(other.to_string())),
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

/// A single filled trade, immutable once created
#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub symbol: String,
    pub side: TradeSide,
    pub shares: Decimal,
    pub price: Decimal,
    pub executed_at: DateTime<Utc>,
}

impl TradeEvent {
    /// UTC calendar date of the execution
    pub fn trade_date(&self) -> NaiveDate {
        self.executed_at.date_naive()
    }

    /// Share delta: buys add, sells subtract
    pub fn signed_shares(&self) -> Decimal {
        match self.side {
            TradeSide::Buy => self.shares,
            TradeSide::Sell => -self.shares,
        }
    }

    /// Cash delta: buys spend cash (negative), sells return it (positive)
    pub fn signed_cost(&self) -> Decimal {
        match self.side {
            TradeSide::Buy => -(self.price * self.shares),
            TradeSide::Sell => self.price * self.shares,
        }
    }
}

/// Normalize raw order records into trade events.
///
/// Input arrives most-recent-first, so iteration is reversed. Only orders
/// in the `filled` state count; each contributes its last execution's price
/// and timestamp. A filled order with no executions is a data gap and is
/// skipped with a warning.
pub async fn events_from_orders(
    orders: Vec<OrderRecord>,
    resolver: &mut dyn SymbolResolver,
) -> Result<Vec<TradeEvent>, LedgerError> {
    let mut events = Vec::with_capacity(orders.len());

    for order in orders.into_iter().rev() {
        if order.state != "filled" {
            continue;
        }

        let Some(execution) = order.executions.last() else {
            warn!(
                "Filled order for {} has no executions; skipping",
                order.instrument
            );
            continue;
        };

        let symbol = resolver.resolve(&order.instrument).await?;
        let side = order.side.parse::<TradeSide>()?;
        let shares =
            Decimal::from_str(&order.quantity).map_err(|_| LedgerError::InvalidField {
                field: "quantity",
                value: order.quantity.clone(),
            })?;
        let price = Decimal::from_str(&execution.price).map_err(|_| LedgerError::InvalidField {
            field: "price",
            value: execution.price.clone(),
        })?;
        let executed_at = DateTime::parse_from_rfc3339(&execution.timestamp)
            .map_err(|_| LedgerError::InvalidField {
                field: "timestamp",
                value: execution.timestamp.clone(),
            })?
            .with_timezone(&Utc);

        events.push(TradeEvent {
            symbol,
            side,
            shares,
            price,
            executed_at,
        });
    }

    Ok(events)
}

/// The order ledger: cached trade events with fetch-on-miss
pub struct OrderLedger {
    store: LedgerStore,
}

impl OrderLedger {
    pub fn new(data_paths: &DataPaths) -> Self {
        Self {
            store: LedgerStore::new(data_paths.order_history()),
        }
    }

    /// Load the newest cached generation, or fetch, normalize, and cache a
    /// fresh one. The cache is replace-or-skip: a hit bypasses the network
    /// entirely. Events come back sorted by execution time.
    pub async fn load_or_fetch(
        &self,
        client: &mut BrokerClient,
        use_cache: bool,
    ) -> Result<Vec<TradeEvent>> {
        if use_cache {
            if let Some(mut events) = self
                .store
                .load_newest()
                .context("Failed to read cached order ledger")?
            {
                events.sort_by_key(|e| e.executed_at);
                return Ok(events);
            }
        }

        info!("Not using cache, retrieving order history from brokerage");
        let raw = client
            .fetch_all_orders()
            .await
            .context("Failed to fetch order history")?;
        let mut events = events_from_orders(raw, client)
            .await
            .context("Failed to normalize order history")?;

        if !events.is_empty() {
            self.store
                .save_generation(&events)
                .context("Failed to write order ledger cache")?;
        }

        events.sort_by_key(|e| e.executed_at);
        Ok(events)
    }
}
