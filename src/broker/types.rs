//! Wire types for the brokerage REST API and their validated domain forms

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// Brokerage API errors
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("MFA code required")]
    MfaRequired,

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid transfer record: {0}")]
    InvalidTransfer(String),
}

/// Login response. The API either challenges for MFA or hands out a token.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub mfa_required: Option<bool>,
}

/// One page of order records
#[derive(Debug, Deserialize)]
pub struct OrdersPage {
    pub results: Vec<OrderRecord>,
    pub next: Option<String>,
}

/// Raw order record as returned by the orders endpoint. Numeric fields come
/// over the wire as strings and are parsed at the ingestion boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRecord {
    pub state: String,
    pub side: String,
    pub quantity: String,
    pub instrument: String,
    #[serde(default)]
    pub executions: Vec<ExecutionRecord>,
}

/// A single fill against an order
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionRecord {
    pub price: String,
    pub timestamp: String,
}

/// Instrument metadata; only the ticker symbol is of interest
#[derive(Debug, Deserialize)]
pub struct InstrumentRecord {
    pub symbol: String,
}

/// One page of transfer records
#[derive(Debug, Deserialize)]
pub struct TransfersPage {
    pub results: Vec<TransferRecord>,
    pub next: Option<String>,
}

/// Raw bank transfer record
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRecord {
    pub created_at: String,
    pub amount: String,
    pub direction: String,
}

/// Direction of a cash transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Deposit,
    Withdrawal,
}

/// A validated cash transfer. Affects portfolio cash flow on or after `date`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferEvent {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub kind: TransferKind,
}

impl TransferEvent {
    /// Deposits add cash, withdrawals remove it
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransferKind::Deposit => self.amount,
            TransferKind::Withdrawal => -self.amount,
        }
    }
}

impl TransferRecord {
    /// Validate a raw record into a TransferEvent. Unknown directions and
    /// malformed dates or amounts are rejected here, never downstream.
    pub fn into_event(self) -> Result<TransferEvent, BrokerError> {
        let date_part = self
            .created_at
            .split('T')
            .next()
            .unwrap_or(self.created_at.as_str());
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| {
            BrokerError::InvalidTransfer(format!("bad created_at {:?}: {}", self.created_at, e))
        })?;

        let amount = Decimal::from_str(&self.amount).map_err(|e| {
            BrokerError::InvalidTransfer(format!("bad amount {:?}: {}", self.amount, e))
        })?;

        let kind = match self.direction.as_str() {
            "deposit" => TransferKind::Deposit,
            "withdraw" | "withdrawal" => TransferKind::Withdrawal,
            other => {
                return Err(BrokerError::InvalidTransfer(format!(
                    "unknown direction {:?}",
                    other
                )))
            }
        };

        Ok(TransferEvent { date, amount, kind })
    }
}
