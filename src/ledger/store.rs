//! Generation-file storage for the trade ledger
//!
//! Each fetch writes a fresh timestamped CSV under `order_history/`; loads
//! pick the newest generation by name. Nothing is ever merged in place.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::ledger::{TradeEvent, TradeSide};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid ledger row: {0}")]
    InvalidRow(String),
}

/// On-disk row shape. Values stay textual so decimals round-trip exactly.
#[derive(Debug, Serialize, Deserialize)]
struct LedgerRow {
    symbol: String,
    side: String,
    shares: String,
    price: String,
    date: String,
}

impl From<&TradeEvent> for LedgerRow {
    fn from(event: &TradeEvent) -> Self {
        Self {
            symbol: event.symbol.clone(),
            side: event.side.to_string(),
            shares: event.shares.to_string(),
            price: event.price.to_string(),
            date: event.executed_at.to_rfc3339(),
        }
    }
}

impl LedgerRow {
    fn into_event(self) -> Result<TradeEvent, StoreError> {
        let side = self
            .side
            .parse::<TradeSide>()
            .map_err(|e| StoreError::InvalidRow(e.to_string()))?;
        let shares = Decimal::from_str(&self.shares)
            .map_err(|e| StoreError::InvalidRow(format!("shares {:?}: {}", self.shares, e)))?;
        let price = Decimal::from_str(&self.price)
            .map_err(|e| StoreError::InvalidRow(format!("price {:?}: {}", self.price, e)))?;
        let executed_at = DateTime::parse_from_rfc3339(&self.date)
            .map_err(|e| StoreError::InvalidRow(format!("date {:?}: {}", self.date, e)))?
            .with_timezone(&Utc);

        Ok(TradeEvent {
            symbol: self.symbol,
            side,
            shares,
            price,
            executed_at,
        })
    }
}

pub struct LedgerStore {
    dir: PathBuf,
}

impl LedgerStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Write a new generation file, atomically
    pub fn save_generation(&self, events: &[TradeEvent]) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.dir)?;

        let name = format!("{}.csv", Utc::now().format("%Y%m%d_%H%M%S_%6f"));
        let final_path = self.dir.join(&name);
        let temp_path = final_path.with_extension("tmp");

        let mut writer = csv::Writer::from_path(&temp_path)?;
        for event in events {
            writer.serialize(LedgerRow::from(event))?;
        }
        writer.flush().map_err(StoreError::Io)?;
        drop(writer);

        std::fs::rename(&temp_path, &final_path)?;
        debug!("Saved {} ledger events to {}", events.len(), name);
        Ok(final_path)
    }

    /// Load the newest generation, if any. A missing or empty directory is
    /// simply "no cache".
    pub fn load_newest(&self) -> Result<Option<Vec<TradeEvent>>, StoreError> {
        let Some(path) = self.newest_generation()? else {
            return Ok(None);
        };

        info!(
            "Found cached order history file: {}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        );

        let mut reader = csv::Reader::from_path(&path)?;
        let mut events = Vec::new();
        for row in reader.deserialize::<LedgerRow>() {
            events.push(row?.into_event()?);
        }
        Ok(Some(events))
    }

    fn newest_generation(&self) -> Result<Option<PathBuf>, StoreError> {
        if !self.dir.exists() {
            return Ok(None);
        }

        let mut newest: Option<PathBuf> = None;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("csv") {
                continue;
            }
            // Names are timestamps, so lexicographic order is chronological
            if newest.as_ref().map_or(true, |n| n.file_name() < path.file_name()) {
                newest = Some(path);
            }
        }
        Ok(newest)
    }
}
