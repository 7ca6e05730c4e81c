//! Per-symbol CSV storage for historical closes
//!
//! One `SYMBOL.csv` per symbol with a `date,close` header. Full fetches
//! replace the file; incremental updates append rows strictly newer than
//! the last cached date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::prices::provider::PricePoint;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid price row in {symbol}.csv: {detail}")]
    InvalidRow { symbol: String, detail: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct PriceRow {
    date: String,
    close: String,
}

pub struct PriceStore {
    dir: PathBuf,
}

impl PriceStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }

    /// Last cached date for a symbol. A missing file, or one holding only
    /// a header, counts as no cache at all.
    pub fn last_cached_date(&self, symbol: &str) -> Result<Option<NaiveDate>, StoreError> {
        let series = self.load_series(symbol)?;
        Ok(series.keys().next_back().copied())
    }

    /// Replace the symbol's file with a full series, atomically
    pub fn write_full(&self, symbol: &str, points: &[PricePoint]) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;

        let final_path = self.path_for(symbol);
        let temp_path = final_path.with_extension("tmp");

        let mut writer = csv::Writer::from_path(&temp_path)?;
        for point in points {
            writer.serialize(PriceRow {
                date: point.date.format("%Y-%m-%d").to_string(),
                close: point.close.to_string(),
            })?;
        }
        writer.flush().map_err(StoreError::Io)?;
        drop(writer);

        std::fs::rename(&temp_path, &final_path)?;
        debug!("Wrote {} price rows for {}", points.len(), symbol);
        Ok(())
    }

    /// Append only points strictly newer than `after`. Returns how many
    /// rows were added.
    pub fn append_newer(
        &self,
        symbol: &str,
        points: &[PricePoint],
        after: NaiveDate,
    ) -> Result<usize, StoreError> {
        let file = std::fs::OpenOptions::new()
            .append(true)
            .open(self.path_for(symbol))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        let mut added = 0usize;
        for point in points.iter().filter(|p| p.date > after) {
            writer.serialize(PriceRow {
                date: point.date.format("%Y-%m-%d").to_string(),
                close: point.close.to_string(),
            })?;
            added += 1;
        }
        writer.flush().map_err(StoreError::Io)?;

        debug!("Appended {} price rows for {}", added, symbol);
        Ok(added)
    }

    /// Full cached series for one symbol, deduplicated by date. A missing
    /// file yields an empty series.
    pub fn load_series(&self, symbol: &str) -> Result<BTreeMap<NaiveDate, Decimal>, StoreError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut series = BTreeMap::new();
        for row in reader.deserialize::<PriceRow>() {
            let row = row?;
            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|e| {
                StoreError::InvalidRow {
                    symbol: symbol.to_string(),
                    detail: format!("date {:?}: {}", row.date, e),
                }
            })?;
            let close = Decimal::from_str(&row.close).map_err(|e| StoreError::InvalidRow {
                symbol: symbol.to_string(),
                detail: format!("close {:?}: {}", row.close, e),
            })?;
            series.insert(date, close);
        }
        Ok(series)
    }

    /// Date -> symbol -> close for every cached record inside the inclusive
    /// range. Absent symbols and dates are simply omitted, never zero-filled.
    pub fn table_for_range(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, BTreeMap<String, Decimal>>, StoreError> {
        let mut table: BTreeMap<NaiveDate, BTreeMap<String, Decimal>> = BTreeMap::new();
        for symbol in symbols {
            for (date, close) in self.load_series(symbol)?.range(start..=end) {
                table
                    .entry(*date)
                    .or_default()
                    .insert(symbol.clone(), *close);
            }
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn point(y: i32, m: u32, d: u32, close: Decimal) -> PricePoint {
        PricePoint {
            date: date(y, m, d),
            close,
        }
    }

    #[test]
    fn test_write_full_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = PriceStore::new(dir.path());

        let points = vec![
            point(2021, 1, 4, dec!(10.00)),
            point(2021, 1, 5, dec!(10.50)),
        ];
        store.write_full("AAPL", &points).unwrap();

        let series = store.load_series("AAPL").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[&date(2021, 1, 5)], dec!(10.50));
        assert_eq!(store.last_cached_date("AAPL").unwrap(), Some(date(2021, 1, 5)));
    }

    #[test]
    fn test_append_keeps_only_strictly_newer_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = PriceStore::new(dir.path());

        store
            .write_full("AAPL", &[point(2021, 1, 4, dec!(10.00))])
            .unwrap();

        // Provider ranges overlap what is already cached
        let fetched = vec![
            point(2021, 1, 4, dec!(99.99)),
            point(2021, 1, 5, dec!(10.50)),
            point(2021, 1, 6, dec!(11.00)),
        ];
        let added = store
            .append_newer("AAPL", &fetched, date(2021, 1, 4))
            .unwrap();

        assert_eq!(added, 2);
        let series = store.load_series("AAPL").unwrap();
        assert_eq!(series.len(), 3);
        // The overlapping row did not clobber the cached close
        assert_eq!(series[&date(2021, 1, 4)], dec!(10.00));
    }

    #[test]
    fn test_missing_file_is_empty_series() {
        let dir = tempfile::tempdir().unwrap();
        let store = PriceStore::new(dir.path());

        assert!(store.load_series("GHOST").unwrap().is_empty());
        assert_eq!(store.last_cached_date("GHOST").unwrap(), None);
    }

    #[test]
    fn test_header_only_file_counts_as_no_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = PriceStore::new(dir.path());

        std::fs::write(dir.path().join("EMPTY.csv"), "date,close\n").unwrap();
        assert_eq!(store.last_cached_date("EMPTY").unwrap(), None);
    }

    #[test]
    fn test_table_for_range_omits_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = PriceStore::new(dir.path());

        store
            .write_full(
                "AAPL",
                &[point(2021, 1, 4, dec!(10.00)), point(2021, 1, 8, dec!(12.00))],
            )
            .unwrap();

        let symbols = vec!["AAPL".to_string(), "GHOST".to_string()];
        let table = store
            .table_for_range(&symbols, date(2021, 1, 4), date(2021, 1, 7))
            .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table[&date(2021, 1, 4)]["AAPL"], dec!(10.00));
        assert!(!table.contains_key(&date(2021, 1, 8)));
        assert!(!table[&date(2021, 1, 4)].contains_key("GHOST"));
    }
}
