//! Generation-file storage for the reconstructed holdings table

use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::portfolio::history::HoldingsHistory;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub struct HoldingsStore {
    dir: PathBuf,
}

impl HoldingsStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Write the holdings table as a timestamped CSV generation: header is
    /// `date` followed by every traded symbol in sorted order, one row per
    /// tracked weekday, zero-filled for symbols not yet held.
    pub fn save_generation(&self, history: &HoldingsHistory) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.dir)?;

        let name = format!("{}.csv", Utc::now().format("%Y%m%d_%H%M%S_%6f"));
        let final_path = self.dir.join(&name);
        let temp_path = final_path.with_extension("tmp");

        let mut writer = csv::Writer::from_path(&temp_path)?;

        let mut header = vec!["date".to_string()];
        header.extend(history.symbols().iter().cloned());
        writer.write_record(&header)?;

        for (date, _) in history.iter() {
            let mut row = vec![date.format("%Y-%m-%d").to_string()];
            for symbol in history.symbols() {
                row.push(history.shares(*date, symbol).to_string());
            }
            writer.write_record(&row)?;
        }
        writer.flush().map_err(StoreError::Io)?;
        drop(writer);

        std::fs::rename(&temp_path, &final_path)?;
        debug!(
            "Saved holdings table ({} dates, {} symbols) to {}",
            history.len(),
            history.symbols().len(),
            name
        );
        Ok(final_path)
    }
}
