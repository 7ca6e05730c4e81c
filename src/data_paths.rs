use std::path::{Path, PathBuf};

/// Default data directory (relative to current working directory)
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Subdirectory paths relative to the data directory
pub const ORDER_HISTORY_DIR: &str = "order_history";
pub const PORTFOLIO_HISTORY_DIR: &str = "portfolio_history";
pub const PRICE_HISTORY_DIR: &str = "price_history";
pub const LOGS_DIR: &str = "logs";

/// Helper struct to manage data paths
#[derive(Clone, Debug)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    /// Create a new DataPaths instance with the given root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root data directory
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Get the order ledger cache directory (one CSV generation per fetch)
    pub fn order_history(&self) -> PathBuf {
        self.root.join(ORDER_HISTORY_DIR)
    }

    /// Get the reconstructed holdings table directory
    pub fn portfolio_history(&self) -> PathBuf {
        self.root.join(PORTFOLIO_HISTORY_DIR)
    }

    /// Get the per-symbol price cache directory
    pub fn price_history(&self) -> PathBuf {
        self.root.join(PRICE_HISTORY_DIR)
    }

    /// Get the logs directory
    pub fn logs(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// Ensure all directories exist
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.order_history())?;
        std::fs::create_dir_all(self.portfolio_history())?;
        std::fs::create_dir_all(self.price_history())?;
        std::fs::create_dir_all(self.logs())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdirectories_live_under_root() {
        let paths = DataPaths::new("/tmp/folioscope-test");
        assert!(paths.order_history().starts_with(paths.root()));
        assert!(paths.portfolio_history().starts_with(paths.root()));
        assert!(paths.price_history().starts_with(paths.root()));
        assert!(paths.logs().starts_with(paths.root()));
    }

    #[test]
    fn test_ensure_directories_creates_tree() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path().join("data"));
        paths.ensure_directories().unwrap();
        assert!(paths.order_history().is_dir());
        assert!(paths.portfolio_history().is_dir());
        assert!(paths.price_history().is_dir());
        assert!(paths.logs().is_dir());
    }
}
