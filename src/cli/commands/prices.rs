use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Args;
use tracing::info;

use crate::config;
use crate::data_paths::DataPaths;
use crate::ledger::LedgerStore;
use crate::portfolio::HoldingsHistory;
use crate::prices::{HttpPriceProvider, PriceCache, DEFAULT_PRICE_API_URL};

#[derive(Args)]
pub struct PricesArgs {
    /// Historical price API token (falls back to FOLIOSCOPE_PRICE_TOKEN)
    #[arg(long)]
    pub price_token: Option<String>,
}

pub struct PricesCommand {
    args: PricesArgs,
}

impl PricesCommand {
    pub fn new(args: PricesArgs) -> Self {
        Self { args }
    }

    /// Refresh the local price cache for every symbol the cached ledger
    /// mentions. Never contacts the brokerage, so no login is needed.
    pub async fn execute(&self, data_paths: DataPaths) -> Result<()> {
        let store = LedgerStore::new(data_paths.order_history());
        let Some(events) = store
            .load_newest()
            .context("Failed to read cached order history")?
        else {
            bail!("No cached order history. Run `folioscope orders` first");
        };

        let holdings = HoldingsHistory::reconstruct(&events, Utc::now().date_naive())
            .context("Failed to reconstruct holdings history")?;

        let provider = HttpPriceProvider::new(
            DEFAULT_PRICE_API_URL,
            config::resolve_price_token(self.args.price_token.clone()),
        )
        .context("Failed to build price client")?;

        let cache = PriceCache::new(&data_paths);
        cache
            .ensure_coverage(&provider, holdings.symbols(), holdings.end())
            .await
            .context("Failed to refresh price cache")?;

        info!(
            "✅ Price cache is current for {} symbols",
            holdings.symbols().len()
        );
        Ok(())
    }
}
