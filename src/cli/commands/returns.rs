use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use tracing::info;

use crate::auth;
use crate::broker::DEFAULT_API_URL;
use crate::cli::commands::AuthArgs;
use crate::config;
use crate::data_paths::DataPaths;
use crate::display;
use crate::ledger::OrderLedger;
use crate::portfolio::{CostBasisTable, HoldingsHistory, HoldingsStore};
use crate::prices::{HttpPriceProvider, PriceCache, DEFAULT_PRICE_API_URL};
use crate::returns::compute_returns;

#[derive(Args)]
pub struct ReturnsArgs {
    #[command(flatten)]
    pub auth: AuthArgs,

    /// Historical price API token (falls back to FOLIOSCOPE_PRICE_TOKEN)
    #[arg(long)]
    pub price_token: Option<String>,

    /// Refetch order history from the API even when a cached copy exists
    #[arg(long)]
    pub no_cache: bool,
}

pub struct ReturnsCommand {
    args: ReturnsArgs,
}

impl ReturnsCommand {
    pub fn new(args: ReturnsArgs) -> Self {
        Self { args }
    }

    /// Run the whole pipeline: ledger, holdings, cost basis, prices,
    /// transfers, and finally the return series.
    pub async fn execute(&self, data_paths: DataPaths) -> Result<()> {
        let credentials = self.args.auth.resolve()?;
        let mut client = auth::get_authenticated_client(
            DEFAULT_API_URL,
            &credentials,
            self.args.auth.mfa_code.as_deref(),
        )
        .await?;

        let ledger = OrderLedger::new(&data_paths);
        let events = ledger
            .load_or_fetch(&mut client, !self.args.no_cache)
            .await
            .context("Failed to load order history")?;

        let end_date = Utc::now().date_naive();
        let holdings = HoldingsHistory::reconstruct(&events, end_date)
            .context("Failed to reconstruct holdings history")?;
        info!(
            "Reconstructed {} days of holdings across {} symbols",
            holdings.len(),
            holdings.symbols().len()
        );

        HoldingsStore::new(data_paths.portfolio_history())
            .save_generation(&holdings)
            .context("Failed to save holdings history")?;

        let costs = CostBasisTable::compute(&events, &holdings);

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
        let prices =
            cache.table_for_range(holdings.symbols(), holdings.start(), holdings.end())?;

        let transfers = client
            .fetch_all_transfers()
            .await
            .context("Failed to fetch transfer history")?;

        let points = compute_returns(&holdings, &prices, &transfers, &costs)
            .context("Failed to compute returns")?;

        display::print_returns_table(&points)
    }
}
