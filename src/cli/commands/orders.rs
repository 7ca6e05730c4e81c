use anyhow::{Context, Result};
use clap::Args;

use crate::auth;
use crate::broker::DEFAULT_API_URL;
use crate::cli::commands::AuthArgs;
use crate::data_paths::DataPaths;
use crate::display;
use crate::ledger::OrderLedger;

#[derive(Args)]
pub struct OrdersArgs {
    #[command(flatten)]
    pub auth: AuthArgs,

    /// Refetch order history from the API even when a cached copy exists
    #[arg(long)]
    pub no_cache: bool,
}

pub struct OrdersCommand {
    args: OrdersArgs,
}

impl OrdersCommand {
    pub fn new(args: OrdersArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, data_paths: DataPaths) -> Result<()> {
        let credentials = self.args.auth.resolve()?;
        let mut client = auth::get_authenticated_client(
            DEFAULT_API_URL,
            &credentials,
            self.args.auth.mfa_code.as_deref(),
        )
        .await?;

        let events = OrderLedger::new(&data_paths)
            .load_or_fetch(&mut client, !self.args.no_cache)
            .await
            .context("Failed to load order history")?;

        display::print_orders_table(&events)
    }
}
