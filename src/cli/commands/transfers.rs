use anyhow::{Context, Result};
use clap::Args;

use crate::auth;
use crate::broker::DEFAULT_API_URL;
use crate::cli::commands::AuthArgs;
use crate::data_paths::DataPaths;
use crate::display;

#[derive(Args)]
pub struct TransfersArgs {
    #[command(flatten)]
    pub auth: AuthArgs,
}

pub struct TransfersCommand {
    args: TransfersArgs,
}

impl TransfersCommand {
    pub fn new(args: TransfersArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, _data_paths: DataPaths) -> Result<()> {
        let credentials = self.args.auth.resolve()?;
        let client = auth::get_authenticated_client(
            DEFAULT_API_URL,
            &credentials,
            self.args.auth.mfa_code.as_deref(),
        )
        .await?;

        let mut transfers = client
            .fetch_all_transfers()
            .await
            .context("Failed to fetch transfer history")?;
        transfers.sort_by_key(|t| t.date);

        display::print_transfers_table(&transfers)
    }
}
