//! CLI module for folioscope
//!
//! Argument parsing and the structured command pattern live here. Every
//! command gets the shared data directory and logging setup before it runs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

use crate::data_paths::{DataPaths, DEFAULT_DATA_DIR};
use crate::logging::{init_logging, LoggingConfig};

use commands::orders::{OrdersArgs, OrdersCommand};
use commands::prices::{PricesArgs, PricesCommand};
use commands::returns::{ReturnsArgs, ReturnsCommand};
use commands::transfers::{TransfersArgs, TransfersCommand};

#[derive(Parser)]
#[command(name = "folioscope")]
#[command(version)]
#[command(about = "Brokerage account analytics from the command line", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory path (default: ./data)
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute and print the time-weighted return series
    Returns(ReturnsArgs),

    /// Fetch and print the filled-order ledger
    Orders(OrdersArgs),

    /// Refresh the local price cache from the cached ledger
    Prices(PricesArgs),

    /// Fetch and print the bank transfer history
    Transfers(TransfersArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let data_paths = DataPaths::new(&self.data_dir);

        // Ensure all directories exist
        data_paths.ensure_directories()?;

        init_logging(LoggingConfig::new(data_paths.clone(), self.verbose > 0))?;

        match self.command {
            Commands::Returns(args) => ReturnsCommand::new(args).execute(data_paths).await,
            Commands::Orders(args) => OrdersCommand::new(args).execute(data_paths).await,
            Commands::Prices(args) => PricesCommand::new(args).execute(data_paths).await,
            Commands::Transfers(args) => TransfersCommand::new(args).execute(data_paths).await,
        }
    }
}
