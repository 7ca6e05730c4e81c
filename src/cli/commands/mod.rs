//! CLI Commands module
//!
//! Each command follows a consistent pattern with dedicated Args and Command
//! structs. Commands that talk to the brokerage API share the login flags
//! through [`AuthArgs`].

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::config::{self, Credentials};

// Command modules
pub mod orders;
pub mod prices;
pub mod returns;
pub mod transfers;

/// Login flags shared by every command that authenticates to the brokerage
#[derive(Args)]
pub struct AuthArgs {
    /// Account username (falls back to FOLIOSCOPE_USERNAME)
    #[arg(long)]
    pub username: Option<String>,

    /// Account password (falls back to --password-file, FOLIOSCOPE_PASSWORD, then a prompt)
    #[arg(long)]
    pub password: Option<String>,

    /// Read the account password from this file
    #[arg(long)]
    pub password_file: Option<PathBuf>,

    /// Device token registered with the brokerage (falls back to FOLIOSCOPE_DEVICE_TOKEN)
    #[arg(long)]
    pub device_token: Option<String>,

    /// One-time MFA code for accounts with two-factor login
    #[arg(long)]
    pub mfa_code: Option<String>,
}

impl AuthArgs {
    pub fn resolve(&self) -> Result<Credentials> {
        config::resolve_credentials(
            self.username.clone(),
            self.password.clone(),
            self.password_file.as_deref(),
            self.device_token.clone(),
        )
    }
}
