use anyhow::{Context, Result};
use tracing::info;

use crate::broker::{self, BrokerClient, BrokerError};
use crate::config::{self, Credentials};

/// Log in and wrap the session in an API client, retrying once with a
/// freshly prompted MFA code when the account challenges the login.
pub async fn get_authenticated_client(
    host: &str,
    credentials: &Credentials,
    mfa_code: Option<&str>,
) -> Result<BrokerClient> {
    info!("Logging in to {}", host);

    let session = match broker::login(host, credentials, mfa_code).await {
        Ok(session) => session,
        Err(BrokerError::MfaRequired) => {
            info!("🔑 Account requires a one-time MFA code");
            let code = config::prompt_mfa_code()?;
            broker::login(host, credentials, Some(&code))
                .await
                .context("Login failed after MFA challenge")?
        }
        Err(e) => return Err(e).context("Login failed"),
    };

    info!("✅ Login succeeded");
    BrokerClient::new(host, session).context("Failed to build API client")
}
