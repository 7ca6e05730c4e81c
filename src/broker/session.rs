//! Brokerage login flow

use std::time::Duration;
use tracing::{debug, info};

use crate::broker::types::{BrokerError, LoginResponse};
use crate::config::Credentials;

/// Production API host
pub const DEFAULT_API_URL: &str = "https://api.robinhood.com";

/// Public OAuth client id used by the mobile apps
const CLIENT_ID: &str = "c82SH0WZOsabOXGP2sxqcj34FxkvfnWRZBKlBjFS";

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Proof of a completed login. Constructing a `BrokerClient` requires one,
/// so no authenticated call can happen before `login` succeeds.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
}

impl Session {
    pub(crate) fn new(token: String) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Log in with username/password and an optional one-time MFA code.
///
/// Returns `BrokerError::MfaRequired` when the account has MFA enabled and
/// no code was supplied; the caller decides whether to prompt and retry.
pub async fn login(
    base_url: &str,
    creds: &Credentials,
    mfa_code: Option<&str>,
) -> Result<Session, BrokerError> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    let url = format!("{}/oauth2/token/", base_url.trim_end_matches('/'));

    let mut form = vec![
        ("password", creds.password.as_str()),
        ("username", creds.username.as_str()),
        ("grant_type", "password"),
        ("client_id", CLIENT_ID),
        ("device_token", creds.device_token.as_str()),
    ];
    if let Some(code) = mfa_code {
        form.push(("mfa_code", code));
    }

    debug!("Logging in as {}", creds.username);
    let response = client.post(&url).form(&form).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "No error details".to_string());
        return Err(BrokerError::LoginFailed(format!(
            "status {}: {}",
            status, body
        )));
    }

    let data: LoginResponse = response.json().await?;

    if data.mfa_required.is_some() {
        return Err(BrokerError::MfaRequired);
    }

    match data.access_token {
        Some(token) => {
            info!("Login successful");
            Ok(Session::new(token))
        }
        None => Err(BrokerError::LoginFailed(
            "response carried no access token".to_string(),
        )),
    }
}
