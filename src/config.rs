use anyhow::{anyhow, Result};
use std::path::Path;

/// Environment variable overrides, loaded from the process environment or a
/// .env file via dotenvy at startup.
pub const USERNAME_ENV: &str = "FOLIOSCOPE_USERNAME";
pub const PASSWORD_ENV: &str = "FOLIOSCOPE_PASSWORD";
pub const DEVICE_TOKEN_ENV: &str = "FOLIOSCOPE_DEVICE_TOKEN";
pub const PRICE_TOKEN_ENV: &str = "FOLIOSCOPE_PRICE_TOKEN";

/// Brokerage login credentials resolved from flags, environment, or prompt
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub device_token: String,
}

/// Resolve login credentials.
///
/// Password precedence: `--password` flag, then `--password-file`, then the
/// environment, then an interactive prompt. Username and device token come
/// from their flags or the environment; neither is prompted for.
pub fn resolve_credentials(
    username: Option<String>,
    password: Option<String>,
    password_file: Option<&Path>,
    device_token: Option<String>,
) -> Result<Credentials> {
    let username = match username.or_else(|| std::env::var(USERNAME_ENV).ok()) {
        Some(u) if !u.is_empty() => u,
        _ => {
            return Err(anyhow!(
                "No username given. Pass --username or set {}",
                USERNAME_ENV
            ))
        }
    };

    let password = resolve_password(password, password_file)?;

    let device_token = match device_token.or_else(|| std::env::var(DEVICE_TOKEN_ENV).ok()) {
        Some(t) if !t.is_empty() => t,
        _ => {
            return Err(anyhow!(
                "No device token given. Pass --device-token or set {}",
                DEVICE_TOKEN_ENV
            ))
        }
    };

    Ok(Credentials {
        username,
        password,
        device_token,
    })
}

fn resolve_password(password: Option<String>, password_file: Option<&Path>) -> Result<String> {
    if let Some(p) = password {
        if p.is_empty() {
            return Err(anyhow!("Password cannot be empty"));
        }
        return Ok(p);
    }

    if let Some(path) = password_file {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read password file {}: {}", path.display(), e))?;
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("Password file {} is empty", path.display()));
        }
        return Ok(trimmed.to_string());
    }

    if let Ok(p) = std::env::var(PASSWORD_ENV) {
        if !p.is_empty() {
            return Ok(p);
        }
    }

    let prompted = rpassword::prompt_password("Enter account password: ")?;
    if prompted.is_empty() {
        return Err(anyhow!("Password cannot be empty"));
    }
    Ok(prompted)
}

/// Resolve the historical-price provider API token (flag, then environment).
/// Absence is not an error here; a fetch that actually needs the token
/// reports it then.
pub fn resolve_price_token(flag: Option<String>) -> Option<String> {
    flag.filter(|t| !t.is_empty())
        .or_else(|| std::env::var(PRICE_TOKEN_ENV).ok().filter(|t| !t.is_empty()))
}

/// Prompt for a one-time MFA code
pub fn prompt_mfa_code() -> Result<String> {
    let code = rpassword::prompt_password("Enter MFA code: ")?;
    if code.is_empty() {
        return Err(anyhow!("MFA code cannot be empty"));
    }
    Ok(code)
}
