//! Server settings
//!
//! Read once from the process environment (after `.env` is loaded) and turned
//! into the per-crate configs.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use accounts::AccountsConfig;
use accounts::domain::services::LockoutPolicy;
use anyhow::{Context, anyhow};
use catalog::CatalogConfig;
use chrono::TimeDelta;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    pub first_superuser: Option<FirstSuperuser>,
    pub accounts: AccountsConfig,
    pub catalog: CatalogConfig,
}

/// Bootstrap administrator created when the username is not taken yet
pub struct FirstSuperuser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for FirstSuperuser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirstSuperuser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR is not a socket address")?;

        let frontend_origins = var("FRONTEND_ORIGINS")
            .map(|raw| split_origins(&raw))
            .unwrap_or_default();

        Ok(Self {
            database_url,
            bind_addr,
            frontend_origins,
            first_superuser: first_superuser()?,
            accounts: accounts_config()?,
            catalog: CatalogConfig {
                cache_ttl: Duration::from_secs(parse_or("CACHE_TTL_SECONDS", 3600)?),
                ..CatalogConfig::default()
            },
        })
    }
}

fn accounts_config() -> anyhow::Result<AccountsConfig> {
    let base = match var("SECRET_KEY") {
        Some(secret) => AccountsConfig {
            jwt_secret: secret.into_bytes(),
            ..AccountsConfig::default()
        },
        None => {
            tracing::warn!("SECRET_KEY not set, using a random secret; tokens will not survive a restart");
            AccountsConfig::with_random_secret()
        }
    };

    let jwt_algorithm = match var("JWT_ALGORITHM") {
        Some(raw) => raw.parse().map_err(|e| anyhow!("JWT_ALGORITHM: {e}"))?,
        None => base.jwt_algorithm,
    };

    let defaults = LockoutPolicy::default();
    let lockout = LockoutPolicy {
        max_attempts: parse_or("LOCKOUT_MAX_ATTEMPTS", defaults.max_attempts)?,
        lock_duration: minutes_or("LOCKOUT_DURATION_MINUTES", defaults.lock_duration)?,
        stale_window: minutes_or("LOCKOUT_STALE_WINDOW_MINUTES", defaults.stale_window)?,
    };
    if lockout.max_attempts == 0 {
        return Err(anyhow!("LOCKOUT_MAX_ATTEMPTS must be at least 1"));
    }

    let expire_minutes: u64 = parse_or(
        "ACCESS_TOKEN_EXPIRE_MINUTES",
        base.access_token_ttl.as_secs() / 60,
    )?;

    Ok(AccountsConfig {
        jwt_algorithm,
        access_token_ttl: Duration::from_secs(expire_minutes * 60),
        lockout,
        password_pepper: var("PASSWORD_PEPPER").map(String::into_bytes),
        ..base
    })
}

fn first_superuser() -> anyhow::Result<Option<FirstSuperuser>> {
    let username = var("FIRST_SUPERUSER_USERNAME");
    let email = var("FIRST_SUPERUSER_EMAIL");
    let password = var("FIRST_SUPERUSER_PASSWORD");

    match (username, email, password) {
        (Some(username), Some(email), Some(password)) => Ok(Some(FirstSuperuser {
            username,
            email,
            password,
        })),
        (None, None, None) => Ok(None),
        _ => Err(anyhow!(
            "FIRST_SUPERUSER_USERNAME, FIRST_SUPERUSER_EMAIL and FIRST_SUPERUSER_PASSWORD must be set together"
        )),
    }
}

/// Non-empty value of an environment variable
fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} is invalid: {e}")),
        None => Ok(default),
    }
}

fn minutes_or(key: &str, default: TimeDelta) -> anyhow::Result<TimeDelta> {
    let minutes: i64 = parse_or(key, default.num_minutes())?;
    if minutes <= 0 {
        return Err(anyhow!("{key} must be positive"));
    }
    Ok(TimeDelta::minutes(minutes))
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
