use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::app::{AccountCollection, TickOverlap, DEFAULT_INTERVAL, DEFAULT_STATS_POLL_DELAY};
use crate::domain::entities::AccountCredentials;
use crate::error::ConfigError;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_STORE_FILE: &str = "datastore.json";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Clone, Debug)]
pub struct Config {
    /// Accounts to collect. An error here disables collection only; the
    /// HTTP surface keeps serving the cached aggregate.
    pub accounts: Result<Vec<AccountCredentials>, ConfigError>,
    /// Collection interval; an unusable value disables collection the same way
    pub poll_interval: Result<Duration, ConfigError>,
    pub stats_poll_delay: Duration,
    pub github_api_url: String,
    pub account_collection: AccountCollection,
    pub tick_overlap: TickOverlap,
    /// PostgreSQL storage when set, JSON file storage otherwise
    pub database_url: Option<String>,
    pub store_file: String,
    pub port: u16,
    pub log_dir: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            accounts: accounts(&lookup),
            poll_interval: poll_interval(&lookup),
            stats_poll_delay: parse_or(
                &lookup,
                "STATS_POLL_DELAY_MS",
                DEFAULT_STATS_POLL_DELAY.as_millis() as u64,
            )
            .map(Duration::from_millis)?,
            github_api_url: lookup("GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            account_collection: parse_or(&lookup, "ACCOUNT_COLLECTION", AccountCollection::default())?,
            tick_overlap: parse_or(&lookup, "TICK_OVERLAP", TickOverlap::default())?,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            store_file: lookup("STORE_FILE").unwrap_or_else(|| DEFAULT_STORE_FILE.to_string()),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            log_dir: lookup("LOG_DIR").filter(|dir| !dir.is_empty()),
        })
    }
}

/// Numbered account pairs, starting at 1, until the first missing username
fn accounts<F>(lookup: &F) -> Result<Vec<AccountCredentials>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut accounts = Vec::new();

    for n in 1.. {
        let Some(username) = lookup(&format!("GH_USERNAME_{n}")).filter(|u| !u.is_empty()) else {
            break;
        };
        let token_var = format!("GH_API_KEY_{n}");
        let token = lookup(&token_var)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing(token_var))?;

        accounts.push(AccountCredentials::new(username, token));
    }

    if accounts.is_empty() {
        return Err(ConfigError::NoAccounts);
    }
    Ok(accounts)
}

fn poll_interval<F>(lookup: &F) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    const NAME: &str = "POLL_INTERVAL_MS";

    match parse_or(lookup, NAME, DEFAULT_INTERVAL.as_millis() as u64)? {
        0 => Err(ConfigError::Invalid {
            name: NAME.to_string(),
            value: "0".to_string(),
        }),
        ms => Ok(Duration::from_millis(ms)),
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name: name.to_string(),
            value,
        }),
    }
}
