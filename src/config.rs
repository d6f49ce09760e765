use std::{env, fmt, str::FromStr, time::Duration};

use tracing::info;

use crate::error::ConfigError;
use crate::services::whitelist::GrantStrategy;

pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";
pub const DEFAULT_RCON_PORT: u16 = 25575;
pub const DEFAULT_DB_PORT: u16 = 3306;

#[derive(Clone)]
pub struct Config {
    pub telegram_token: String,
    pub telegram_api_url: String,
    pub rcon_host: String,
    pub rcon_port: u16,
    pub rcon_password: String,
    pub rcon_timeout: Duration,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub grant_strategy: GrantStrategy,
    pub permission_group: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_api_url", &self.telegram_api_url)
            .field("rcon_host", &self.rcon_host)
            .field("rcon_port", &self.rcon_port)
            .field("rcon_timeout", &self.rcon_timeout)
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("grant_strategy", &self.grant_strategy)
            .field("permission_group", &self.permission_group)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Read configuration from the process environment (`.env` is loaded by `main`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let rcon_timeout_secs: u64 = parse_or(&var, "RCON_TIMEOUT_SECS", 5)?;
        if rcon_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "RCON_TIMEOUT_SECS",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            telegram_token: required("TELEGRAM_TOKEN")?,
            telegram_api_url: or_default(&var, "TELEGRAM_API_URL", DEFAULT_TELEGRAM_API)
                .trim_end_matches('/')
                .to_string(),
            rcon_host: or_default(&var, "RCON_HOST", "localhost"),
            rcon_port: parse_or(&var, "RCON_PORT", DEFAULT_RCON_PORT)?,
            rcon_password: required("RCON_PASSWORD")?,
            rcon_timeout: Duration::from_secs(rcon_timeout_secs),
            db_host: or_default(&var, "DB_HOST", "localhost"),
            db_port: parse_or(&var, "DB_PORT", DEFAULT_DB_PORT)?,
            db_name: required("DB_NAME")?,
            db_user: required("DB_USER")?,
            db_password: var("DB_PASSWORD").unwrap_or_default(),
            grant_strategy: parse_or(&var, "GRANT_STRATEGY", GrantStrategy::Combined)?,
            permission_group: or_default(&var, "PERMISSION_GROUP", "default"),
        })
    }
}

fn or_default<V>(var: &V, key: &str, default: &str) -> String
where
    V: Fn(&str) -> Option<String>,
{
    var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn parse_or<V, T>(var: &V, key: &'static str, default: T) -> Result<T, ConfigError>
where
    V: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match var(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
