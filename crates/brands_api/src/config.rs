//! Process configuration loaded once at startup.
//!
//! # Responsibility
//! - Read service settings from the environment into one explicit struct.
//! - Reject malformed values with an error naming the variable.
//!
//! # Invariants
//! - Nothing outside `main` reads the environment; handlers and the gateway
//!   receive the built `AppConfig`.

use brands_core::{default_log_level, DbError, DbTarget, PoolOptions};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite://brands.db";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_POOL_MAX_SIZE: u32 = 8;
const DEFAULT_POOL_TIMEOUT_SECS: u64 = 5;

/// Wildcard entry in `CORS_ALLOW_ORIGINS`.
pub const ANY_ORIGIN: &str = "*";

/// Service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DbTarget,
    pub bind_addr: SocketAddr,
    /// Allowed cross-origin callers; `["*"]` allows any origin.
    pub cors_allow_origins: Vec<String>,
    pub debug: bool,
    pub log_level: String,
    /// Absolute directory for rotating log files. `None` logs to stderr only.
    pub log_dir: Option<String>,
    pub pool: PoolOptions,
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
    Database(DbError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid { var, value, reason } => {
                write!(f, "invalid {var} value `{value}`: {reason}")
            }
            Self::Database(err) => write!(f, "invalid DATABASE_URL: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid { .. } => None,
            Self::Database(err) => Some(err),
        }
    }
}

impl AppConfig {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let database = DbTarget::parse(&database_url).map_err(ConfigError::Database)?;

        let bind_raw = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|err| invalid("BIND_ADDR", &bind_raw, err))?;

        let cors_allow_origins = match var("CORS_ALLOW_ORIGINS") {
            Some(raw) => parse_origins(&raw),
            None => vec![ANY_ORIGIN.to_string()],
        };

        let debug = match var("DEBUG") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                invalid("DEBUG", &raw, "expected true|false|1|0|yes|no|on|off")
            })?,
            None => false,
        };

        let log_level = var("LOG_LEVEL")
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|| default_log_level(debug).to_string());
        let log_dir = var("LOG_DIR").map(|value| value.trim().to_string());

        let max_size = match var("DB_POOL_MAX_SIZE") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(0) => return Err(invalid("DB_POOL_MAX_SIZE", &raw, "must be at least 1")),
                Ok(value) => value,
                Err(err) => return Err(invalid("DB_POOL_MAX_SIZE", &raw, err)),
            },
            None => DEFAULT_POOL_MAX_SIZE,
        };
        let timeout_secs = match var("DB_POOL_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|err| invalid("DB_POOL_TIMEOUT_SECS", &raw, err))?,
            None => DEFAULT_POOL_TIMEOUT_SECS,
        };

        Ok(Self {
            database,
            bind_addr,
            cors_allow_origins,
            debug,
            log_level,
            log_dir,
            pool: PoolOptions {
                max_size,
                connection_timeout: Duration::from_secs(timeout_secs.max(1)),
            },
        })
    }

    /// Returns whether any origin may call the API.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_allow_origins.iter().any(|origin| origin == ANY_ORIGIN)
    }
}

fn invalid(var: &'static str, value: &str, reason: impl Display) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| origin.trim_end_matches('/').to_string())
        .collect()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
