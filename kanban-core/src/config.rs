//! Configuration management
//!
//! Configuration comes from environment variables, with a `.env` file loaded
//! first when present (for development).
//!
//! # Environment Variables
//!
//! - `KANBAN_STORAGE`: `memory` or `postgres` (default: memory)
//! - `DATABASE_URL`: PostgreSQL connection string (required for postgres)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
//! - `DATABASE_MIN_CONNECTIONS`: idle connections kept open (default: 2)
//! - `DATABASE_CONNECT_TIMEOUT`: seconds to wait for a connection (default: 30)
//! - `KANBAN_LOCK_TIMEOUT_MS`: per-transaction lock timeout (default: 5000)
//! - `KANBAN_LOG_FORMAT`: `pretty` or `json` (default: pretty)
//!
//! # Example
//!
//! ```no_run
//! use kanban_core::config::Config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! println!("storage backend: {}", config.storage);
//! # Ok(())
//! # }
//! ```

use crate::db::pool::DatabaseConfig;
use anyhow::Context;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which repository backend the services run on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Postgres => "postgres",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => anyhow::bail!("unknown storage backend: {}", other),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("unknown log format: {}", other),
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Repository backend
    pub storage: StorageBackend,

    /// Pool settings; `url` is empty when running in memory
    pub database: DatabaseConfig,

    /// `lock_timeout` applied to every Postgres transaction
    pub lock_timeout: Duration,

    /// Log output format
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `KANBAN_STORAGE=postgres` and `DATABASE_URL` is missing
    /// - A variable has a value that does not parse
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage: StorageBackend = parse_or(&lookup, "KANBAN_STORAGE", StorageBackend::Memory)?;

        let url = lookup("DATABASE_URL").unwrap_or_default();
        if storage == StorageBackend::Postgres && url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL environment variable is required for postgres storage");
        }

        let defaults = DatabaseConfig::default();
        let database = DatabaseConfig {
            url,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", defaults.min_connections)?,
            connect_timeout_seconds: parse_or(
                &lookup,
                "DATABASE_CONNECT_TIMEOUT",
                defaults.connect_timeout_seconds,
            )?,
            ..defaults
        };
        if database.max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }

        let lock_timeout_ms: u64 = parse_or(&lookup, "KANBAN_LOCK_TIMEOUT_MS", 5000)?;
        if lock_timeout_ms == 0 {
            anyhow::bail!("KANBAN_LOCK_TIMEOUT_MS must be greater than 0");
        }

        Ok(Self {
            storage,
            database,
            lock_timeout: Duration::from_millis(lock_timeout_ms),
            log_format: parse_or(&lookup, "KANBAN_LOG_FORMAT", LogFormat::Pretty)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Memory,
            database: DatabaseConfig::default(),
            lock_timeout: Duration::from_millis(5000),
            log_format: LogFormat::Pretty,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}
