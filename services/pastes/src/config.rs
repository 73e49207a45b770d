//! Service configuration
//!
//! Everything is read once at startup from `PASTEBIN_*` environment
//! variables and handed to the components that need it.

use std::time::Duration;

use anyhow::{Context, Result};
use common::database::DatabaseConfig;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::session::SessionPolicy;

/// Where users, sessions and pastes are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Process memory; everything is lost on exit
    Memory,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    /// Address the HTTP listener binds to
    pub listen: String,
    pub storage: StorageBackend,
    pub session: SessionPolicy,
    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,
}

/// Flat view of the environment, one field per variable
#[derive(Debug, Deserialize)]
struct RawConfig {
    db_name: String,
    db_user: String,
    db_password: String,
    db_host: String,
    db_port: u16,
    db_max_connections: u32,
    db_connection_timeout: u64,
    listen: String,
    storage: StorageBackend,
    session_ttl: u64,
    enforce_session_lifecycle: bool,
    cookie_secure: bool,
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    ///
    /// # Environment Variables
    /// - `PASTEBIN_DB_NAME`, `PASTEBIN_DB_USER`, `PASTEBIN_DB_PASSWORD`,
    ///   `PASTEBIN_DB_HOST`, `PASTEBIN_DB_PORT`: connection fields
    ///   (default: `pastebin`, `postgres`, `postgres`, `localhost`, `5432`)
    /// - `PASTEBIN_DB_MAX_CONNECTIONS`: pool size (default: 10)
    /// - `PASTEBIN_DB_CONNECTION_TIMEOUT`: acquire timeout in seconds (default: 30)
    /// - `PASTEBIN_LISTEN`: listen address (default: `0.0.0.0:8080`)
    /// - `PASTEBIN_STORAGE`: `postgres` or `memory` (default: `postgres`)
    /// - `PASTEBIN_SESSION_TTL`: session lifetime in seconds (default: 3600)
    /// - `PASTEBIN_ENFORCE_SESSION_LIFECYCLE`: reject expired and logged-out
    ///   sessions (default: false)
    /// - `PASTEBIN_COOKIE_SECURE`: mark the session cookie `Secure` (default: false)
    pub fn from_env() -> Result<Self> {
        let raw = Self::load(Environment::with_prefix("PASTEBIN").try_parsing(true))
            .context("Failed to load configuration from environment")?;
        let config = Self::from(raw);

        config
            .database
            .validate()
            .context("Invalid database configuration")?;
        if config.session.ttl.is_zero() {
            anyhow::bail!("PASTEBIN_SESSION_TTL must be greater than zero");
        }

        Ok(config)
    }

    fn load(env: Environment) -> Result<RawConfig, ConfigError> {
        let db = DatabaseConfig::default();
        let session = SessionPolicy::default();

        Config::builder()
            .set_default("db_name", db.name)?
            .set_default("db_user", db.user)?
            .set_default("db_password", db.password)?
            .set_default("db_host", db.host)?
            .set_default("db_port", i64::from(db.port))?
            .set_default("db_max_connections", i64::from(db.max_connections))?
            .set_default("db_connection_timeout", db.connection_timeout)?
            .set_default("listen", "0.0.0.0:8080")?
            .set_default("storage", "postgres")?
            .set_default("session_ttl", session.ttl.as_secs())?
            .set_default("enforce_session_lifecycle", session.enforce_lifecycle)?
            .set_default("cookie_secure", false)?
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            database: DatabaseConfig {
                name: raw.db_name,
                user: raw.db_user,
                password: raw.db_password,
                host: raw.db_host,
                port: raw.db_port,
                max_connections: raw.db_max_connections,
                connection_timeout: raw.db_connection_timeout,
            },
            listen: raw.listen,
            storage: raw.storage,
            session: SessionPolicy {
                ttl: Duration::from_secs(raw.session_ttl),
                enforce_lifecycle: raw.enforce_session_lifecycle,
            },
            cookie_secure: raw.cookie_secure,
        }
    }
}
