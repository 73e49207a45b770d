//! Database module for handling PostgreSQL connections and operations
//!
//! This module provides connection pooling, configuration, and health checks
//! for the PostgreSQL database.

use crate::error::{DatabaseError, DatabaseResult};
use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::fmt;
use std::time::Duration;
use tracing::{error, info};

/// Database configuration struct
///
/// Built once at startup from discrete connection fields rather than a URL.
#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database name
    pub name: String,
    /// Role used to connect
    pub user: String,
    /// Password for `user`
    pub password: String,
    /// Server host name or address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection acquire timeout in seconds
    pub connection_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: "pastebin".to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            max_connections: 10,
            connection_timeout: 30,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("max_connections", &self.max_connections)
            .field("connection_timeout", &self.connection_timeout)
            .finish()
    }
}

impl DatabaseConfig {
    /// Check the fields before any connection attempt
    pub fn validate(&self) -> DatabaseResult<()> {
        if self.name.is_empty() {
            return Err(DatabaseError::Configuration(
                "database name is empty".to_string(),
            ));
        }
        if self.host.is_empty() {
            return Err(DatabaseError::Configuration(
                "database host is empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(DatabaseError::Configuration(
                "database port must be non-zero".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(DatabaseError::Configuration(
                "max_connections must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Connection options for the configured server, TLS disabled
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(PgSslMode::Disable)
    }

    /// Connection target without credentials, safe to log
    pub fn display_target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.name)
    }
}

/// Initialize a PostgreSQL connection pool
///
/// # Arguments
///
/// * `config` - Database configuration
///
/// # Returns
///
/// * `DatabaseResult<PgPool>` - PostgreSQL connection pool or error
pub async fn init_pool(config: &DatabaseConfig) -> DatabaseResult<PgPool> {
    config.validate()?;
    info!("Connecting to database {}", config.display_target());

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect_with(config.connect_options())
        .await
        .map_err(DatabaseError::Connection)?;

    info!("Database connection pool initialized successfully");
    Ok(pool)
}

/// Check database connectivity
///
/// # Arguments
///
/// * `pool` - PostgreSQL connection pool
///
/// # Returns
///
/// * `DatabaseResult<bool>` - True if connection is successful, false otherwise
pub async fn health_check(pool: &PgPool) -> DatabaseResult<bool> {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => Ok(true),
        Err(e) => {
            error!("Database health check failed: {}", e);
            Ok(false)
        }
    }
}
