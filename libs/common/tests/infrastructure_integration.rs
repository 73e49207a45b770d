//! Integration tests for the infrastructure components
//!
//! These tests verify that the PostgreSQL database is properly configured
//! and accessible. They need a running server and are ignored by default:
//! `cargo test -p common -- --ignored`.

use common::{
    database::{DatabaseConfig, health_check, init_pool},
    error::ConstraintViolation,
};
use sqlx::Row;

fn config_from_env() -> DatabaseConfig {
    let defaults = DatabaseConfig::default();
    DatabaseConfig {
        name: std::env::var("PASTEBIN_DB_NAME").unwrap_or(defaults.name.clone()),
        user: std::env::var("PASTEBIN_DB_USER").unwrap_or(defaults.user.clone()),
        password: std::env::var("PASTEBIN_DB_PASSWORD").unwrap_or(defaults.password.clone()),
        host: std::env::var("PASTEBIN_DB_HOST").unwrap_or(defaults.host.clone()),
        ..defaults
    }
}

/// Test that verifies PostgreSQL is accessible and can perform basic operations
#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&config_from_env()).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i32 = row.get("result");
    assert_eq!(result, 1, "PostgreSQL simple query test failed");

    Ok(())
}

/// Unique violations are classified from the server's error code
#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn test_unique_violation_classification() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&config_from_env()).await?;
    let mut conn = pool.acquire().await?;

    sqlx::query("CREATE TEMPORARY TABLE classify_probe (id TEXT PRIMARY KEY)")
        .execute(&mut *conn)
        .await?;
    sqlx::query("INSERT INTO classify_probe (id) VALUES ('a')")
        .execute(&mut *conn)
        .await?;

    let err = sqlx::query("INSERT INTO classify_probe (id) VALUES ('a')")
        .execute(&mut *conn)
        .await
        .map_err(common::error::DatabaseError::from)
        .expect_err("duplicate insert should fail");

    assert_eq!(err.constraint_violation(), Some(ConstraintViolation::Unique));
    Ok(())
}
