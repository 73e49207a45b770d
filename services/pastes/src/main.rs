use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::database::{health_check, init_pool};
use pastes::{
    config::{AppConfig, StorageBackend},
    cookie::CookieConfig,
    routes::create_router,
    session::SessionAuthority,
    state::AppState,
    store::{MemoryStore, PgStore, Store},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting pastebin service");

    let config = AppConfig::from_env()?;

    match config.storage {
        StorageBackend::Postgres => {
            let pool = init_pool(&config.database).await?;

            if health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }

            let store = PgStore::new(pool);
            store
                .initialize()
                .await
                .context("Failed to initialize database schema")?;

            serve(store, &config).await
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data will not survive a restart");
            serve(MemoryStore::new(), &config).await
        }
    }
}

async fn serve<S>(store: S, config: &AppConfig) -> Result<()>
where
    S: Store + Send + Sync + 'static,
{
    let authority = SessionAuthority::new(Arc::new(store), config.session)
        .context("Failed to prepare session authority")?;
    let cookie = CookieConfig::for_session(&config.session, config.cookie_secure);
    let app = create_router(AppState::new(authority, cookie));

    let listener = TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;
    info!("Pastebin service listening on {}", config.listen);

    axum::serve(listener, app).await?;

    Ok(())
}
