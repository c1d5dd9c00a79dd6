use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use academy::core::config::AppConfig;
use academy::core::shared::state::AppState;
use academy::core::shared::utils::{create_pool, run_migrations};
use academy::main_module::run_axum_server;
use academy::security::jwt::TokenService;
use academy::security::password::CredentialHasher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let tokens = TokenService::new(config.auth.jwt_config(), config.auth.secret())
        .context("Failed to initialize token service")?;
    let hasher = CredentialHasher::with_defaults().context("Failed to initialize password hasher")?;

    let pool = create_pool(&config.database).context("Failed to create database pool")?;
    let migration_pool = pool.clone();
    tokio::task::spawn_blocking(move || run_migrations(&migration_pool))
        .await?
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;

    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let state = Arc::new(AppState::new(pool, config, tokens, hasher));
    run_axum_server(state).await?;

    info!("Server stopped");
    Ok(())
}
