//! Database pool construction and migration runner.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use keystone_core::config::DatabaseConfig;
use keystone_core::{AuthError, AuthResult};

/// Create a PostgreSQL connection pool from configuration.
pub async fn create_pool(config: &DatabaseConfig) -> AuthResult<PgPool> {
    info!(
        max_connections = config.max_connections,
        "Connecting to database"
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            config.connect_timeout_seconds,
        ))
        .connect(&config.url)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to connect to database", e))
}

/// Run all pending database migrations.
pub async fn run_migrations(pool: &PgPool) -> AuthResult<()> {
    info!("Running database migrations");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| AuthError::store_with_source("Failed to run migrations", e))?;

    info!("Database migrations completed");
    Ok(())
}
