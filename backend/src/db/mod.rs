//! Database connection and pool management
//!
//! The catalog keeps two tables, `users` and `books`; both are created by
//! the migrations under `backend/migrations`.

use crate::config::DatabaseConfig;
use anyhow::Result;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Pool tuning that is not exposed through the config file
pub struct PoolTuning {
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolTuning {
    fn default() -> Self {
        Self {
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// Create the PostgreSQL pool for the credential and catalog stores
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let tuning = PoolTuning::default();
    let connect_options =
        PgConnectOptions::from_str(&config.url)?.application_name("library-catalog");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(tuning.min_connections)
        .acquire_timeout(tuning.acquire_timeout)
        .idle_timeout(tuning.idle_timeout)
        .max_lifetime(tuning.max_lifetime)
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await?;

    info!(
        max = config.max_connections,
        min = tuning.min_connections,
        "Database pool created"
    );

    Ok(pool)
}

/// Create a pool that connects on first use. Used by tests that never
/// reach the database.
pub fn create_lazy_pool(url: &str) -> Result<PgPool> {
    Ok(PgPoolOptions::new().max_connections(1).connect_lazy(url)?)
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed");
    Ok(())
}

/// Check database health
pub async fn health_check(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| {
            warn!(error = %e, "Database health check failed");
            e.into()
        })
}
