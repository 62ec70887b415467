//! PostgreSQL access for the movie catalogue.
//!
//! - [`predicate`] -- turns validated filter criteria into bound SQL conditions.
//! - [`repositories`] -- zero-sized repos issuing the actual queries.
//! - [`models`] -- `FromRow` structs mirroring table rows.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub mod models;
pub mod predicate;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Connection pool sizing and time limits.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a caller may wait for a free connection.
    pub acquire_timeout: Duration,
    /// Server-side `statement_timeout` applied to every pooled connection.
    pub statement_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(5),
            statement_timeout: Duration::from_secs(5),
        }
    }
}

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, settings: &PoolSettings) -> Result<DbPool, sqlx::Error> {
    let statement_timeout_ms = settings.statement_timeout.as_millis().to_string();
    let connect_options = PgConnectOptions::from_str(database_url)?
        .options([("statement_timeout", statement_timeout_ms.as_str())]);

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout)
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await
}

/// Round-trip a trivial query through the pool.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
