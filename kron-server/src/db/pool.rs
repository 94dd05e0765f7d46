//! Database connection pool management
//!
//! Uses sqlx PgPool with fixed sizing: 5 connections opened at start-up,
//! at most 10 in total, and never fewer than 2 kept open.

use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres};

/// Connections opened eagerly when the pool is created.
pub const INITIAL_CONNECTIONS: u32 = 5;

/// Upper bound on open connections.
pub const MAX_CONNECTIONS: u32 = 10;

/// Connections the pool keeps open even when idle.
pub const MIN_IDLE_CONNECTIONS: u32 = 2;

/// Create a PostgreSQL connection pool and open the initial connections.
///
/// # Errors
///
/// Returns an error if any of the initial connections cannot be opened.
///
/// # Example
///
/// ```ignore
/// let options = DatabaseConfig::new("postgres://localhost/kron").connect_options()?;
/// let pool = create_pool(options).await?;
/// ```
pub async fn create_pool(options: PgConnectOptions) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .min_connections(MIN_IDLE_CONNECTIONS)
        .connect_with(options)
        .await?;

    warm_up(&pool, INITIAL_CONNECTIONS).await?;

    tracing::info!(
        size = pool.size(),
        idle = pool.num_idle(),
        max = MAX_CONNECTIONS,
        "database pool ready"
    );
    Ok(pool)
}

/// Hold `count` connections at once so the pool opens them, then release.
async fn warm_up(pool: &PgPool, count: u32) -> Result<(), sqlx::Error> {
    let mut held: Vec<PoolConnection<Postgres>> = Vec::with_capacity(count as usize);
    for _ in 0..count {
        held.push(pool.acquire().await?);
    }
    Ok(())
}

/// Connections currently checked out of the pool.
pub fn in_use(pool: &PgPool) -> u32 {
    pool.size().saturating_sub(pool.num_idle() as u32)
}
