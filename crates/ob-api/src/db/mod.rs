//! # Database Persistence Layer
//!
//! Provides Postgres persistence for publication environments and their
//! state snapshots via SQLx.
//!
//! ## Architecture
//!
//! The database layer is **optional**. When `DATABASE_URL` is set, the API
//! writes environments and state snapshots through to PostgreSQL and
//! hydrates them on startup. When absent, the API operates in
//! in-memory-only mode (suitable for development and testing).
//!
//! ## What is persisted
//!
//! - Environment settings, lock and active state pointer
//! - State snapshots with their `adjust_on` chain and activation flags
//!
//! Modules, objects, acts, publications and packages are in-memory only.

pub mod environments;
pub mod states;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set, running in-memory only mode. \
                 Environment states will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
