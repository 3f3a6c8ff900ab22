//! # Rollcall DB
//!
//! PostgreSQL connection pool initialization for the Rollcall API.

use std::env;

use sqlx::PgPool;

/// Initializes the PostgreSQL connection pool from `DATABASE_URL`.
///
/// The returned pool is cheaply cloneable and shared through the
/// application state.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is not set or the connection cannot be
/// established. Startup is the only caller; the process must not come up
/// without a working store.
pub async fn init_db_pool() -> PgPool {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database")
}
