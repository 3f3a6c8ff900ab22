use sqlx::PgPool;

use rollcall_config::SessionConfig;
use rollcall_db::init_db_pool;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub session_config: SessionConfig,
}

/// Builds the shared application state.
///
/// Configuration is loaded before the database pool so a misconfigured
/// process fails before touching the network.
pub async fn init_app_state() -> anyhow::Result<AppState> {
    let session_config = SessionConfig::from_env()?;

    let db = init_db_pool().await;
    sqlx::migrate!("./migrations").run(&db).await?;

    Ok(AppState { db, session_config })
}
