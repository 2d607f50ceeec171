use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::config::get_config;
use crate::error::Result;

/// Connects the interview store pool sized from `DB_MAX_CONNECTIONS`.
pub async fn create_pool() -> Result<PgPool> {
    let config = get_config();
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .connect(&config.database_url)
        .await?;
    info!(max_connections = config.db_max_connections, "Database pool ready");
    Ok(pool)
}
