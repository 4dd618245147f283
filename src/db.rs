use anyhow::Context;
use sqlx::{MySqlPool, mysql::MySqlPoolOptions};
use tracing::info;

/// Connects and brings the schema up to date.
pub async fn init_db(database_url: &str, max_connections: u32) -> anyhow::Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    info!(max_connections, "Database ready");
    Ok(pool)
}
