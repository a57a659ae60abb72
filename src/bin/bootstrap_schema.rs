//! Creates the profile storage schema. Safe to run repeatedly.

use dotenvy::dotenv;
use rust_investor_api::db::Database;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = env::var("DB_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("DB_URL or DATABASE_URL must be set"))?;

    let db = Database::new(&database_url).await?;
    tracing::info!("Connected to database. Ensuring user_profiles schema...");

    db.ensure_schema().await?;

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_profiles")
        .fetch_one(&db.pool)
        .await?;
    tracing::info!("Schema ready; user_profiles holds {} record(s)", count);

    Ok(())
}
