use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, Pool, Postgres};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use tracing::log::LevelFilter;

pub type DbPool = Pool<Postgres>;

/// Connections kept beyond one per concurrent worker invocation, for the
/// submit and status endpoints.
const REQUEST_PATH_CONNECTIONS: u32 = 4;

/// Opens the job-store pool and brings the `ad_jobs` schema up to date.
pub async fn connect_job_store(connection_string: &str, worker_concurrency: u16) -> Result<DbPool> {
    let options = PgConnectOptions::from_str(connection_string)
        .context("Invalid DATABASE_URL")?
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_secs(1));

    let max_connections = u32::from(worker_concurrency) + REQUEST_PATH_CONNECTIONS;
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect_with(options)
        .await
        .context("Failed to connect to PostgreSQL")?;
    info!(max_connections, "✅ Connected to PostgreSQL");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply job table migrations")?;
    info!("✅ Job table migrations applied");

    Ok(pool)
}
