//! Database connection pool management

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::{
    config::DatabaseConfig,
    error::{Error, Result},
};

/// Create a SQLite connection pool with retry logic and apply migrations
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool> {
    let pool = create_pool_with_retries(config, config.max_retries).await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Apply the embedded schema migrations
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| Error::Migration(Box::new(e)))?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Create a connection pool with configurable retries
///
/// Uses exponential backoff strategy for retries
async fn create_pool_with_retries(config: &DatabaseConfig, max_retries: u32) -> Result<SqlitePool> {
    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);

    loop {
        match try_create_pool(config).await {
            Ok(pool) => {
                if attempt > 0 {
                    tracing::info!(
                        "Database connection established after {} attempt(s)",
                        attempt + 1
                    );
                } else {
                    tracing::info!(
                        "Database connection pool created: max={}, min={}",
                        config.max_connections,
                        config.min_connections
                    );
                }
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;

                if attempt > max_retries {
                    tracing::error!(
                        "Failed to connect to database after {} attempts: {}",
                        max_retries + 1,
                        e
                    );
                    return Err(e);
                }

                let delay_multiplier = 2_u32.pow(attempt.saturating_sub(1));
                let delay = base_delay * delay_multiplier;

                tracing::warn!(
                    "Database connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Attempt to create a database pool (single try)
///
/// Connections run in WAL mode and wait up to the connection timeout on a
/// locked database.
async fn try_create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let timeout = Duration::from_secs(config.connection_timeout_secs);
    let options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| Error::Internal(format!("Invalid database URL '{}': {}", config.url, e)))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(timeout);

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(timeout)
        .connect_with(options)
        .await
        .map_err(|e| {
            Error::Internal(format!(
                "Failed to open database at '{}': {}\n\n\
                Troubleshooting:\n\
                1. Check the URL format: sqlite://path/to/file.db or sqlite::memory:\n\
                2. Verify the parent directory exists and is writable\n\
                3. Make sure no other process holds an exclusive lock on the file\n\n\
                Original error: {}",
                config.url,
                categorize_db_error(&e),
                e
            ))
        })
}

/// Categorize database error for better user guidance
fn categorize_db_error(err: &sqlx::Error) -> &'static str {
    use sqlx::Error;
    match err {
        Error::Configuration(_) => "Configuration error",
        Error::Database(_) => "Database error",
        Error::Io(_) => "File I/O error - check path and permissions",
        Error::PoolTimedOut => "Connection pool timeout - database may be locked",
        Error::PoolClosed => "Connection pool closed",
        Error::WorkerCrashed => "Database worker crashed",
        _ => "Connection error",
    }
}

/// Single-connection in-memory database with the schema applied
///
/// The pool never recycles its connection, since closing it would drop the
/// database.
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid in-memory url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("in-memory database");
    migrate(&pool).await.expect("migrations apply");
    pool
}
