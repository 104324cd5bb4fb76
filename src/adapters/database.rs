use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::info;

use crate::application::error::ApplicationError;

/// Opens the metadata database and brings its schema up to date.
pub async fn connect(database_url: &str) -> Result<SqlitePool, ApplicationError> {
    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

    let mut options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| ApplicationError::Configuration(format!("Invalid DATABASE_URL: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true);
    if !in_memory {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    // An in-memory database lives and dies with its single connection.
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await
        .map_err(|e| ApplicationError::DatabaseError(e.to_string()))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| ApplicationError::DatabaseError(format!("Migration failed: {}", e)))?;

    info!("Metadata database ready");
    Ok(pool)
}

pub async fn connect_in_memory() -> Result<SqlitePool, ApplicationError> {
    connect("sqlite::memory:").await
}
