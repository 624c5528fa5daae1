/// Database layer for the registrar service
///
/// Manages the SQLite connection pool, migrations, and typed row models
/// for accounts, students, courses, and registrations.

pub mod models;

use crate::error::{ApiError, ApiResult};
use rand::Rng;
use sqlx::sqlite::SqlitePool;
use std::path::Path;
use std::time::Duration;

/// Database connection options
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub enable_wal: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            enable_wal: true,
        }
    }
}

/// Create a SQLite connection pool
pub async fn create_pool(path: &Path, options: DatabaseOptions) -> ApiResult<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let connect_options = sqlx::sqlite::SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(if options.enable_wal {
            sqlx::sqlite::SqliteJournalMode::Wal
        } else {
            sqlx::sqlite::SqliteJournalMode::Delete
        })
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(options.max_connections)
        .connect_with(connect_options)
        .await
        .map_err(ApiError::Database)?;

    Ok(pool)
}

/// Create a pool, retrying with backoff while the store comes up
///
/// Retries apply to connection establishment only; individual queries and
/// transactions later on fail without retry.
pub async fn create_pool_with_retry(
    path: &Path,
    options: DatabaseOptions,
    attempts: u32,
) -> ApiResult<SqlitePool> {
    let mut delay = Duration::from_millis(250);
    let mut last_err = None;

    for attempt in 1..=attempts.max(1) {
        match create_pool(path, options.clone()).await {
            Ok(pool) => return Ok(pool),
            Err(e) => {
                tracing::warn!(
                    "database connection attempt {}/{} failed: {}",
                    attempt,
                    attempts,
                    e
                );
                last_err = Some(e);
                let jitter = rand::thread_rng().gen_range(0..100);
                tokio::time::sleep(delay + Duration::from_millis(jitter)).await;
                delay = (delay * 2).min(Duration::from_secs(5));
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| ApiError::Internal("Database connection failed".to_string())))
}

/// Run migrations for a database
/// Migrations are embedded at compile time from ./migrations directory
pub async fn run_migrations(pool: &SqlitePool) -> ApiResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| ApiError::Internal(format!("Migration failed: {}", e)))?;

    Ok(())
}

/// Test database connection
pub async fn test_connection(pool: &SqlitePool) -> ApiResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(ApiError::Database)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_and_migrations_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("registrar.sqlite");

        let pool = create_pool(&path, DatabaseOptions::default()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        test_connection(&pool).await.unwrap();

        // Migrations leave the four tables behind
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
             AND name IN ('accounts', 'students', 'courses', 'registrations')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn test_retry_gives_up_eventually() {
        // A directory path is not a usable database file
        let dir = tempfile::tempdir().unwrap();
        let result = create_pool_with_retry(dir.path(), DatabaseOptions::default(), 2).await;
        assert!(result.is_err());
    }
}
