//! SQLite connection pool and migrations

use std::str::FromStr;
use std::time::Duration;

use sqlx::migrate::MigrateError;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

use crate::config::StoreConfig;

/// How long a connection waits on a locked database before SQLite reports busy.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// True for URLs that open a private in-memory database.
pub fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Create a connection pool for the configured database.
///
/// In-memory databases exist per connection, so their pool is pinned to a
/// single connection that is never recycled.
pub async fn create_pool(config: &StoreConfig) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = is_memory_url(&config.url);

    let mut options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .busy_timeout(BUSY_TIMEOUT);
    if !in_memory {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    let mut pool_options = SqlitePoolOptions::new()
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs));
    pool_options = if in_memory {
        pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options.max_connections(config.max_connections)
    };

    let pool = pool_options.connect_with(options).await?;

    tracing::info!(
        url = %config.url,
        in_memory,
        max_connections = config.max_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

/// Pool over a fresh private in-memory database.
pub async fn memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let config = StoreConfig {
        backend: crate::config::StoreBackend::Sqlite,
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        connect_timeout_secs: 10,
        write_retries: 1,
    };
    create_pool(&config).await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

pub async fn health_check(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_url_detection() {
        assert!(is_memory_url("sqlite::memory:"));
        assert!(is_memory_url("sqlite://file:asnmap?mode=memory&cache=shared"));
        assert!(!is_memory_url("sqlite://asnmap.db?mode=rwc"));
    }

    #[tokio::test]
    async fn test_memory_pool_is_migrated_and_healthy() {
        let pool = memory_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        health_check(&pool).await.unwrap();

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
             ('organization_mappings', 'delegation_records', 'category_labels', \
              'relationship_edges', 'organization_info')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(tables, 5);
    }

    #[tokio::test]
    async fn test_file_database_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("asnmap.db");
        let config = StoreConfig {
            backend: crate::config::StoreBackend::Sqlite,
            url: format!("sqlite://{}?mode=rwc", path.display()),
            max_connections: 2,
            connect_timeout_secs: 5,
            write_retries: 3,
        };

        let pool = create_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();
        assert!(path.exists());
    }
}
