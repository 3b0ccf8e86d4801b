//! SQLite connection pools for the audit log and will cache.
//!
//! SQLite allows only one writer at a time, which also makes the history
//! log single-writer: every append goes through the one writer connection.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// A WAL-mode database behind two pools: `writer` holds the only write
/// connection, `reader` holds up to eight read-only ones.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if missing) the database and run migrations.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let write_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let read_only_opts = write_opts.clone().read_only(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(write_opts)
            .await?;

        // Migrate before the read-only pool opens so it sees the schema.
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(read_only_opts)
            .await?;

        tracing::debug!(url = %database_url, "database ready");
        Ok(DatabasePool { writer, reader })
    }
}

/// `sqlite://{data_dir}/legacychain.db`
pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite://{}/legacychain.db", data_dir.display())
}


#[cfg(test)]
mod tests {
    use super::test_support::test_pool;
    use super::*;

    #[tokio::test]
    async fn migrations_create_history_and_cache() {
        let (pool, _dir) = test_pool().await;

        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name LIKE 'will_%' ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();
        assert_eq!(names, vec!["will_cache", "will_history"]);
    }

    #[tokio::test]
    async fn writer_runs_in_wal() {
        let (pool, _dir) = test_pool().await;
        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        assert!(mode.eq_ignore_ascii_case("wal"));
    }

    #[tokio::test]
    async fn reader_cannot_write() {
        let (pool, _dir) = test_pool().await;
        let result = sqlx::query("DELETE FROM will_cache").execute(&pool.reader).await;
        assert!(result.is_err());
    }

    #[test]
    fn url_points_into_data_dir() {
        assert_eq!(
            database_url(Path::new("/tmp/lc")),
            "sqlite:///tmp/lc/legacychain.db"
        );
    }
}
