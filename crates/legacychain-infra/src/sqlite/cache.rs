//! SQLite advisory will cache.

use sqlx::Row;

use legacychain_core::repository::cache::{CachedWill, WillCache};
use legacychain_types::error::RepositoryError;
use legacychain_types::will::WillStatus;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed [`WillCache`]. One row per will id.
#[derive(Clone)]
pub struct SqliteWillCache {
    pool: DatabasePool,
}

impl SqliteWillCache {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl WillCache for SqliteWillCache {
    async fn get(&self, will_id: &str) -> Result<Option<CachedWill>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM will_cache WHERE will_id = ?")
            .bind(will_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.map(|r| row_to_cached(&r)).transpose()
    }

    async fn upsert(&self, entry: &CachedWill) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO will_cache (will_id, created_tx_id, status, executed_tx_id, failure_reason, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(will_id) DO UPDATE SET
                   created_tx_id = excluded.created_tx_id,
                   status = excluded.status,
                   executed_tx_id = excluded.executed_tx_id,
                   failure_reason = excluded.failure_reason,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&entry.will_id)
        .bind(&entry.created_tx_id)
        .bind(entry.status.to_string())
        .bind(&entry.executed_tx_id)
        .bind(&entry.failure_reason)
        .bind(format_datetime(&entry.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}

fn row_to_cached(row: &sqlx::sqlite::SqliteRow) -> Result<CachedWill, RepositoryError> {
    let get = |e: sqlx::Error| RepositoryError::Query(e.to_string());
    let status: String = row.try_get("status").map_err(get)?;
    let status: WillStatus = status.parse().map_err(RepositoryError::Query)?;
    let updated_at: String = row.try_get("updated_at").map_err(get)?;

    Ok(CachedWill {
        will_id: row.try_get("will_id").map_err(get)?,
        created_tx_id: row.try_get("created_tx_id").map_err(get)?,
        status,
        executed_tx_id: row.try_get("executed_tx_id").map_err(get)?,
        failure_reason: row.try_get("failure_reason").map_err(get)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}
