//! SQLite will history log.
//!
//! Append-only: the schema's triggers abort any UPDATE or DELETE on
//! `will_history`, and this type exposes neither.

use sqlx::Row;
use uuid::Uuid;

use legacychain_core::repository::history::HistoryLog;
use legacychain_types::error::RepositoryError;
use legacychain_types::history::{HistoryEntry, HistoryKind};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed [`HistoryLog`].
#[derive(Clone)]
pub struct SqliteHistoryLog {
    pool: DatabasePool,
}

impl SqliteHistoryLog {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl HistoryLog for SqliteHistoryLog {
    async fn append(&self, entry: &HistoryEntry) -> Result<bool, RepositoryError> {
        let recipients = serde_json::to_string(&entry.recipients)
            .map_err(|e| RepositoryError::Query(format!("encode recipients: {e}")))?;
        let amount = i64::try_from(entry.amount)
            .map_err(|_| RepositoryError::Query(format!("amount {} out of range", entry.amount)))?;

        let result = sqlx::query(
            r#"INSERT OR IGNORE INTO will_history (id, will_id, kind, tx_id, timestamp, amount, recipients)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.will_id)
        .bind(entry.kind.to_string())
        .bind(&entry.tx_id)
        .bind(format_datetime(&entry.timestamp))
        .bind(amount)
        .bind(recipients)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let inserted = result.rows_affected() > 0;
        if inserted {
            tracing::debug!(will_id = %entry.will_id, tx_id = %entry.tx_id, kind = %entry.kind, "history appended");
        }
        Ok(inserted)
    }

    async fn list_for_will(&self, will_id: &str) -> Result<Vec<HistoryEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM will_history WHERE will_id = ? ORDER BY timestamp ASC, rowid ASC",
        )
        .bind(will_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_entries(&rows)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<HistoryEntry>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM will_history ORDER BY timestamp DESC, rowid DESC LIMIT ?")
            .bind(i64::from(limit))
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_entries(&rows)
    }
}

// ---------------------------------------------------------------------------
// Private Row types
// ---------------------------------------------------------------------------

struct HistoryRow {
    id: String,
    will_id: String,
    kind: String,
    tx_id: String,
    timestamp: String,
    amount: i64,
    recipients: String,
}

impl HistoryRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            will_id: row.try_get("will_id")?,
            kind: row.try_get("kind")?,
            tx_id: row.try_get("tx_id")?,
            timestamp: row.try_get("timestamp")?,
            amount: row.try_get("amount")?,
            recipients: row.try_get("recipients")?,
        })
    }

    fn into_entry(self) -> Result<HistoryEntry, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid history id: {e}")))?;
        let kind: HistoryKind = self.kind.parse().map_err(RepositoryError::Query)?;
        let amount = u64::try_from(self.amount)
            .map_err(|_| RepositoryError::Query(format!("negative amount {}", self.amount)))?;
        let recipients: Vec<String> = serde_json::from_str(&self.recipients)
            .map_err(|e| RepositoryError::Query(format!("invalid recipients: {e}")))?;

        Ok(HistoryEntry {
            id,
            will_id: self.will_id,
            kind,
            tx_id: self.tx_id,
            timestamp: parse_datetime(&self.timestamp)?,
            amount,
            recipients,
        })
    }
}

fn rows_to_entries(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<HistoryEntry>, RepositoryError> {
    rows.iter()
        .map(|row| {
            HistoryRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_entry()
        })
        .collect()
}
