//! SQLite storage layer.
//!
//! The append-only will history and the advisory will cache, backed by
//! SQLite with WAL mode and split read/write connection pools.

pub mod cache;
pub mod history;
pub mod pool;

use chrono::{DateTime, SecondsFormat, Utc};

use legacychain_types::error::RepositoryError;

/// Fixed-width RFC 3339 so text ordering matches time ordering.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}
