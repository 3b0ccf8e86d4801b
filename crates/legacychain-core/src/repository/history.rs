//! Append-only audit log of will transactions.

use legacychain_types::error::RepositoryError;
use legacychain_types::history::HistoryEntry;

/// Persisted transaction history.
///
/// There is intentionally no update or delete. Appending the same
/// `(will_id, kind, tx_id)` twice is a no-op, so a retried append after a
/// crash cannot duplicate an entry.
pub trait HistoryLog: Send + Sync {
    /// Append an entry. Returns `false` when an identical entry already exists.
    fn append(
        &self,
        entry: &HistoryEntry,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Entries for one will, oldest first.
    fn list_for_will(
        &self,
        will_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<HistoryEntry>, RepositoryError>> + Send;

    /// Most recent entries across all wills, newest first.
    fn list_recent(
        &self,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<HistoryEntry>, RepositoryError>> + Send;
}
