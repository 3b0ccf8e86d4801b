//! Advisory cache of last-observed will status.
//!
//! The cache is never authoritative. The orchestrator reconciles it from the
//! registry on every read and before every execute.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use legacychain_types::error::RepositoryError;
use legacychain_types::will::{WillRecord, WillStatus};

/// Last observed status of one will lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedWill {
    pub will_id: String,
    /// Identifies the lifecycle; a different value means a new will.
    pub created_tx_id: String,
    pub status: WillStatus,
    pub executed_tx_id: Option<String>,
    pub failure_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl CachedWill {
    /// Snapshot of a registry record as observed at `now`.
    pub fn observed(record: &WillRecord, now: DateTime<Utc>) -> Self {
        Self {
            will_id: record.owner.clone(),
            created_tx_id: record.created_tx_id.clone(),
            status: record.status_at(now),
            executed_tx_id: record.executed_tx_id.clone(),
            failure_reason: None,
            updated_at: now,
        }
    }

    /// This entry marked as failed.
    pub fn failed(mut self, reason: impl Into<String>, now: DateTime<Utc>) -> Self {
        self.status = WillStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.updated_at = now;
        self
    }

    /// Merge a newer observation into this one.
    ///
    /// A different lifecycle replaces the entry outright. Within one
    /// lifecycle the status only moves forward; a backwards observation keeps
    /// the stored status. Returns `None` when nothing changes.
    pub fn merge(&self, next: CachedWill) -> Option<CachedWill> {
        if next.created_tx_id != self.created_tx_id {
            return Some(next);
        }
        if next.status == self.status && next.executed_tx_id == self.executed_tx_id {
            return None;
        }
        if self.status.can_transition_to(next.status) {
            Some(next)
        } else {
            None
        }
    }
}

/// Storage for [`CachedWill`] snapshots.
pub trait WillCache: Send + Sync {
    fn get(
        &self,
        will_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<CachedWill>, RepositoryError>> + Send;

    fn upsert(
        &self,
        entry: &CachedWill,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
