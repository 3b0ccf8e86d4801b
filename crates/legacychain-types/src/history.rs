//! Audit trail entries for will transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Which transaction an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Create,
    Execute,
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryKind::Create => write!(f, "create"),
            HistoryKind::Execute => write!(f, "execute"),
        }
    }
}

impl FromStr for HistoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(HistoryKind::Create),
            "execute" => Ok(HistoryKind::Execute),
            other => Err(format!("invalid history kind: '{other}'")),
        }
    }
}

/// One successful create or execute transaction. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    /// The will's identifier (its owner address).
    pub will_id: String,
    pub kind: HistoryKind,
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub amount: u64,
    /// Beneficiary addresses paid (or to be paid) by this transaction.
    pub recipients: Vec<String>,
}

impl HistoryEntry {
    pub fn new(
        will_id: impl Into<String>,
        kind: HistoryKind,
        tx_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        amount: u64,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            will_id: will_id.into(),
            kind,
            tx_id: tx_id.into(),
            timestamp,
            amount,
            recipients,
        }
    }
}
