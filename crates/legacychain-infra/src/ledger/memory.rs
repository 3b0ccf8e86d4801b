//! In-process ledger enforcing the will contract rules.
//!
//! Records are keyed by `(contract_id, owner)`. Each key is updated through
//! a single dashmap entry, so the check-then-write of create and execute is
//! atomic per owner and concurrent duplicate executions are rejected exactly
//! as the real contract would reject them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use legacychain_core::clock::Clock;
use legacychain_core::ledger::client::{ContractCall, LedgerClient, LedgerTransaction};
use legacychain_types::config::Network;
use legacychain_types::error::LedgerError;
use legacychain_types::will::{Disbursement, WillRecord};

use crate::crypto::hash::sha256_hex;

/// In-memory [`LedgerClient`]. Clones share state.
#[derive(Clone)]
pub struct InMemoryLedger<C: Clock> {
    network: Network,
    clock: C,
    wills: Arc<DashMap<(String, String), WillRecord>>,
    disbursements: Arc<DashMap<String, Vec<Disbursement>>>,
    sequence: Arc<AtomicU64>,
}

impl<C: Clock> InMemoryLedger<C> {
    pub fn new(network: Network, clock: C) -> Self {
        Self {
            network,
            clock,
            wills: Arc::new(DashMap::new()),
            disbursements: Arc::new(DashMap::new()),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Payouts recorded by an execute transaction.
    pub fn disbursements(&self, tx_id: &str) -> Option<Vec<Disbursement>> {
        self.disbursements.get(tx_id).map(|d| d.value().clone())
    }

    /// Number of transactions accepted so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    fn tx_hash(&self, seq: u64, tx: &LedgerTransaction) -> Result<String, LedgerError> {
        let body = serde_json::to_vec(tx).map_err(|e| LedgerError::Malformed(e.to_string()))?;
        let mut preimage = Vec::with_capacity(body.len() + 64);
        preimage.extend_from_slice(self.network.passphrase().as_bytes());
        preimage.extend_from_slice(&seq.to_be_bytes());
        preimage.extend_from_slice(&body);
        Ok(sha256_hex(&preimage))
    }

    /// Apply a transaction to contract state, returning its hash.
    pub fn apply(&self, tx: &LedgerTransaction) -> Result<String, LedgerError> {
        let now = self.clock.now();
        let key = (tx.contract_id.clone(), tx.call.owner().to_string());

        match &tx.call {
            ContractCall::CreateWill { will } => match self.wills.entry(key) {
                Entry::Occupied(existing) if !existing.get().is_executed() => {
                    Err(LedgerError::Rejected("will already exists for owner".to_string()))
                }
                entry => {
                    let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
                    let tx_id = self.tx_hash(seq, tx)?;
                    entry.insert(WillRecord::from_draft(will, now, tx_id.clone()));
                    Ok(tx_id)
                }
            },
            ContractCall::ExecuteWill { .. } => {
                let mut record = self.wills.get_mut(&key).ok_or(LedgerError::NotFound)?;
                if record.is_executed() {
                    return Err(LedgerError::Rejected("will already executed".to_string()));
                }
                if now < record.unlock_timestamp {
                    return Err(LedgerError::Rejected("will is still locked".to_string()));
                }

                let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
                let tx_id = self.tx_hash(seq, tx)?;
                record.executed_tx_id = Some(tx_id.clone());
                self.disbursements
                    .insert(tx_id.clone(), record.disbursement_plan());
                Ok(tx_id)
            }
        }
    }

    pub fn read(&self, contract_id: &str, owner: &str) -> Option<WillRecord> {
        self.wills
            .get(&(contract_id.to_string(), owner.to_string()))
            .map(|r| r.value().clone())
    }
}

impl<C: Clock> LedgerClient for InMemoryLedger<C> {
    async fn submit(&self, tx: &LedgerTransaction) -> Result<String, LedgerError> {
        let result = self.apply(tx);
        match &result {
            Ok(tx_id) => tracing::debug!(
                function = tx.call.function_name(),
                owner = %tx.call.owner(),
                tx_id = %tx_id,
                "transaction applied"
            ),
            Err(e) => tracing::debug!(
                function = tx.call.function_name(),
                owner = %tx.call.owner(),
                "transaction rejected: {e}"
            ),
        }
        result
    }

    async fn read_will(
        &self,
        contract_id: &str,
        owner: &str,
    ) -> Result<Option<WillRecord>, LedgerError> {
        Ok(self.read(contract_id, owner))
    }
}
