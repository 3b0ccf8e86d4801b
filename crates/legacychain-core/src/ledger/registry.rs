//! Will registry: create, read and execute wills against the ledger.
//!
//! The registry is the single source of truth for will status once a will
//! exists. It checks the contract id on every call, so an unconfigured
//! deployment fails with `ConfigError` at first use rather than at startup.

use chrono::{DateTime, Utc};

use legacychain_types::config::ContractIds;
use legacychain_types::error::WillError;
use legacychain_types::will::{WillDraft, WillRecord};

use super::client::{LedgerClient, LedgerTransaction};
use crate::retry::RetryPolicy;
use crate::service::validation;

/// Registry over a [`LedgerClient`].
pub struct WillRegistry<L: LedgerClient> {
    ledger: L,
    contracts: ContractIds,
    retry: RetryPolicy,
}

impl<L: LedgerClient> WillRegistry<L> {
    pub fn new(ledger: L, contracts: ContractIds, retry: RetryPolicy) -> Self {
        Self {
            ledger,
            contracts,
            retry,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    fn contract_id(&self) -> Result<&str, WillError> {
        self.contracts.will_contract().map_err(WillError::Config)
    }

    /// Record a new will on-chain and return the creation transaction id.
    ///
    /// Validation runs first; an invalid draft never reaches the ledger.
    pub async fn create_will(
        &self,
        draft: &WillDraft,
        now: DateTime<Utc>,
    ) -> Result<String, WillError> {
        validation::validate_draft(draft, now)?;
        let contract_id = self.contract_id()?;
        let tx = LedgerTransaction::create_will(contract_id, draft);

        let tx_id = self.submit(&tx).await?;
        tracing::info!(owner = %draft.owner, tx_id = %tx_id, "will registered");
        Ok(tx_id)
    }

    /// Read the authoritative record for `owner`, if the contract has one.
    pub async fn find_will(&self, owner: &str) -> Result<Option<WillRecord>, WillError> {
        validation::validate_owner(owner)?;
        let contract_id = self.contract_id()?;
        let ledger = &self.ledger;
        self.retry
            .run("ledger.read_will", move || ledger.read_will(contract_id, owner))
            .await
    }

    /// Read the authoritative record for `owner`.
    pub async fn get_will(&self, owner: &str) -> Result<WillRecord, WillError> {
        self.find_will(owner)
            .await?
            .ok_or_else(|| WillError::NotFound(format!("no will registered for {owner}")))
    }

    /// Submit the execution transaction.
    ///
    /// Duplicate executions are rejected by the ledger and surface as
    /// `LedgerRejected`; the registry never retries a rejection.
    pub async fn execute_will(&self, owner: &str) -> Result<String, WillError> {
        validation::validate_owner(owner)?;
        let contract_id = self.contract_id()?;
        let tx = LedgerTransaction::execute_will(contract_id, owner);

        let tx_id = self.submit(&tx).await?;
        tracing::info!(owner = %owner, tx_id = %tx_id, "will executed");
        Ok(tx_id)
    }

    async fn submit(&self, tx: &LedgerTransaction) -> Result<String, WillError> {
        let ledger = &self.ledger;
        let result = self.retry.run("ledger.submit", move || ledger.submit(tx)).await;
        if let Err(ref e) = result {
            tracing::warn!(
                function = tx.call.function_name(),
                owner = %tx.call.owner(),
                kind = e.kind(),
                "ledger submission failed: {e}"
            );
        }
        result
    }
}
