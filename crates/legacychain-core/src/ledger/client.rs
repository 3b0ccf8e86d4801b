//! LedgerClient trait: the opaque transaction-submission service.
//!
//! The `RpcLedgerClient` and `InMemoryLedger` adapters live in
//! legacychain-infra.

use serde::{Deserialize, Serialize};

use legacychain_types::error::LedgerError;
use legacychain_types::will::{WillDraft, WillRecord};

/// A will contract invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "function", content = "args", rename_all = "snake_case")]
pub enum ContractCall {
    CreateWill { will: WillDraft },
    ExecuteWill { owner: String },
}

impl ContractCall {
    pub fn owner(&self) -> &str {
        match self {
            ContractCall::CreateWill { will } => &will.owner,
            ContractCall::ExecuteWill { owner } => owner,
        }
    }

    pub fn function_name(&self) -> &'static str {
        match self {
            ContractCall::CreateWill { .. } => "create_will",
            ContractCall::ExecuteWill { .. } => "execute_will",
        }
    }
}

/// A transaction ready to be signed and submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    pub contract_id: String,
    pub call: ContractCall,
    pub memo: String,
}

impl LedgerTransaction {
    pub fn create_will(contract_id: &str, draft: &WillDraft) -> Self {
        Self {
            contract_id: contract_id.to_string(),
            memo: format!("will:create:{}", draft.owner),
            call: ContractCall::CreateWill {
                will: draft.clone(),
            },
        }
    }

    pub fn execute_will(contract_id: &str, owner: &str) -> Self {
        Self {
            contract_id: contract_id.to_string(),
            memo: format!("will:execute:{owner}"),
            call: ContractCall::ExecuteWill {
                owner: owner.to_string(),
            },
        }
    }
}

/// Abstraction over the ledger network.
///
/// The ledger's own state check is the idempotency boundary: a second
/// `execute_will` submission for the same owner must come back as
/// `LedgerError::Rejected`, never as a second transaction id.
pub trait LedgerClient: Send + Sync {
    /// Sign and submit a transaction, returning its transaction id.
    fn submit(
        &self,
        tx: &LedgerTransaction,
    ) -> impl std::future::Future<Output = Result<String, LedgerError>> + Send;

    /// Read the will the contract stores for `owner`, if any.
    fn read_will(
        &self,
        contract_id: &str,
        owner: &str,
    ) -> impl std::future::Future<Output = Result<Option<WillRecord>, LedgerError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use legacychain_types::will::Beneficiary;

    #[test]
    fn create_transaction_carries_memo_and_call() {
        let draft = WillDraft {
            owner: "GOWNER".to_string(),
            beneficiaries: vec![Beneficiary::new("GBEN", 1)],
            amount: 10,
            payload_reference: "abc".to_string(),
            unlock_timestamp: Utc::now(),
        };
        let tx = LedgerTransaction::create_will("CWILL", &draft);
        assert_eq!(tx.memo, "will:create:GOWNER");
        assert_eq!(tx.call.function_name(), "create_will");
        assert_eq!(tx.call.owner(), "GOWNER");
    }

    #[test]
    fn call_serializes_as_function_and_args() {
        let tx = LedgerTransaction::execute_will("CWILL", "GOWNER");
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["contractId"], "CWILL");
        assert_eq!(json["call"]["function"], "execute_will");
        assert_eq!(json["call"]["args"]["owner"], "GOWNER");
        assert_eq!(json["memo"], "will:execute:GOWNER");
    }
}
