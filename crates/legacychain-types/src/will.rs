use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// A beneficiary entitled to a weighted share of the will's amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    /// Ledger account address (56 chars, `G` prefix).
    pub address: String,
    /// Relative weight. Payouts are proportional to `share / sum(shares)`.
    pub share: u32,
}

impl Beneficiary {
    pub fn new(address: impl Into<String>, share: u32) -> Self {
        Self {
            address: address.into(),
            share,
        }
    }
}

/// Beneficiary as accepted on the wire.
///
/// Either a bare address (share 1) or an `{address, share}` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BeneficiaryInput {
    Address(String),
    Weighted {
        address: String,
        #[serde(default = "default_share")]
        share: u32,
    },
}

fn default_share() -> u32 {
    1
}

impl From<BeneficiaryInput> for Beneficiary {
    fn from(input: BeneficiaryInput) -> Self {
        match input {
            BeneficiaryInput::Address(address) => Beneficiary::new(address, 1),
            BeneficiaryInput::Weighted { address, share } => Beneficiary::new(address, share),
        }
    }
}

/// Will lifecycle states.
///
/// - Draft: validated locally, nothing on-chain yet
/// - Locked: registered on-chain, unlock time in the future
/// - Unlockable: unlock time reached (derived, never its own transaction)
/// - Executed: execution transaction accepted by the ledger
/// - Failed: unrecoverable error, terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WillStatus {
    Draft,
    Locked,
    Unlockable,
    Executed,
    Failed,
}

impl WillStatus {
    fn rank(self) -> u8 {
        match self {
            WillStatus::Draft => 0,
            WillStatus::Locked => 1,
            WillStatus::Unlockable => 2,
            WillStatus::Executed => 3,
            WillStatus::Failed => 4,
        }
    }

    /// Executed and Failed accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, WillStatus::Executed | WillStatus::Failed)
    }

    /// Whether moving from `self` to `next` respects the monotonic lifecycle.
    ///
    /// Staying in the same state is always allowed (re-observation).
    pub fn can_transition_to(self, next: WillStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match next {
            WillStatus::Failed => true,
            _ => next.rank() > self.rank(),
        }
    }
}

impl fmt::Display for WillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WillStatus::Draft => write!(f, "draft"),
            WillStatus::Locked => write!(f, "locked"),
            WillStatus::Unlockable => write!(f, "unlockable"),
            WillStatus::Executed => write!(f, "executed"),
            WillStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for WillStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(WillStatus::Draft),
            "locked" => Ok(WillStatus::Locked),
            "unlockable" => Ok(WillStatus::Unlockable),
            "executed" => Ok(WillStatus::Executed),
            "failed" => Ok(WillStatus::Failed),
            other => Err(format!("invalid will status: '{other}'")),
        }
    }
}

/// A will ready to be registered on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WillDraft {
    pub owner: String,
    pub beneficiaries: Vec<Beneficiary>,
    pub amount: u64,
    /// Content reference of the encrypted payload.
    pub payload_reference: String,
    pub unlock_timestamp: DateTime<Utc>,
}

/// The authoritative will record as stored by the registry contract.
///
/// `executed_tx_id` is the only execution marker, so "executed" and
/// "has an executed tx id" can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WillRecord {
    pub owner: String,
    pub beneficiaries: Vec<Beneficiary>,
    pub amount: u64,
    pub payload_reference: String,
    pub unlock_timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub created_tx_id: String,
    #[serde(default)]
    pub executed_tx_id: Option<String>,
}

impl WillRecord {
    /// Build the record the contract stores for a freshly registered draft.
    pub fn from_draft(draft: &WillDraft, created_at: DateTime<Utc>, created_tx_id: String) -> Self {
        Self {
            owner: draft.owner.clone(),
            beneficiaries: draft.beneficiaries.clone(),
            amount: draft.amount,
            payload_reference: draft.payload_reference.clone(),
            unlock_timestamp: draft.unlock_timestamp,
            created_at,
            created_tx_id,
            executed_tx_id: None,
        }
    }

    pub fn is_executed(&self) -> bool {
        self.executed_tx_id.is_some()
    }

    /// The registration terms this record was created from.
    pub fn terms(&self) -> WillDraft {
        WillDraft {
            owner: self.owner.clone(),
            beneficiaries: self.beneficiaries.clone(),
            amount: self.amount,
            payload_reference: self.payload_reference.clone(),
            unlock_timestamp: self.unlock_timestamp,
        }
    }

    /// Status derived from authoritative state at `now`.
    pub fn status_at(&self, now: DateTime<Utc>) -> WillStatus {
        if self.is_executed() {
            WillStatus::Executed
        } else if now >= self.unlock_timestamp {
            WillStatus::Unlockable
        } else {
            WillStatus::Locked
        }
    }

    /// Beneficiary addresses in declaration order.
    pub fn recipients(&self) -> Vec<String> {
        self.beneficiaries.iter().map(|b| b.address.clone()).collect()
    }

    /// Split `amount` across beneficiaries proportionally to their shares.
    ///
    /// Each payout is floored; the rounding remainder goes to the first
    /// beneficiary so the plan always sums to `amount`.
    pub fn disbursement_plan(&self) -> Vec<Disbursement> {
        disbursement_plan(&self.beneficiaries, self.amount)
    }
}

/// One payout of an executed will.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disbursement {
    pub address: String,
    pub amount: u64,
}

/// Proportional split of `amount` by share weight.
pub fn disbursement_plan(beneficiaries: &[Beneficiary], amount: u64) -> Vec<Disbursement> {
    let total_shares: u128 = beneficiaries.iter().map(|b| u128::from(b.share)).sum();
    if total_shares == 0 {
        return Vec::new();
    }

    let mut plan: Vec<Disbursement> = beneficiaries
        .iter()
        .map(|b| Disbursement {
            address: b.address.clone(),
            amount: (u128::from(amount) * u128::from(b.share) / total_shares) as u64,
        })
        .collect();

    let paid: u64 = plan.iter().map(|d| d.amount).sum();
    if let Some(first) = plan.first_mut() {
        first.amount += amount - paid;
    }
    plan
}
