//! Input validation for will creation.
//!
//! Every check runs before any side effect (encryption, upload, ledger
//! submission), so a rejected request leaves nothing behind.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use legacychain_types::address::validate_address;
use legacychain_types::error::WillError;
use legacychain_types::will::{Beneficiary, WillDraft};

/// Validate an owner account address.
pub fn validate_owner(owner: &str) -> Result<(), WillError> {
    if owner.trim().is_empty() {
        return Err(WillError::Validation("owner is required".to_string()));
    }
    validate_address(owner).map_err(|e| WillError::Validation(format!("owner {e}")))
}

/// Validate the beneficiary list: non-empty, valid addresses, positive
/// shares, no address listed twice.
pub fn validate_beneficiaries(beneficiaries: &[Beneficiary]) -> Result<(), WillError> {
    if beneficiaries.is_empty() {
        return Err(WillError::Validation(
            "at least one beneficiary is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for (i, beneficiary) in beneficiaries.iter().enumerate() {
        validate_address(&beneficiary.address)
            .map_err(|e| WillError::Validation(format!("beneficiary {i} {e}")))?;
        if beneficiary.share == 0 {
            return Err(WillError::Validation(format!(
                "beneficiary {i} share must be positive"
            )));
        }
        if !seen.insert(beneficiary.address.as_str()) {
            return Err(WillError::Validation(format!(
                "beneficiary {} is listed more than once",
                beneficiary.address
            )));
        }
    }
    Ok(())
}

/// The unlock time must be strictly after `now`.
pub fn validate_unlock_timestamp(
    unlock_timestamp: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), WillError> {
    if unlock_timestamp <= now {
        return Err(WillError::Validation(
            "unlock timestamp must be in the future".to_string(),
        ));
    }
    Ok(())
}

/// Largest amount the audit log can store as a signed 64-bit integer.
pub const MAX_AMOUNT: u64 = i64::MAX as u64;

pub fn validate_amount(amount: u64) -> Result<(), WillError> {
    if amount > MAX_AMOUNT {
        return Err(WillError::Validation(format!(
            "amount exceeds maximum of {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

/// Validate a complete draft.
pub fn validate_draft(draft: &WillDraft, now: DateTime<Utc>) -> Result<(), WillError> {
    validate_owner(&draft.owner)?;
    validate_beneficiaries(&draft.beneficiaries)?;
    validate_amount(draft.amount)?;
    if draft.payload_reference.trim().is_empty() {
        return Err(WillError::Validation(
            "payload reference is required".to_string(),
        ));
    }
    validate_unlock_timestamp(draft.unlock_timestamp, now)
}
