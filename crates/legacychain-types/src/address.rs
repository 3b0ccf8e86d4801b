//! Ledger account address validation.
//!
//! Account addresses on the target ledger are 56-character strings beginning
//! with `G`. The check is deliberately shape-only: checksum verification
//! belongs to the ledger SDK.

/// Exact length of a ledger account address.
pub const ADDRESS_LENGTH: usize = 56;

/// Required leading character of a ledger account address.
pub const ADDRESS_PREFIX: char = 'G';

/// Returns `true` if `address` has the ledger's account-address shape.
///
/// # Examples
///
/// ```
/// use legacychain_types::address::is_valid_address;
///
/// let ok = format!("G{}", "A".repeat(55));
/// assert!(is_valid_address(&ok));
/// assert!(!is_valid_address(&ok[..55]));
/// ```
pub fn is_valid_address(address: &str) -> bool {
    address.len() == ADDRESS_LENGTH && address.starts_with(ADDRESS_PREFIX)
}

/// Validate an address, returning a description of the problem on failure.
pub fn validate_address(address: &str) -> Result<(), String> {
    if address.is_empty() {
        return Err("address is empty".to_string());
    }
    if !address.starts_with(ADDRESS_PREFIX) {
        return Err(format!("address '{address}' must start with '{ADDRESS_PREFIX}'"));
    }
    if address.len() != ADDRESS_LENGTH {
        return Err(format!(
            "address '{address}' must be {ADDRESS_LENGTH} characters, got {}",
            address.len()
        ));
    }
    Ok(())
}
