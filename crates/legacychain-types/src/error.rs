use thiserror::Error;

use crate::unlock::Remaining;

/// Errors from the ledger transaction-submission service.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger network error: {0}")]
    Network(String),

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("will not found on ledger")]
    NotFound,

    #[error("malformed ledger response: {0}")]
    Malformed(String),
}

/// Errors from the content-addressed payload store.
#[derive(Debug, Error)]
pub enum ContentStoreError {
    #[error("content store unavailable: {0}")]
    Unavailable(String),

    #[error("content not found: {0}")]
    NotFound(String),

    #[error("content store rejected request: {0}")]
    Rejected(String),
}

/// Errors from payload encryption.
///
/// IMPORTANT: These errors never include plaintext, key material, or ciphertext
/// in their Display/Debug output.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("key derivation failed")]
    KeyDerivationFailed,

    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// Errors from repository operations (used by trait definitions in legacychain-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by will lifecycle operations.
///
/// Each variant is a distinct kind the caller can act on; see [`WillError::kind`].
#[derive(Debug, Error)]
pub enum WillError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("ledger rejected transaction: {0}")]
    LedgerRejected(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("payload decryption failed: wrong key or corrupted payload")]
    DecryptionFailed,

    #[error("will is still locked ({remaining} remaining)")]
    NotYetUnlockable { remaining: Remaining },

    #[error("content store unavailable: {0}")]
    StorageUnavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("audit log error: {0}")]
    AuditLog(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl WillError {
    /// Stable machine-readable code for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            WillError::Validation(_) => "VALIDATION_ERROR",
            WillError::Network(_) => "NETWORK_ERROR",
            WillError::LedgerRejected(_) => "LEDGER_REJECTED",
            WillError::Config(_) => "CONFIG_ERROR",
            WillError::DecryptionFailed => "DECRYPTION_FAILED",
            WillError::NotYetUnlockable { .. } => "NOT_YET_UNLOCKABLE",
            WillError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            WillError::NotFound(_) => "NOT_FOUND",
            WillError::AuditLog(_) => "AUDIT_LOG_ERROR",
            WillError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Transient transport failures worth retrying with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WillError::Network(_) | WillError::StorageUnavailable(_))
    }
}

impl From<LedgerError> for WillError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Network(msg) => WillError::Network(msg),
            LedgerError::Rejected(msg) => WillError::LedgerRejected(msg),
            LedgerError::NotFound => WillError::NotFound("will not registered".to_string()),
            LedgerError::Malformed(msg) => WillError::Internal(format!("ledger response: {msg}")),
        }
    }
}

impl From<ContentStoreError> for WillError {
    fn from(e: ContentStoreError) -> Self {
        match e {
            ContentStoreError::Unavailable(msg) => WillError::StorageUnavailable(msg),
            ContentStoreError::NotFound(reference) => {
                WillError::NotFound(format!("payload '{reference}'"))
            }
            ContentStoreError::Rejected(msg) => WillError::Internal(format!("content store: {msg}")),
        }
    }
}

impl From<CipherError> for WillError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::DecryptionFailed => WillError::DecryptionFailed,
            CipherError::InvalidKey(msg) => WillError::Validation(format!("invalid payload key: {msg}")),
            other => WillError::Internal(other.to_string()),
        }
    }
}

impl From<RepositoryError> for WillError {
    fn from(e: RepositoryError) -> Self {
        WillError::AuditLog(e.to_string())
    }
}
