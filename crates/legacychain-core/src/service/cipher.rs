//! PayloadCipher trait and per-will key material.
//!
//! Defined in legacychain-core so the orchestrator can encrypt payloads
//! without coupling to an algorithm. The AES-256-GCM adapter lives in
//! legacychain-infra.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::SecretString;

use legacychain_types::error::CipherError;

/// Length in bytes of a payload key.
pub const KEY_LEN: usize = 32;

/// A per-will symmetric key.
///
/// `Debug` never prints the key bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct PayloadKey([u8; KEY_LEN]);

impl PayloadKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CipherError> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            CipherError::InvalidKey(format!("expected {KEY_LEN} bytes, got {}", bytes.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Parse the base64 form handed to the owner at creation time.
    pub fn from_base64(encoded: &str) -> Result<Self, CipherError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|_| CipherError::InvalidKey("not valid base64".to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for PayloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PayloadKey([REDACTED])")
    }
}

/// Where the key for a will's payload comes from.
#[derive(Debug)]
pub enum KeySource {
    /// Owner-held secret, stretched with a per-owner salt.
    Secret(SecretString),
    /// A key the owner kept from creation time.
    Key(PayloadKey),
    /// Generate a fresh random key (creation only).
    Generate,
}

/// Symmetric authenticated encryption of will payloads.
///
/// `decrypt` must fail with `CipherError::DecryptionFailed` on a wrong key
/// or damaged ciphertext; it never returns garbage as success.
pub trait PayloadCipher: Send + Sync {
    /// A fresh random key.
    fn generate_key(&self) -> PayloadKey;

    /// Derive the key for `owner` from owner-held secret material.
    fn derive_key(&self, secret: &SecretString, owner: &str) -> Result<PayloadKey, CipherError>;

    fn encrypt(&self, plaintext: &[u8], key: &PayloadKey) -> Result<Vec<u8>, CipherError>;

    fn decrypt(&self, ciphertext: &[u8], key: &PayloadKey) -> Result<Vec<u8>, CipherError>;
}
