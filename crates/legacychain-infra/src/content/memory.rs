//! In-process content store addressed by SHA-256.

use std::sync::Arc;

use dashmap::DashMap;

use legacychain_core::service::content::ContentStore;
use legacychain_types::error::ContentStoreError;

use crate::crypto::hash::sha256_hex;

/// Content store keyed by the lowercase hex SHA-256 of each blob.
///
/// Clones share storage. Fetched bytes are re-hashed, so a blob altered in
/// place reads back as missing rather than as someone else's ciphertext.
#[derive(Clone, Default)]
pub struct InMemoryContentStore {
    blobs: Arc<DashMap<String, Vec<u8>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Drop a blob, as an unpinned gateway eventually would.
    pub fn remove(&self, reference: &str) -> bool {
        self.blobs.remove(reference).is_some()
    }
}

impl ContentStore for InMemoryContentStore {
    async fn upload(&self, ciphertext: &[u8]) -> Result<String, ContentStoreError> {
        let reference = sha256_hex(ciphertext);
        self.blobs
            .entry(reference.clone())
            .or_insert_with(|| ciphertext.to_vec());
        Ok(reference)
    }

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, ContentStoreError> {
        let bytes = self
            .blobs
            .get(reference)
            .map(|b| b.value().clone())
            .ok_or_else(|| ContentStoreError::NotFound(reference.to_string()))?;

        if sha256_hex(&bytes) != reference {
            tracing::error!(reference = %reference, "stored blob does not match its digest");
            return Err(ContentStoreError::NotFound(reference.to_string()));
        }
        Ok(bytes)
    }
}
