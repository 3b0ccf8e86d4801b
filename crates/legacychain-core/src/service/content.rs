//! ContentStore trait: the opaque content-addressed payload store.
//!
//! `HttpContentStore` and `InMemoryContentStore` live in legacychain-infra.

use legacychain_types::error::ContentStoreError;

/// Upload/fetch of encrypted payloads.
///
/// Only ciphertext ever crosses this boundary.
pub trait ContentStore: Send + Sync {
    /// Store `ciphertext` and return its reference.
    fn upload(
        &self,
        ciphertext: &[u8],
    ) -> impl std::future::Future<Output = Result<String, ContentStoreError>> + Send;

    /// Fetch the ciphertext stored under `reference`.
    fn fetch(
        &self,
        reference: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, ContentStoreError>> + Send;
}
