//! Content-addressed payload store adapters.
//!
//! - `http`: a blob gateway reached over HTTP
//! - `memory`: SHA-256 addressed in-process store for development and tests

pub mod http;
pub mod memory;

use legacychain_core::service::content::ContentStore;
use legacychain_types::config::{ContentBackendKind, ContentConfig};
use legacychain_types::error::{ContentStoreError, WillError};

pub use http::HttpContentStore;
pub use memory::InMemoryContentStore;

/// The content store selected by configuration.
#[derive(Clone)]
pub enum ContentBackend {
    Http(HttpContentStore),
    Memory(InMemoryContentStore),
}

impl ContentBackend {
    /// Build the configured backend. The HTTP backend needs a gateway URL.
    pub fn from_config(config: &ContentConfig) -> Result<Self, WillError> {
        match config.backend {
            ContentBackendKind::Memory => Ok(Self::Memory(InMemoryContentStore::new())),
            ContentBackendKind::Http => {
                let url = config
                    .gateway_url
                    .as_deref()
                    .filter(|u| !u.trim().is_empty())
                    .ok_or_else(|| {
                        WillError::Config("content.gateway_url is not configured".to_string())
                    })?;
                Ok(Self::Http(HttpContentStore::new(url)))
            }
        }
    }
}

impl ContentStore for ContentBackend {
    async fn upload(&self, ciphertext: &[u8]) -> Result<String, ContentStoreError> {
        match self {
            Self::Http(store) => store.upload(ciphertext).await,
            Self::Memory(store) => store.upload(ciphertext).await,
        }
    }

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, ContentStoreError> {
        match self {
            Self::Http(store) => store.fetch(reference).await,
            Self::Memory(store) => store.fetch(reference).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_backend_requires_gateway() {
        let config = ContentConfig::default();
        let err = ContentBackend::from_config(&config).err().unwrap();
        assert_eq!(err.kind(), "CONFIG_ERROR");
    }

    #[tokio::test]
    async fn test_memory_backend_roundtrip() {
        let backend = ContentBackend::from_config(&ContentConfig {
            backend: ContentBackendKind::Memory,
            gateway_url: None,
        })
        .unwrap();
        let reference = backend.upload(b"ciphertext").await.unwrap();
        assert_eq!(backend.fetch(&reference).await.unwrap(), b"ciphertext");
    }
}
