//! Ledger client adapters.
//!
//! - `rpc`: JSON-RPC endpoint with HMAC-signed transaction envelopes
//! - `memory`: in-process contract for development and tests

pub mod memory;
pub mod rpc;

use secrecy::{ExposeSecret, SecretString};

use legacychain_core::clock::SystemClock;
use legacychain_core::ledger::client::{LedgerClient, LedgerTransaction};
use legacychain_types::config::{LedgerBackendKind, LedgerConfig};
use legacychain_types::error::{LedgerError, WillError};
use legacychain_types::will::WillRecord;

pub use memory::InMemoryLedger;
pub use rpc::RpcLedgerClient;

/// The ledger client selected by configuration.
#[derive(Clone)]
pub enum LedgerBackend {
    Rpc(RpcLedgerClient),
    Memory(InMemoryLedger<SystemClock>),
}

impl LedgerBackend {
    /// Build the configured client.
    ///
    /// The RPC backend needs an endpoint (explicit, or the network's public
    /// default) and a signing credential.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, WillError> {
        match config.backend {
            LedgerBackendKind::Memory => {
                tracing::warn!(network = %config.network, "using in-memory ledger; state is not persisted");
                Ok(Self::Memory(InMemoryLedger::new(config.network, SystemClock)))
            }
            LedgerBackendKind::Rpc => {
                let url = config.resolved_rpc_url().ok_or_else(|| {
                    WillError::Config(format!(
                        "ledger.rpc_url is not configured and {} has no default endpoint",
                        config.network
                    ))
                })?;
                let secret = config.signing_secret.as_ref().ok_or_else(|| {
                    WillError::Config("ledger.signing_secret is not configured".to_string())
                })?;
                Ok(Self::Rpc(RpcLedgerClient::new(
                    &url,
                    config.network,
                    SecretString::from(secret.expose_secret().to_string()),
                )))
            }
        }
    }
}

impl LedgerClient for LedgerBackend {
    async fn submit(&self, tx: &LedgerTransaction) -> Result<String, LedgerError> {
        match self {
            Self::Rpc(client) => client.submit(tx).await,
            Self::Memory(ledger) => ledger.submit(tx).await,
        }
    }

    async fn read_will(
        &self,
        contract_id: &str,
        owner: &str,
    ) -> Result<Option<WillRecord>, LedgerError> {
        match self {
            Self::Rpc(client) => client.read_will(contract_id, owner).await,
            Self::Memory(ledger) => ledger.read_will(contract_id, owner).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legacychain_types::config::Network;

    #[test]
    fn test_rpc_backend_requires_signing_secret() {
        let config = LedgerConfig::default();
        let err = LedgerBackend::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("signing_secret"));
    }

    #[test]
    fn test_mainnet_requires_explicit_rpc_url() {
        let config = LedgerConfig {
            network: Network::Mainnet,
            signing_secret: Some(SecretString::from("s".to_string())),
            ..LedgerConfig::default()
        };
        let err = LedgerBackend::from_config(&config).err().unwrap();
        assert_eq!(err.kind(), "CONFIG_ERROR");
        assert!(err.to_string().contains("rpc_url"));
    }

    #[test]
    fn test_testnet_rpc_uses_default_endpoint() {
        let config = LedgerConfig {
            signing_secret: Some(SecretString::from("s".to_string())),
            ..LedgerConfig::default()
        };
        assert!(matches!(
            LedgerBackend::from_config(&config),
            Ok(LedgerBackend::Rpc(_))
        ));
    }

    #[test]
    fn test_memory_backend() {
        let config = LedgerConfig {
            backend: LedgerBackendKind::Memory,
            ..LedgerConfig::default()
        };
        assert!(matches!(
            LedgerBackend::from_config(&config),
            Ok(LedgerBackend::Memory(_))
        ));
    }
}
