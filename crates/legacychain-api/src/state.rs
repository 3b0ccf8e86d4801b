//! Application state wiring the will service to its adapters.
//!
//! `WillService` is generic over every port; `AppState` pins it to the
//! adapters chosen by configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use legacychain_core::clock::SystemClock;
use legacychain_core::ledger::registry::WillRegistry;
use legacychain_core::retry::RetryPolicy;
use legacychain_core::service::will::WillService;
use legacychain_infra::content::ContentBackend;
use legacychain_infra::crypto::payload::AesGcmPayloadCipher;
use legacychain_infra::ledger::LedgerBackend;
use legacychain_infra::sqlite::cache::SqliteWillCache;
use legacychain_infra::sqlite::history::SqliteHistoryLog;
use legacychain_infra::sqlite::pool::{DatabasePool, database_url};
use legacychain_types::config::AppConfig;

pub type ConcreteWillService = WillService<
    AesGcmPayloadCipher,
    ContentBackend,
    LedgerBackend,
    SqliteHistoryLog,
    SqliteWillCache,
    SystemClock,
>;

/// Shared state for CLI commands and REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub will_service: Arc<ConcreteWillService>,
    pub countdown_interval: Duration,
    /// Parent of every countdown task; cancelled on shutdown.
    pub shutdown: CancellationToken,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Open the database and build the configured adapters.
    ///
    /// Fails fast when the selected ledger or content backend lacks the
    /// settings it needs. A missing contract id only fails at first use.
    pub async fn init(data_dir: PathBuf, config: &AppConfig) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;
        let ledger = LedgerBackend::from_config(&config.ledger)?;
        let store = ContentBackend::from_config(&config.content)?;
        let retry = RetryPolicy::from_settings(&config.retry);

        let registry =
            WillRegistry::new(ledger, config.ledger.contracts.clone(), retry.clone());
        let will_service = WillService::new(
            AesGcmPayloadCipher::new(),
            store,
            registry,
            SqliteHistoryLog::new(db_pool.clone()),
            SqliteWillCache::new(db_pool),
            SystemClock,
            retry,
        );

        tracing::info!(
            data_dir = %data_dir.display(),
            network = %config.ledger.network,
            "application state ready"
        );

        Ok(Self {
            will_service: Arc::new(will_service),
            countdown_interval: Duration::from_secs(config.countdown.interval_secs.max(1)),
            shutdown: CancellationToken::new(),
            data_dir,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use legacychain_types::config::{
        AppConfig, ContentBackendKind, ContractIds, LedgerBackendKind,
    };

    use super::AppState;

    /// State backed by the in-memory ledger and content store, with a
    /// temporary database that lives as long as the returned dir.
    pub async fn memory_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.ledger.backend = LedgerBackendKind::Memory;
        config.ledger.contracts = ContractIds {
            will_contract_id: Some("CWILLTEST".to_string()),
        };
        config.content.backend = ContentBackendKind::Memory;
        config.retry.max_attempts = 1;
        config.countdown.interval_secs = 1;

        let state = AppState::init(dir.path().to_path_buf(), &config)
            .await
            .unwrap();
        (state, dir)
    }
}
