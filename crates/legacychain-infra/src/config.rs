//! Configuration loader for LegacyChain.
//!
//! Reads `config.toml` from the data directory (`~/.legacychain/` by
//! default) into [`AppConfig`], then applies `LEGACYCHAIN_*` environment
//! overrides. A missing or malformed file falls back to defaults.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use legacychain_types::config::{AppConfig, Network};

pub const ENV_DATA_DIR: &str = "LEGACYCHAIN_DATA_DIR";
pub const ENV_RPC_URL: &str = "LEGACYCHAIN_RPC_URL";
pub const ENV_NETWORK: &str = "LEGACYCHAIN_NETWORK";
pub const ENV_SIGNING_SECRET: &str = "LEGACYCHAIN_SIGNING_SECRET";
pub const ENV_WILL_CONTRACT_ID: &str = "LEGACYCHAIN_WILL_CONTRACT_ID";
pub const ENV_CONTENT_GATEWAY: &str = "LEGACYCHAIN_CONTENT_GATEWAY";

/// Data directory: `LEGACYCHAIN_DATA_DIR`, else `~/.legacychain`.
pub fn resolve_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(ENV_DATA_DIR).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".legacychain")
}

/// Load `{data_dir}/config.toml` and apply environment overrides.
pub async fn load_app_config(data_dir: &Path) -> AppConfig {
    let mut config = load_config_file(data_dir).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

async fn load_config_file(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            AppConfig::default()
        }
    }
}

/// Apply `LEGACYCHAIN_*` overrides. Empty values are ignored.
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = var(ENV_RPC_URL) {
        config.ledger.rpc_url = Some(url);
    }
    if let Some(network) = var(ENV_NETWORK) {
        match network.parse::<Network>() {
            Ok(network) => config.ledger.network = network,
            Err(e) => tracing::warn!("Ignoring {ENV_NETWORK}: {e}"),
        }
    }
    if let Some(secret) = var(ENV_SIGNING_SECRET) {
        config.ledger.signing_secret = Some(SecretString::from(secret));
    }
    if let Some(id) = var(ENV_WILL_CONTRACT_ID) {
        config.ledger.contracts.will_contract_id = Some(id);
    }
    if let Some(url) = var(ENV_CONTENT_GATEWAY) {
        config.content.gateway_url = Some(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use legacychain_types::config::{ContentBackendKind, LedgerBackendKind};
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config_file(tmp.path()).await;
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.ledger.network, Network::Testnet);
        assert!(config.ledger.contracts.will_contract_id.is_none());
    }

    #[tokio::test]
    async fn load_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[server]
port = 8080

[ledger]
backend = "memory"
network = "futurenet"
signing_secret = "s3cret"

[ledger.contracts]
will_contract_id = "CWILL123"

[content]
backend = "memory"

[countdown]
interval_secs = 5
"#,
        )
        .await
        .unwrap();

        let config = load_config_file(tmp.path()).await;
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.ledger.backend, LedgerBackendKind::Memory);
        assert_eq!(config.ledger.network, Network::Futurenet);
        assert_eq!(
            config.ledger.signing_secret.as_ref().unwrap().expose_secret(),
            "s3cret"
        );
        assert_eq!(config.ledger.contracts.will_contract().unwrap(), "CWILL123");
        assert_eq!(config.content.backend, ContentBackendKind::Memory);
        assert_eq!(config.countdown.interval_secs, 5);
    }

    #[tokio::test]
    async fn load_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();
        let config = load_config_file(tmp.path()).await;
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_RPC_URL, "http://localhost:8000"),
            (ENV_NETWORK, "production"),
            (ENV_SIGNING_SECRET, "from-env"),
            (ENV_WILL_CONTRACT_ID, "CENV"),
            (ENV_CONTENT_GATEWAY, "http://gateway"),
        ]);
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.ledger.rpc_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.ledger.network, Network::Mainnet);
        assert_eq!(
            config.ledger.signing_secret.as_ref().unwrap().expose_secret(),
            "from-env"
        );
        assert_eq!(config.ledger.contracts.will_contract().unwrap(), "CENV");
        assert_eq!(config.content.gateway_url.as_deref(), Some("http://gateway"));
    }

    #[test]
    fn invalid_or_empty_env_values_are_ignored() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |k| match k {
            ENV_NETWORK => Some("moonnet".to_string()),
            ENV_WILL_CONTRACT_ID => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.ledger.network, Network::Testnet);
        assert!(config.ledger.contracts.will_contract_id.is_none());
    }
}
