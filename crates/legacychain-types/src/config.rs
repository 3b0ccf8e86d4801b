//! Deployment configuration types for LegacyChain.
//!
//! `AppConfig` represents the top-level `config.toml`. All fields have
//! defaults so a missing file still yields a usable (if unconfigured)
//! deployment; missing ledger identifiers surface as configuration errors
//! at first use, not at startup.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

use std::fmt;
use std::str::FromStr;

/// Top-level configuration. Loaded from `~/.legacychain/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub countdown: CountdownSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which ledger client backs the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackendKind {
    /// JSON-RPC transaction-submission service.
    #[default]
    Rpc,
    /// Process-local simulated ledger (development and tests).
    Memory,
}

/// Network selector. Exactly one network per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Futurenet,
    Mainnet,
}

impl Network {
    /// Passphrase that binds signed transactions to this network.
    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Testnet => "Test SDF Network ; September 2015",
            Network::Futurenet => "Test SDF Future Network ; October 2022",
            Network::Mainnet => "Public Global Stellar Network ; September 2015",
        }
    }

    /// Public RPC endpoint used when none is configured.
    pub fn default_rpc_url(&self) -> Option<&'static str> {
        match self {
            Network::Testnet => Some("https://soroban-testnet.stellar.org"),
            Network::Futurenet => Some("https://rpc-futurenet.stellar.org"),
            Network::Mainnet => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Testnet => write!(f, "testnet"),
            Network::Futurenet => write!(f, "futurenet"),
            Network::Mainnet => write!(f, "mainnet"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "testnet" | "test" => Ok(Network::Testnet),
            "futurenet" => Ok(Network::Futurenet),
            "mainnet" | "public" | "production" => Ok(Network::Mainnet),
            other => Err(format!("invalid network: '{other}'")),
        }
    }
}

/// Ledger connection settings.
///
/// Not `Clone`: the signing secret is handed to exactly one client.
#[derive(Debug, Default, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub backend: LedgerBackendKind,
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub network: Network,
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub signing_secret: Option<SecretString>,
    #[serde(default)]
    pub contracts: ContractIds,
}

impl LedgerConfig {
    /// Configured RPC endpoint, falling back to the network's public one.
    pub fn resolved_rpc_url(&self) -> Option<String> {
        self.rpc_url
            .clone()
            .or_else(|| self.network.default_rpc_url().map(str::to_string))
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .map(SecretString::from))
}

/// Registry/contract identifier mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractIds {
    #[serde(default)]
    pub will_contract_id: Option<String>,
}

impl ContractIds {
    /// The will contract id, or a description of why it is unusable.
    ///
    /// Empty ids and `REPLACE...` placeholders count as unconfigured.
    pub fn will_contract(&self) -> Result<&str, String> {
        match self.will_contract_id.as_deref() {
            None => Err("will_contract_id is not configured".to_string()),
            Some(id) if id.trim().is_empty() || id.starts_with("REPLACE") => {
                Err(format!("will_contract_id '{id}' is a placeholder"))
            }
            Some(id) => Ok(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentBackendKind {
    #[default]
    Http,
    Memory,
}

/// Content-addressed payload store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default)]
    pub backend: ContentBackendKind,
    #[serde(default)]
    pub gateway_url: Option<String>,
}

/// Bounded exponential backoff for transient I/O.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    4
}

fn default_base_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    5_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Countdown recomputation cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    30
}

impl Default for CountdownSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}
