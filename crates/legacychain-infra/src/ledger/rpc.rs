//! JSON-RPC ledger client.
//!
//! Transactions are serialized into an envelope bound to the configured
//! network passphrase and signed with HMAC-SHA256 under the signing
//! credential. The endpoint answers two methods:
//!
//! - `sendTransaction { envelope, signature }` -> `{ hash, status, error? }`
//! - `getWill { contractId, owner }` -> `WillRecord | null`

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use legacychain_core::ledger::client::{LedgerClient, LedgerTransaction};
use legacychain_types::config::Network;
use legacychain_types::error::LedgerError;
use legacychain_types::will::WillRecord;

type HmacSha256 = Hmac<Sha256>;

/// The signed payload of a `sendTransaction` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEnvelope {
    pub network_passphrase: String,
    pub transaction: LedgerTransaction,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionParams {
    /// JSON-encoded [`TransactionEnvelope`]; the exact bytes that were signed.
    pub envelope: String,
    /// Lowercase hex HMAC-SHA256 of `envelope`.
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionResult {
    pub hash: String,
    pub status: TransactionStatus,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Success,
    Error,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetWillParams {
    pub contract_id: String,
    pub owner: String,
}

#[derive(Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Sign `envelope` with `secret`.
pub fn sign_envelope(secret: &SecretString, envelope: &str) -> Result<String, LedgerError> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| LedgerError::Rejected("invalid signing credential".to_string()))?;
    mac.update(envelope.as_bytes());
    Ok(format!("{:x}", mac.finalize().into_bytes()))
}

/// [`LedgerClient`] over JSON-RPC 2.0.
///
/// The signing credential is a [`SecretString`]; it is only exposed to the
/// HMAC and never logged.
#[derive(Clone)]
pub struct RpcLedgerClient {
    client: reqwest::Client,
    rpc_url: String,
    network: Network,
    signing_secret: Arc<SecretString>,
    next_id: Arc<AtomicU64>,
}

impl RpcLedgerClient {
    pub fn new(rpc_url: &str, network: Network, signing_secret: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            rpc_url: rpc_url.to_string(),
            network,
            signing_secret: Arc::new(signing_secret),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    async fn call<P, T>(&self, method: &str, params: P) -> Result<Option<T>, LedgerError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LedgerError::Network(format!("rpc endpoint returned {status}")));
        }
        if !status.is_success() {
            return Err(LedgerError::Malformed(format!("rpc endpoint returned {status}")));
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| LedgerError::Malformed(e.to_string()))?;

        if let Some(error) = body.error {
            tracing::debug!(method, code = error.code, "rpc error: {}", error.message);
            return Err(LedgerError::Rejected(error.message));
        }
        Ok(body.result)
    }
}

impl LedgerClient for RpcLedgerClient {
    async fn submit(&self, tx: &LedgerTransaction) -> Result<String, LedgerError> {
        let envelope = serde_json::to_string(&TransactionEnvelope {
            network_passphrase: self.network.passphrase().to_string(),
            transaction: tx.clone(),
        })
        .map_err(|e| LedgerError::Malformed(e.to_string()))?;
        let signature = sign_envelope(&self.signing_secret, &envelope)?;

        let result: SendTransactionResult = self
            .call("sendTransaction", SendTransactionParams { envelope, signature })
            .await?
            .ok_or_else(|| LedgerError::Malformed("sendTransaction returned no result".to_string()))?;

        match result.status {
            TransactionStatus::Success => {
                tracing::debug!(
                    network = %self.network,
                    function = tx.call.function_name(),
                    tx_id = %result.hash,
                    "transaction accepted"
                );
                Ok(result.hash)
            }
            TransactionStatus::Error => Err(LedgerError::Rejected(
                result.error.unwrap_or_else(|| "transaction failed".to_string()),
            )),
        }
    }

    async fn read_will(
        &self,
        contract_id: &str,
        owner: &str,
    ) -> Result<Option<WillRecord>, LedgerError> {
        self.call(
            "getWill",
            GetWillParams {
                contract_id: contract_id.to_string(),
                owner: owner.to_string(),
            },
        )
        .await
    }
}
