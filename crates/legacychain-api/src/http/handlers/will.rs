//! Will lifecycle handlers: create, seal, read, execute, reveal.

use axum::extract::{Path, State};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use legacychain_core::service::cipher::{KeySource, PayloadKey};
use legacychain_core::service::will::{ExecuteOutcome, SealRequest, WillView};
use legacychain_types::will::{Beneficiary, BeneficiaryInput, WillDraft};

use crate::http::error::AppError;
use crate::http::extractors::ApiJson;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Body of `POST /api/will`: registers an already-uploaded payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWillBody {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub content_hash: String,
    #[serde(default)]
    pub beneficiaries: Vec<BeneficiaryInput>,
    pub unlock_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub amount: u64,
}

/// Body of `POST /api/will/seal`: the full create flow from plaintext.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealWillBody {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub beneficiaries: Vec<BeneficiaryInput>,
    #[serde(default)]
    pub amount: u64,
    pub unlock_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payload: String,
    pub secret: Option<String>,
}

/// Body of `POST /api/will/{owner}/reveal`.
#[derive(Debug, Default, Deserialize)]
pub struct RevealBody {
    pub secret: Option<String>,
    /// Base64 payload key as returned by seal.
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxBody {
    pub tx_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SealBody {
    pub tx_id: String,
    pub payload_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteBody {
    pub tx_id: String,
    pub already_executed: bool,
}

/// Revealed plaintext; `encoding` is `utf8` unless the bytes are not text.
#[derive(Debug, Serialize)]
pub struct RevealedBody {
    pub payload: String,
    pub encoding: &'static str,
}

fn required_unlock(value: Option<DateTime<Utc>>) -> Result<DateTime<Utc>, AppError> {
    value.ok_or_else(|| AppError::Validation("unlockTimestamp is required".to_string()))
}

fn beneficiaries(inputs: Vec<BeneficiaryInput>) -> Vec<Beneficiary> {
    inputs.into_iter().map(Beneficiary::from).collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// POST /api/will - Register a will for an uploaded payload.
pub async fn create_will(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateWillBody>,
) -> Result<ApiResponse<TxBody>, AppError> {
    let draft = WillDraft {
        owner: body.owner,
        beneficiaries: beneficiaries(body.beneficiaries),
        amount: body.amount,
        payload_reference: body.content_hash,
        unlock_timestamp: required_unlock(body.unlock_timestamp)?,
    };

    let tx_id = state.will_service.register_will(draft).await?;
    Ok(ApiResponse::created(TxBody { tx_id }))
}

/// POST /api/will/seal - Encrypt, upload and register in one request.
///
/// Without `secret` a fresh key is generated and returned exactly once.
pub async fn seal_will(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SealWillBody>,
) -> Result<ApiResponse<SealBody>, AppError> {
    let key_source = match non_empty(body.secret) {
        Some(secret) => KeySource::Secret(SecretString::from(secret)),
        None => KeySource::Generate,
    };

    let outcome = state
        .will_service
        .seal_will(SealRequest {
            owner: body.owner,
            beneficiaries: beneficiaries(body.beneficiaries),
            amount: body.amount,
            unlock_timestamp: required_unlock(body.unlock_timestamp)?,
            payload: body.payload.into_bytes(),
            key_source,
        })
        .await?;

    Ok(ApiResponse::created(SealBody {
        tx_id: outcome.tx_id,
        payload_reference: outcome.payload_reference,
        generated_key: outcome.generated_key.map(|k| k.to_base64()),
    }))
}

/// GET /api/will/{owner} - The registry record plus derived status.
pub async fn get_will(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<ApiResponse<WillView>, AppError> {
    let view = state.will_service.get_will(owner.trim()).await?;
    Ok(ApiResponse::ok(view))
}

/// POST /api/will/{owner}/execute - Disburse to beneficiaries once unlocked.
pub async fn execute_will(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<ApiResponse<ExecuteBody>, AppError> {
    let outcome = state.will_service.execute_will(owner.trim()).await?;
    let already_executed = matches!(outcome, ExecuteOutcome::AlreadyExecuted { .. });
    Ok(ApiResponse::ok(ExecuteBody {
        tx_id: outcome.tx_id().to_string(),
        already_executed,
    }))
}

/// POST /api/will/{owner}/reveal - Decrypt the payload after unlock.
pub async fn reveal_payload(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    ApiJson(body): ApiJson<RevealBody>,
) -> Result<ApiResponse<RevealedBody>, AppError> {
    let key_source = match (non_empty(body.key), non_empty(body.secret)) {
        (Some(key), _) => KeySource::Key(PayloadKey::from_base64(&key)?),
        (None, Some(secret)) => KeySource::Secret(SecretString::from(secret)),
        (None, None) => KeySource::Generate,
    };

    let plaintext = state
        .will_service
        .reveal_payload(owner.trim(), key_source)
        .await?;

    let body = match String::from_utf8(plaintext) {
        Ok(text) => RevealedBody {
            payload: text,
            encoding: "utf8",
        },
        Err(e) => RevealedBody {
            payload: STANDARD.encode(e.into_bytes()),
            encoding: "base64",
        },
    };
    Ok(ApiResponse::ok(body))
}
