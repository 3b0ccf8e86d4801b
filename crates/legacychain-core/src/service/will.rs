//! Will orchestrator.
//!
//! Composes the cipher, content store, registry, audit log and advisory cache
//! into the create, query, execute and reveal flows. The registry is always
//! consulted before a decision; the cache only mirrors what the registry said.
//!
//! Lifecycle per will: Draft -> Locked (create accepted) -> Unlockable
//! (derived from the clock) -> Executed (execute accepted), with Failed
//! recorded in the cache when the registry loses the record or the payload
//! blob disappears.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use legacychain_types::error::WillError;
use legacychain_types::history::{HistoryEntry, HistoryKind};
use legacychain_types::unlock::UnlockState;
use legacychain_types::will::{Beneficiary, WillDraft, WillRecord, WillStatus};

use crate::clock::Clock;
use crate::ledger::client::LedgerClient;
use crate::ledger::registry::WillRegistry;
use crate::repository::cache::{CachedWill, WillCache};
use crate::repository::history::HistoryLog;
use crate::retry::RetryPolicy;
use crate::service::cipher::{KeySource, PayloadCipher, PayloadKey};
use crate::service::content::ContentStore;
use crate::service::validation;
use crate::unlock::countdown::{self, CountdownHandle};
use crate::unlock::gate;

/// Upper bound on `recent_history` page size.
pub const MAX_HISTORY_LIMIT: u32 = 500;

/// Full create flow input: the plaintext payload is encrypted here.
#[derive(Debug)]
pub struct SealRequest {
    pub owner: String,
    pub beneficiaries: Vec<Beneficiary>,
    pub amount: u64,
    pub unlock_timestamp: DateTime<Utc>,
    pub payload: Vec<u8>,
    pub key_source: KeySource,
}

/// Result of a successful seal.
#[derive(Debug)]
pub struct SealOutcome {
    pub tx_id: String,
    pub payload_reference: String,
    /// Present only when the key was generated; shown to the owner once.
    pub generated_key: Option<PayloadKey>,
}

/// A will as read back from the registry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WillView {
    #[serde(flatten)]
    pub record: WillRecord,
    pub status: WillStatus,
    pub gate: UnlockState,
}

/// Result of an execute request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// This call's transaction executed the will.
    Executed { tx_id: String },
    /// The will had already been executed by `tx_id`.
    AlreadyExecuted { tx_id: String },
}

impl ExecuteOutcome {
    pub fn tx_id(&self) -> &str {
        match self {
            ExecuteOutcome::Executed { tx_id } | ExecuteOutcome::AlreadyExecuted { tx_id } => tx_id,
        }
    }
}

/// Service orchestrating the full will lifecycle.
///
/// Generic over every port so tests can swap in doubles and the binary can
/// pick adapters from configuration.
pub struct WillService<C, S, L, H, W, K>
where
    C: PayloadCipher,
    S: ContentStore,
    L: LedgerClient,
    H: HistoryLog,
    W: WillCache,
    K: Clock,
{
    cipher: C,
    store: S,
    registry: WillRegistry<L>,
    history: H,
    cache: W,
    clock: K,
    retry: RetryPolicy,
}

impl<C, S, L, H, W, K> WillService<C, S, L, H, W, K>
where
    C: PayloadCipher,
    S: ContentStore,
    L: LedgerClient,
    H: HistoryLog,
    W: WillCache,
    K: Clock,
{
    pub fn new(
        cipher: C,
        store: S,
        registry: WillRegistry<L>,
        history: H,
        cache: W,
        clock: K,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            cipher,
            store,
            registry,
            history,
            cache,
            clock,
            retry,
        }
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    pub fn registry(&self) -> &WillRegistry<L> {
        &self.registry
    }

    /// Encrypt, upload and register a will in one go.
    ///
    /// All input checks run before the payload is encrypted, so a rejected
    /// request has no side effects.
    pub async fn seal_will(&self, request: SealRequest) -> Result<SealOutcome, WillError> {
        let now = self.clock.now();
        validation::validate_owner(&request.owner)?;
        validation::validate_beneficiaries(&request.beneficiaries)?;
        validation::validate_amount(request.amount)?;
        validation::validate_unlock_timestamp(request.unlock_timestamp, now)?;
        if request.payload.is_empty() {
            return Err(WillError::Validation("payload is required".to_string()));
        }

        let (key, generated) = match request.key_source {
            KeySource::Generate => {
                let key = self.cipher.generate_key();
                (key.clone(), Some(key))
            }
            source => (self.resolve_key(source, &request.owner)?, None),
        };

        let ciphertext = self.cipher.encrypt(&request.payload, &key)?;
        let payload_reference = self.upload(&ciphertext).await?;
        tracing::debug!(
            owner = %request.owner,
            reference = %payload_reference,
            bytes = ciphertext.len(),
            "payload uploaded"
        );

        let draft = WillDraft {
            owner: request.owner,
            beneficiaries: request.beneficiaries,
            amount: request.amount,
            payload_reference: payload_reference.clone(),
            unlock_timestamp: request.unlock_timestamp,
        };
        let tx_id = self.register_will(draft).await?;

        Ok(SealOutcome {
            tx_id,
            payload_reference,
            generated_key: generated,
        })
    }

    /// Register a will whose payload the client already encrypted and
    /// uploaded.
    ///
    /// If the ledger rejects the create but the registry already holds this
    /// exact will (same beneficiaries, amount, payload reference and unlock
    /// time, not executed), the earlier creation is reported instead of an
    /// error so a retried request converges.
    pub async fn register_will(&self, draft: WillDraft) -> Result<String, WillError> {
        let now = self.clock.now();
        validation::validate_draft(&draft, now)?;

        let tx_id = match self.registry.create_will(&draft, now).await {
            Ok(tx_id) => tx_id,
            Err(WillError::LedgerRejected(reason)) => {
                match self.registry.find_will(&draft.owner).await? {
                    Some(existing) if existing.terms() == draft && !existing.is_executed() => {
                        tracing::info!(
                            owner = %draft.owner,
                            tx_id = %existing.created_tx_id,
                            "will already registered, reusing creation"
                        );
                        existing.created_tx_id
                    }
                    _ => return Err(WillError::LedgerRejected(reason)),
                }
            }
            Err(e) => return Err(e),
        };

        let record = WillRecord::from_draft(&draft, now, tx_id.clone());
        self.append_history(HistoryKind::Create, &record, &tx_id, now)
            .await?;
        self.reconcile(CachedWill::observed(&record, now)).await;

        Ok(tx_id)
    }

    /// Read a will through the registry and reconcile the cache.
    pub async fn get_will(&self, owner: &str) -> Result<WillView, WillError> {
        let now = self.clock.now();
        let record = self.load_record(owner).await?;
        let status = self.reconcile(CachedWill::observed(&record, now)).await;
        let gate = gate::evaluate(now, record.unlock_timestamp);
        Ok(WillView {
            record,
            status,
            gate,
        })
    }

    /// Current unlock verdict for a will, from the registry's timestamp.
    pub async fn unlock_state(&self, owner: &str) -> Result<UnlockState, WillError> {
        let record = self.load_record(owner).await?;
        Ok(gate::evaluate(self.clock.now(), record.unlock_timestamp))
    }

    /// Execute a will once its unlock time has passed.
    ///
    /// Eligibility comes from the registry's stored unlock timestamp. A will
    /// that is already executed returns the existing transaction id; a
    /// duplicate rejected by the ledger is resolved by re-reading the
    /// registry, so concurrent callers all observe one executed tx id.
    pub async fn execute_will(&self, owner: &str) -> Result<ExecuteOutcome, WillError> {
        let now = self.clock.now();
        let record = self.load_record(owner).await?;

        if let Some(tx_id) = record.executed_tx_id.clone() {
            tracing::debug!(owner = %owner, tx_id = %tx_id, "will already executed");
            self.append_history(HistoryKind::Execute, &record, &tx_id, now)
                .await?;
            self.reconcile(CachedWill::observed(&record, now)).await;
            return Ok(ExecuteOutcome::AlreadyExecuted { tx_id });
        }

        if let UnlockState::Locked { remaining } = gate::evaluate(now, record.unlock_timestamp) {
            self.reconcile(CachedWill::observed(&record, now)).await;
            return Err(WillError::NotYetUnlockable { remaining });
        }

        let (outcome, executed) = match self.registry.execute_will(owner).await {
            Ok(tx_id) => {
                let mut executed = record;
                executed.executed_tx_id = Some(tx_id.clone());
                (ExecuteOutcome::Executed { tx_id }, executed)
            }
            Err(WillError::LedgerRejected(reason)) => match self.registry.find_will(owner).await? {
                Some(current) => match current.executed_tx_id.clone() {
                    Some(tx_id) => {
                        tracing::info!(
                            owner = %owner,
                            tx_id = %tx_id,
                            "execution raced with another caller"
                        );
                        (ExecuteOutcome::AlreadyExecuted { tx_id }, current)
                    }
                    None => return Err(WillError::LedgerRejected(reason)),
                },
                None => return Err(WillError::LedgerRejected(reason)),
            },
            Err(e) => return Err(e),
        };

        self.append_history(HistoryKind::Execute, &executed, outcome.tx_id(), now)
            .await?;
        self.reconcile(CachedWill::observed(&executed, now)).await;
        Ok(outcome)
    }

    /// Fetch and decrypt a will's payload once it is unlockable.
    ///
    /// A wrong key surfaces as `DecryptionFailed`, distinct from
    /// `NotYetUnlockable`.
    pub async fn reveal_payload(
        &self,
        owner: &str,
        key_source: KeySource,
    ) -> Result<Vec<u8>, WillError> {
        let now = self.clock.now();
        let record = self.load_record(owner).await?;

        if let UnlockState::Locked { remaining } = gate::evaluate(now, record.unlock_timestamp) {
            return Err(WillError::NotYetUnlockable { remaining });
        }

        let key = self.resolve_key(key_source, owner)?;
        let ciphertext = match self.fetch(&record.payload_reference).await {
            Ok(bytes) => bytes,
            Err(e @ WillError::NotFound(_)) => {
                tracing::error!(
                    owner = %owner,
                    reference = %record.payload_reference,
                    "payload blob is missing"
                );
                self.reconcile(CachedWill::observed(&record, now).failed("payload blob missing", now))
                    .await;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let plaintext = self.cipher.decrypt(&ciphertext, &key).inspect_err(|_| {
            tracing::warn!(owner = %owner, "payload decryption failed");
        })?;
        tracing::info!(owner = %owner, "payload revealed");
        Ok(plaintext)
    }

    /// Audit entries for one will, oldest first.
    pub async fn history(&self, owner: &str) -> Result<Vec<HistoryEntry>, WillError> {
        validation::validate_owner(owner)?;
        Ok(self.history.list_for_will(owner).await?)
    }

    /// Most recent audit entries across all wills.
    pub async fn recent_history(&self, limit: u32) -> Result<Vec<HistoryEntry>, WillError> {
        if limit == 0 {
            return Err(WillError::Validation("limit must be positive".to_string()));
        }
        Ok(self
            .history
            .list_recent(limit.min(MAX_HISTORY_LIMIT))
            .await?)
    }

    /// Start a countdown task for a will, keyed on the registry's unlock time.
    pub async fn watch_unlock(
        &self,
        owner: &str,
        interval: std::time::Duration,
        parent: &CancellationToken,
    ) -> Result<CountdownHandle, WillError>
    where
        K: Clone,
    {
        let record = self.load_record(owner).await?;
        Ok(countdown::spawn_countdown(
            record.unlock_timestamp,
            self.clock.clone(),
            interval,
            parent,
        ))
    }

    /// Authoritative record for `owner`. A will the cache knows about but
    /// the registry does not is marked failed.
    async fn load_record(&self, owner: &str) -> Result<WillRecord, WillError> {
        match self.registry.find_will(owner).await? {
            Some(record) => Ok(record),
            None => {
                self.mark_missing(owner).await;
                Err(WillError::NotFound(format!("no will registered for {owner}")))
            }
        }
    }

    fn resolve_key(&self, source: KeySource, owner: &str) -> Result<PayloadKey, WillError> {
        match source {
            KeySource::Key(key) => Ok(key),
            KeySource::Secret(secret) => Ok(self.cipher.derive_key(&secret, owner)?),
            KeySource::Generate => Err(WillError::Validation(
                "a key or secret is required".to_string(),
            )),
        }
    }

    async fn upload(&self, ciphertext: &[u8]) -> Result<String, WillError> {
        let store = &self.store;
        self.retry
            .run("content.upload", move || store.upload(ciphertext))
            .await
    }

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, WillError> {
        let store = &self.store;
        self.retry
            .run("content.fetch", move || store.fetch(reference))
            .await
    }

    async fn append_history(
        &self,
        kind: HistoryKind,
        record: &WillRecord,
        tx_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), WillError> {
        let entry = HistoryEntry::new(
            record.owner.clone(),
            kind,
            tx_id,
            now,
            record.amount,
            record.recipients(),
        );
        match self.history.append(&entry).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::debug!(owner = %record.owner, tx_id = %tx_id, %kind, "history entry already recorded");
                Ok(())
            }
            Err(e) => {
                tracing::error!(owner = %record.owner, tx_id = %tx_id, %kind, "failed to append history: {e}");
                Err(e.into())
            }
        }
    }

    /// Merge an observation into the cache and return the effective status.
    ///
    /// Cache failures are logged and otherwise ignored.
    async fn reconcile(&self, next: CachedWill) -> WillStatus {
        let observed = next.status;
        let merged = match self.cache.get(&next.will_id).await {
            Ok(Some(current)) => match current.merge(next) {
                Some(merged) => merged,
                None => return current.status,
            },
            Ok(None) => next,
            Err(e) => {
                tracing::warn!(will_id = %next.will_id, "will cache read failed: {e}");
                return observed;
            }
        };

        if let Err(e) = self.cache.upsert(&merged).await {
            tracing::warn!(will_id = %merged.will_id, "will cache write failed: {e}");
        }
        merged.status
    }

    async fn mark_missing(&self, owner: &str) {
        match self.cache.get(owner).await {
            Ok(Some(current)) if !current.status.is_terminal() => {
                tracing::warn!(will_id = %owner, "registry has no record for cached will");
                let failed = current.clone().failed("registry has no record", self.clock.now());
                if let Err(e) = self.cache.upsert(&failed).await {
                    tracing::warn!(will_id = %owner, "will cache write failed: {e}");
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(will_id = %owner, "will cache read failed: {e}"),
        }
    }
}
