//! # Relayer Service
//!
//! Drives each fully approved asset through the relay phases and runs the
//! subscription loop that discovers them.
//!
//! Each asset is processed by at most one task at a time: a task is only
//! started by the `Idle -> Notified` or `Failed -> Notified` edge, and it
//! runs until the asset reaches a terminal phase or shutdown interrupts it.
//! An interrupted asset keeps its non-terminal phase; since only
//! `Confirmed` records survive a restart, it is rediscovered by the
//! startup scan. Restored `Confirmed` records are themselves checked
//! against the gate before they are believed.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use amb_core::{AssetId, Timestamp};
use amb_mint::MintError;
use amb_zkp::{ApprovalProof, ProofError, ProofService, PublicInputs, WitnessSource};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::config::RelayerConfig;
use crate::error::RelayerError;
use crate::health::{HealthReport, HealthTracker, Link};
use crate::persist::{PersistedState, StateFile};
use crate::ports::{ApprovalFeed, MintTarget};
use crate::shutdown::ShutdownSignal;
use crate::state::{FailureReason, RelayPhase, RelayRecord};

/// Counters since process start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelayerStats {
    /// Registry event sequence processed up to.
    pub registry_cursor: u64,
    /// Proofs generated successfully.
    pub proofs_generated: u64,
    /// Proof attempts that failed.
    pub proof_failures: u64,
    /// Mint submissions sent.
    pub submissions: u64,
    /// Assets tracked.
    pub tracked: usize,
    /// Assets confirmed.
    pub confirmed: usize,
    /// Assets failed.
    pub failed: usize,
}

/// Read and control surface used by the HTTP API.
pub trait RelayerView: Send + Sync {
    /// Record for `asset_id`, if tracked.
    fn status(&self, asset_id: AssetId) -> Option<RelayRecord>;
    /// Every tracked record, ascending by asset.
    fn list(&self) -> Vec<RelayRecord>;
    /// Link and phase summary.
    fn health(&self) -> HealthReport;
    /// Counters.
    fn stats(&self) -> RelayerStats;
    /// Move a failed asset back to `Notified` and queue it.
    fn request_retry(&self, asset_id: AssetId) -> Result<RelayRecord, RelayerError>;
}

#[derive(Debug, Default)]
struct Counters {
    proofs_generated: AtomicU64,
    proof_failures: AtomicU64,
    submissions: AtomicU64,
}

/// The relayer.
pub struct RelayerService<F, M> {
    config: RelayerConfig,
    feed: F,
    mint: M,
    prover: Arc<dyn ProofService>,
    witnesses: Arc<dyn WitnessSource>,
    relays: DashMap<AssetId, RelayRecord>,
    cursor: AtomicU64,
    state_file: Option<StateFile>,
    persist_lock: Mutex<()>,
    health: HealthTracker,
    shutdown: ShutdownSignal,
    proof_slots: Semaphore,
    requeue_tx: mpsc::UnboundedSender<AssetId>,
    requeue_rx: Mutex<Option<mpsc::UnboundedReceiver<AssetId>>>,
    counters: Counters,
}

impl<F, M> std::fmt::Debug for RelayerService<F, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayerService")
            .field("circuit_id", &self.prover.circuit_id())
            .field("tracked", &self.relays.len())
            .field("cursor", &self.cursor.load(Ordering::SeqCst))
            .field("state_file", &self.state_file.as_ref().map(StateFile::path))
            .finish()
    }
}

impl<F: ApprovalFeed, M: MintTarget> RelayerService<F, M> {
    /// Build a relayer. Loads persisted state from `config.state_path`,
    /// keeping only confirmed records. An unreadable state file is logged
    /// and the relayer starts empty.
    pub fn new(
        config: RelayerConfig,
        feed: F,
        mint: M,
        prover: Arc<dyn ProofService>,
        witnesses: Arc<dyn WitnessSource>,
        shutdown: ShutdownSignal,
    ) -> Result<Self, RelayerError> {
        config.validate()?;

        let state_file = config.state_path.as_ref().map(StateFile::new);
        let restored = match &state_file {
            Some(file) => match file.load() {
                Ok(state) => state.trusted(),
                Err(e) => {
                    metrics::counter!("amb_relayer_persist_errors_total").increment(1);
                    tracing::warn!(error = %e, "relayer state unreadable; starting empty");
                    PersistedState::default()
                }
            },
            None => PersistedState::default(),
        };
        if state_file.is_some() {
            tracing::info!(
                confirmed = restored.assets.len(),
                cursor = restored.registry_cursor,
                "relayer state restored"
            );
        }

        let (requeue_tx, requeue_rx) = mpsc::unbounded_channel();
        let health = HealthTracker::new(std::time::Duration::from_secs(config.health_staleness_secs));
        Ok(Self {
            proof_slots: Semaphore::new(config.max_concurrent_proofs),
            config,
            feed,
            mint,
            prover,
            witnesses,
            relays: restored.assets.into_iter().collect(),
            cursor: AtomicU64::new(restored.registry_cursor),
            state_file,
            persist_lock: Mutex::new(()),
            health,
            shutdown,
            requeue_tx,
            requeue_rx: Mutex::new(Some(requeue_rx)),
            counters: Counters::default(),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &RelayerConfig {
        &self.config
    }

    /// Registry event sequence processed up to.
    pub fn cursor(&self) -> u64 {
        self.cursor.load(Ordering::SeqCst)
    }

    // ── Notifications ────────────────────────────────────────────────

    /// Record a full-approval notification for `asset_id`.
    ///
    /// Returns `true` if the asset moved `Idle -> Notified` and now needs
    /// processing. Any later notification for the same asset is a no-op
    /// returning `false`.
    pub fn on_fully_approved(&self, asset_id: AssetId, source_seq: Option<u64>) -> bool {
        let accepted = {
            let mut record = self
                .relays
                .entry(asset_id)
                .or_insert_with(|| RelayRecord::new(asset_id));
            if record.phase != RelayPhase::Idle {
                false
            } else {
                record.source_seq = source_seq;
                record.transition(RelayPhase::Notified).is_ok()
            }
        };
        if accepted {
            metrics::counter!("amb_relayer_notifications_total").increment(1);
            tracing::info!(%asset_id, seq = ?source_seq, "full approval observed");
            self.persist();
        } else {
            tracing::debug!(%asset_id, "duplicate full-approval notification ignored");
        }
        accepted
    }

    /// Scan the registry for aggregated assets this relayer does not have
    /// confirmed, and mark each either confirmed (already minted) or
    /// notified. Returns the assets that need processing.
    ///
    /// Restored state is reconciled first: a `Confirmed` record the gate
    /// does not report as minted is dropped, and a cursor past the
    /// registry head is reset to zero.
    pub async fn recover(&self) -> Result<Vec<AssetId>, RelayerError> {
        self.reconcile_restored().await?;
        let aggregated = self
            .observe(Link::Permissioned, self.feed.aggregated_assets())
            .await?;
        let mut pending = Vec::new();
        for asset_id in aggregated {
            if self.relays.contains_key(&asset_id) {
                continue;
            }
            if !self.on_fully_approved(asset_id, None) {
                continue;
            }
            match self.check_minted(asset_id).await {
                Ok(true) => {
                    tracing::info!(%asset_id, "already minted; marking confirmed");
                    self.advance(asset_id, RelayPhase::Confirmed)?;
                }
                Ok(false) => pending.push(asset_id),
                Err(RelayerError::ShuttingDown) => return Err(RelayerError::ShuttingDown),
                Err(e) => {
                    tracing::warn!(%asset_id, error = %e, "mint status unknown; will process");
                    pending.push(asset_id);
                }
            }
        }
        tracing::info!(pending = pending.len(), "startup scan complete");
        Ok(pending)
    }

    async fn reconcile_restored(&self) -> Result<(), RelayerError> {
        let mut changed = false;
        match self.observe(Link::Permissioned, self.feed.event_head()).await {
            Ok(head) => {
                let cursor = self.cursor();
                if cursor > head {
                    tracing::warn!(cursor, head, "cursor is past the registry head; rescanning from the start");
                    self.cursor.store(0, Ordering::SeqCst);
                    changed = true;
                }
            }
            Err(RelayerError::ShuttingDown) => return Err(RelayerError::ShuttingDown),
            Err(e) => tracing::warn!(error = %e, "registry head unknown; keeping cursor"),
        }

        let confirmed: Vec<AssetId> = self
            .relays
            .iter()
            .filter(|r| r.phase == RelayPhase::Confirmed)
            .map(|r| r.asset_id)
            .collect();
        for asset_id in confirmed {
            let reason = match self.check_minted(asset_id).await {
                Ok(true) => continue,
                Ok(false) => "not minted on the gate".to_string(),
                Err(RelayerError::ShuttingDown) => return Err(RelayerError::ShuttingDown),
                Err(e) => e.to_string(),
            };
            if self
                .relays
                .remove_if(&asset_id, |_, r| r.phase == RelayPhase::Confirmed)
                .is_some()
            {
                metrics::counter!("amb_relayer_stale_records_total").increment(1);
                tracing::warn!(%asset_id, %reason, "dropping unverified confirmed record");
                changed = true;
            }
        }
        if changed {
            self.persist();
        }
        Ok(())
    }

    /// Move a `Failed` asset back to `Notified` and queue it for the
    /// running loop.
    pub fn retry(&self, asset_id: AssetId) -> Result<RelayRecord, RelayerError> {
        let record = {
            let mut record = self
                .relays
                .get_mut(&asset_id)
                .ok_or(RelayerError::UnknownAsset(asset_id))?;
            if record.failure().is_none() {
                return Err(RelayerError::NotAllowed {
                    asset_id,
                    phase: record.phase.to_string(),
                    action: "retry",
                });
            }
            record.transition(RelayPhase::Notified)?;
            record.clone()
        };
        tracing::info!(%asset_id, "operator retry requested");
        metrics::counter!("amb_relayer_retries_total").increment(1);
        self.persist();
        // The receiver lives as long as the service.
        let _ = self.requeue_tx.send(asset_id);
        Ok(record)
    }

    // ── Saga ─────────────────────────────────────────────────────────

    /// Drive a `Notified` asset to a terminal phase.
    ///
    /// Returns the phase the asset stopped in. Assets not in `Notified`
    /// are left alone and their current phase is returned.
    pub async fn process_asset(&self, asset_id: AssetId) -> Result<RelayPhase, RelayerError> {
        let phase = self
            .relays
            .get(&asset_id)
            .map(|r| r.phase.clone())
            .ok_or(RelayerError::UnknownAsset(asset_id))?;
        if phase != RelayPhase::Notified {
            return Ok(phase);
        }

        // Another relayer may have finished the job.
        match self.check_minted(asset_id).await {
            Ok(true) => return self.confirm(asset_id),
            Ok(false) => {}
            Err(RelayerError::ShuttingDown) => return Err(RelayerError::ShuttingDown),
            Err(e) => tracing::warn!(%asset_id, error = %e, "pre-check failed; proceeding"),
        }

        self.advance(asset_id, RelayPhase::Proving)?;
        let proof = match self.prove(asset_id).await {
            Ok(proof) => proof,
            Err(RelayerError::ShuttingDown) => return Err(RelayerError::ShuttingDown),
            Err(e) => {
                return self.fail(
                    asset_id,
                    FailureReason::ProofGenerationFailed {
                        detail: e.to_string(),
                    },
                )
            }
        };
        let public_inputs = PublicInputs::for_asset(asset_id);

        match self.prover.verify_locally(&proof, &public_inputs) {
            Ok(true) => {}
            Ok(false) => {
                return self.fail(
                    asset_id,
                    FailureReason::LocalVerificationFailed {
                        detail: "proof does not verify against its public inputs".to_string(),
                    },
                )
            }
            Err(e) => {
                return self.fail(
                    asset_id,
                    FailureReason::LocalVerificationFailed {
                        detail: e.to_string(),
                    },
                )
            }
        }
        self.update(asset_id, |r| r.proof_fingerprint = Some(proof.fingerprint()));

        self.advance(asset_id, RelayPhase::Submitting)?;
        match self.check_minted(asset_id).await {
            Ok(true) => return self.confirm(asset_id),
            Ok(false) => {}
            Err(RelayerError::ShuttingDown) => return Err(RelayerError::ShuttingDown),
            Err(e) => tracing::warn!(%asset_id, error = %e, "pre-submit check failed; submitting"),
        }

        match self.submit(asset_id, &proof, &public_inputs).await {
            Submission::Accepted { block } => {
                self.update(asset_id, |r| r.mint_block = Some(block));
                self.advance(asset_id, RelayPhase::Confirming)?;
            }
            Submission::AlreadyMinted => return self.confirm(asset_id),
            Submission::Rejected(reason) => return self.fail(asset_id, reason),
            Submission::Interrupted => return Err(RelayerError::ShuttingDown),
        }

        self.await_confirmation(asset_id).await
    }

    async fn prove(&self, asset_id: AssetId) -> Result<ApprovalProof, RelayerError> {
        let policy = self.config.proving_retry.clone();
        let mut attempt = 1;
        loop {
            self.update(asset_id, |r| r.proving_attempts += 1);
            let result = self.prove_once(asset_id).await;
            match result {
                Ok(proof) => {
                    self.counters.proofs_generated.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!("amb_relayer_proofs_total", "outcome" => "ok").increment(1);
                    tracing::info!(
                        %asset_id,
                        attempt,
                        fingerprint = %proof.fingerprint().short_hex(),
                        "proof generated"
                    );
                    return Ok(proof);
                }
                Err(RelayerError::ShuttingDown) => return Err(RelayerError::ShuttingDown),
                Err(e) => {
                    self.counters.proof_failures.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!("amb_relayer_proofs_total", "outcome" => "error").increment(1);
                    let unsatisfiable = matches!(e, RelayerError::Proof(ProofError::WitnessUnsatisfied { .. }));
                    if unsatisfiable || attempt >= policy.attempts() {
                        tracing::error!(%asset_id, attempt, error = %e, "proof generation gave up");
                        return Err(e);
                    }
                    let delay = policy.delay_after(attempt);
                    tracing::warn!(%asset_id, attempt, ?delay, error = %e, "proof generation failed; retrying");
                    self.update(asset_id, |r| r.last_error = Some(e.to_string()));
                    if !self.shutdown.sleep(delay).await {
                        return Err(RelayerError::ShuttingDown);
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn prove_once(&self, asset_id: AssetId) -> Result<ApprovalProof, RelayerError> {
        let _permit = self
            .shutdown
            .guard(self.proof_slots.acquire())
            .await
            .ok_or(RelayerError::ShuttingDown)?
            .map_err(|_| RelayerError::ShuttingDown)?;

        let prover = Arc::clone(&self.prover);
        let witnesses = Arc::clone(&self.witnesses);
        let task = tokio::task::spawn_blocking(move || {
            let witness = witnesses
                .witness_for(asset_id)
                .map_err(|e| e.into_proof_error(asset_id))?;
            prover.prove(&witness)
        });
        match self.shutdown.guard(task).await {
            None => Err(RelayerError::ShuttingDown),
            Some(Ok(result)) => Ok(result?),
            Some(Err(join)) => Err(RelayerError::TaskAborted {
                asset_id,
                reason: join.to_string(),
            }),
        }
    }

    async fn submit(
        &self,
        asset_id: AssetId,
        proof: &ApprovalProof,
        public_inputs: &PublicInputs,
    ) -> Submission {
        let policy = self.config.submission_retry.clone();
        let recipient = self.config.recipient;
        let mut attempt = 1;
        loop {
            self.update(asset_id, |r| r.submission_attempts += 1);
            self.counters.submissions.fetch_add(1, Ordering::Relaxed);
            let result = self
                .observe(
                    Link::Public,
                    self.mint.submit_mint(asset_id, proof, public_inputs, recipient),
                )
                .await;
            let error = match result {
                Ok(receipt) => {
                    metrics::counter!("amb_relayer_submissions_total", "outcome" => "accepted").increment(1);
                    tracing::info!(%asset_id, %recipient, block = receipt.receipt.block_height, "mint accepted");
                    return Submission::Accepted {
                        block: receipt.receipt.block_height,
                    };
                }
                Err(e) => e,
            };
            match error {
                RelayerError::ShuttingDown => return Submission::Interrupted,
                RelayerError::Mint(MintError::AlreadyMinted(_)) => {
                    metrics::counter!("amb_relayer_submissions_total", "outcome" => "already_minted").increment(1);
                    tracing::info!(%asset_id, "asset already minted; treating as success");
                    return Submission::AlreadyMinted;
                }
                RelayerError::Mint(e @ MintError::PublicInputMismatch { .. }) => {
                    metrics::counter!("amb_relayer_submissions_total", "outcome" => "rejected").increment(1);
                    return Submission::Rejected(FailureReason::PublicInputMismatch {
                        detail: e.to_string(),
                    });
                }
                RelayerError::Mint(e @ (MintError::InvalidProof { .. } | MintError::MalformedProof { .. })) => {
                    metrics::counter!("amb_relayer_submissions_total", "outcome" => "rejected").increment(1);
                    return Submission::Rejected(FailureReason::InvalidProof {
                        detail: e.to_string(),
                    });
                }
                e if e.is_transient() && attempt < policy.attempts() => {
                    let delay = policy.delay_after(attempt);
                    tracing::warn!(%asset_id, attempt, ?delay, error = %e, "submission failed; retrying");
                    self.update(asset_id, |r| r.last_error = Some(e.to_string()));
                    if !self.shutdown.sleep(delay).await {
                        return Submission::Interrupted;
                    }
                    attempt += 1;
                }
                e => {
                    metrics::counter!("amb_relayer_submissions_total", "outcome" => "error").increment(1);
                    return Submission::Rejected(FailureReason::SubmissionFailed {
                        detail: e.to_string(),
                    });
                }
            }
        }
    }

    async fn await_confirmation(&self, asset_id: AssetId) -> Result<RelayPhase, RelayerError> {
        let deadline = tokio::time::Instant::now() + self.config.confirmation_timeout();
        loop {
            match self.observe(Link::Public, self.mint.is_minted(asset_id)).await {
                Ok(true) => return self.confirm(asset_id),
                Ok(false) => {}
                Err(RelayerError::ShuttingDown) => return Err(RelayerError::ShuttingDown),
                Err(e) => tracing::debug!(%asset_id, error = %e, "confirmation poll failed"),
            }
            if tokio::time::Instant::now() >= deadline {
                return self.fail(asset_id, FailureReason::MintNotObserved);
            }
            if !self.shutdown.sleep(self.config.poll_interval()).await {
                return Err(RelayerError::ShuttingDown);
            }
        }
    }

    // ── Subscription loop ───────────────────────────────────────────

    /// Run until shutdown: recover, then follow the registry feed and the
    /// retry queue, processing assets concurrently.
    pub async fn run(self: Arc<Self>) -> Result<(), RelayerError> {
        let mut requeue = self.requeue_rx.lock().take().ok_or(RelayerError::AlreadyRunning)?;
        tracing::info!(
            circuit = self.prover.circuit_id(),
            recipient = %self.config.recipient,
            cursor = self.cursor(),
            "relayer starting"
        );

        let mut tasks = JoinSet::new();
        let mut last_link_check: Option<tokio::time::Instant> = None;
        match self.recover().await {
            Ok(pending) => {
                for asset_id in pending {
                    self.spawn(&mut tasks, asset_id);
                }
            }
            Err(RelayerError::ShuttingDown) => {}
            Err(e) => tracing::warn!(error = %e, "startup scan failed; relying on the feed"),
        }

        while !self.shutdown.is_triggered() {
            if last_link_check.map_or(true, |at| at.elapsed() >= self.config.poll_interval()) {
                self.check_public_link().await;
                last_link_check = Some(tokio::time::Instant::now());
            }

            let cursor = self.cursor();
            let batch = self
                .observe(
                    Link::Permissioned,
                    self.feed.fully_approved_since(cursor, self.config.subscription_batch),
                )
                .await;
            match batch {
                Ok(batch) => {
                    for (seq, asset_id) in batch.approved {
                        if self.on_fully_approved(asset_id, Some(seq)) {
                            self.spawn(&mut tasks, asset_id);
                        }
                    }
                    if batch.cursor != cursor {
                        self.cursor.store(batch.cursor, Ordering::SeqCst);
                        self.persist();
                        // More may be waiting beyond this page.
                        continue;
                    }
                }
                Err(RelayerError::ShuttingDown) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "feed poll failed");
                    if !self.shutdown.sleep(self.config.poll_interval()).await {
                        break;
                    }
                    continue;
                }
            }

            let cursor = self.cursor();
            tokio::select! {
                biased;
                _ = self.shutdown.triggered() => break,
                Some(asset_id) = requeue.recv() => self.spawn(&mut tasks, asset_id),
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => log_join(joined),
                _ = self.feed.wait_for_events(cursor) => {}
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
            }
        }

        tracing::info!(in_flight = tasks.len(), "relayer draining");
        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }
        self.persist();
        tracing::info!("relayer stopped");
        Ok(())
    }

    fn spawn(self: &Arc<Self>, tasks: &mut JoinSet<(AssetId, Result<RelayPhase, RelayerError>)>, asset_id: AssetId) {
        let service = Arc::clone(self);
        tasks.spawn(async move { (asset_id, service.process_asset(asset_id).await) });
    }

    // ── Helpers ──────────────────────────────────────────────────────

    /// Touch the public ledger so link health stays current while idle.
    async fn check_public_link(&self) {
        match self.observe(Link::Public, self.mint.event_head()).await {
            Ok(head) => tracing::trace!(head, "public ledger reachable"),
            Err(RelayerError::ShuttingDown) => {}
            Err(e) => tracing::debug!(error = %e, "public ledger check failed"),
        }
    }

    async fn check_minted(&self, asset_id: AssetId) -> Result<bool, RelayerError> {
        let policy = &self.config.submission_retry;
        let mut attempt = 1;
        loop {
            match self.observe(Link::Public, self.mint.is_minted(asset_id)).await {
                Ok(minted) => return Ok(minted),
                Err(e) if e.is_transient() && attempt < policy.attempts() => {
                    if !self.shutdown.sleep(policy.delay_after(attempt)).await {
                        return Err(RelayerError::ShuttingDown);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Await `fut` unless shutdown intervenes, recording link health.
    async fn observe<T>(
        &self,
        link: Link,
        fut: impl Future<Output = Result<T, RelayerError>>,
    ) -> Result<T, RelayerError> {
        let result = self
            .shutdown
            .guard(fut)
            .await
            .unwrap_or(Err(RelayerError::ShuttingDown));
        match &result {
            Err(RelayerError::ShuttingDown) => {}
            Err(e) if e.is_transient() => self.health.record_error(link, e),
            // A rejection still proves the ledger answered.
            Ok(_) | Err(_) => self.health.record_ok(link),
        }
        result
    }

    fn advance(&self, asset_id: AssetId, to: RelayPhase) -> Result<(), RelayerError> {
        {
            let mut record = self
                .relays
                .get_mut(&asset_id)
                .ok_or(RelayerError::UnknownAsset(asset_id))?;
            let from = record.phase.as_str();
            record.transition(to.clone())?;
            tracing::debug!(%asset_id, from, to = %to, "relay phase changed");
        }
        metrics::counter!("amb_relayer_transitions_total", "to" => to.as_str()).increment(1);
        self.persist();
        Ok(())
    }

    fn update(&self, asset_id: AssetId, f: impl FnOnce(&mut RelayRecord)) {
        if let Some(mut record) = self.relays.get_mut(&asset_id) {
            f(&mut record);
            record.updated_at = Timestamp::now();
        }
    }

    fn confirm(&self, asset_id: AssetId) -> Result<RelayPhase, RelayerError> {
        self.advance(asset_id, RelayPhase::Confirmed)?;
        tracing::info!(%asset_id, "relay confirmed");
        Ok(RelayPhase::Confirmed)
    }

    fn fail(&self, asset_id: AssetId, reason: FailureReason) -> Result<RelayPhase, RelayerError> {
        metrics::counter!("amb_relayer_failed_total", "reason" => reason.as_str()).increment(1);
        tracing::error!(%asset_id, reason = %reason, "relay failed");
        let phase = RelayPhase::Failed { reason };
        self.advance(asset_id, phase.clone())?;
        Ok(phase)
    }

    fn snapshot(&self) -> PersistedState {
        PersistedState {
            registry_cursor: self.cursor(),
            assets: self
                .relays
                .iter()
                .map(|entry| (*entry.key(), entry.value().clone()))
                .collect(),
        }
    }

    fn persist(&self) {
        let Some(file) = &self.state_file else {
            return;
        };
        let _guard = self.persist_lock.lock();
        if let Err(e) = file.save(&self.snapshot()) {
            metrics::counter!("amb_relayer_persist_errors_total").increment(1);
            tracing::warn!(error = %e, "relayer state not saved");
        }
    }

    fn counts(&self) -> (usize, usize, usize) {
        let (mut in_flight, mut failed, mut confirmed) = (0, 0, 0);
        for entry in self.relays.iter() {
            match entry.phase {
                RelayPhase::Confirmed => confirmed += 1,
                RelayPhase::Failed { .. } => failed += 1,
                ref p if p.is_in_flight() => in_flight += 1,
                _ => {}
            }
        }
        (in_flight, failed, confirmed)
    }
}

impl<F: ApprovalFeed, M: MintTarget> RelayerView for RelayerService<F, M> {
    fn status(&self, asset_id: AssetId) -> Option<RelayRecord> {
        self.relays.get(&asset_id).map(|r| r.clone())
    }

    fn list(&self) -> Vec<RelayRecord> {
        let mut records: Vec<RelayRecord> = self.relays.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|r| r.asset_id);
        records
    }

    fn health(&self) -> HealthReport {
        let (in_flight, failed, confirmed) = self.counts();
        self.health.report(in_flight, failed, confirmed)
    }

    fn stats(&self) -> RelayerStats {
        let (_, failed, confirmed) = self.counts();
        RelayerStats {
            registry_cursor: self.cursor(),
            proofs_generated: self.counters.proofs_generated.load(Ordering::Relaxed),
            proof_failures: self.counters.proof_failures.load(Ordering::Relaxed),
            submissions: self.counters.submissions.load(Ordering::Relaxed),
            tracked: self.relays.len(),
            confirmed,
            failed,
        }
    }

    fn request_retry(&self, asset_id: AssetId) -> Result<RelayRecord, RelayerError> {
        self.retry(asset_id)
    }
}

enum Submission {
    Accepted { block: u64 },
    AlreadyMinted,
    Rejected(FailureReason),
    Interrupted,
}

fn log_join(joined: Result<(AssetId, Result<RelayPhase, RelayerError>), tokio::task::JoinError>) {
    match joined {
        Ok((asset_id, Ok(phase))) => tracing::debug!(%asset_id, %phase, "relay task finished"),
        Ok((asset_id, Err(RelayerError::ShuttingDown))) => {
            tracing::info!(%asset_id, "relay task interrupted by shutdown")
        }
        Ok((asset_id, Err(e))) => tracing::error!(%asset_id, error = %e, "relay task errored"),
        Err(e) => tracing::error!(error = %e, "relay task panicked"),
    }
}
