//! # MintGate

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use amb_core::{Address, AssetId, ContentDigest};
use amb_ledger::{BlockClock, EventLog, LedgerEvent, LedgerStore, TxReceipt};
use amb_zkp::{ApprovalProof, PublicInputs, Verifier, VerifyError};
use serde::{Deserialize, Serialize};

use crate::error::MintError;

/// Per-asset mint state. Absence reads as not minted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRecord {
    /// Whether the asset has been minted. Never reverts.
    pub minted: bool,
    /// Owner once minted.
    pub owner: Option<Address>,
    /// Fingerprint of the accepted proof.
    pub proof_fingerprint: Option<ContentDigest>,
    /// Block of the minting transaction.
    pub minted_at_block: Option<u64>,
}

/// Mint gate notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MintEvent {
    /// An asset was minted.
    Minted {
        /// Minted asset.
        asset_id: AssetId,
        /// New owner.
        recipient: Address,
        /// Fingerprint of the accepted proof.
        proof_fingerprint: ContentDigest,
    },
}

/// Result of a successful mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    /// Minted asset.
    pub asset_id: AssetId,
    /// New owner.
    pub recipient: Address,
    /// Fingerprint of the accepted proof.
    pub proof_fingerprint: ContentDigest,
    /// Inclusion receipt.
    pub receipt: TxReceipt,
}

/// The mint gate on the public ledger.
pub struct MintGate {
    verifier: Arc<dyn Verifier>,
    records: LedgerStore<AssetId, MintRecord>,
    events: EventLog<MintEvent>,
    clock: Arc<BlockClock>,
    total_minted: AtomicU64,
}

impl std::fmt::Debug for MintGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MintGate")
            .field("verifier", &self.verifier.circuit_id())
            .field("total_minted", &self.total_minted())
            .field("block_height", &self.clock.height())
            .finish()
    }
}

impl MintGate {
    /// Deploy a gate with an embedded verifier.
    pub fn new(verifier: Arc<dyn Verifier>) -> Self {
        Self::with_clock(verifier, Arc::new(BlockClock::new()))
    }

    /// Deploy onto a ledger whose block clock is shared.
    pub fn with_clock(verifier: Arc<dyn Verifier>, clock: Arc<BlockClock>) -> Self {
        tracing::info!(circuit = verifier.circuit_id(), "mint gate deployed");
        Self {
            verifier,
            records: LedgerStore::new(),
            events: EventLog::new(),
            clock,
            total_minted: AtomicU64::new(0),
        }
    }

    /// Verify `proof` for `asset_id` and mint it to `recipient`.
    pub fn mint_with_proof(
        &self,
        asset_id: AssetId,
        proof: &ApprovalProof,
        public_inputs: &PublicInputs,
        recipient: Address,
    ) -> Result<MintReceipt, MintError> {
        let result = self.records.transact(asset_id, |record| {
            if record.minted {
                return Err(MintError::AlreadyMinted(asset_id));
            }

            let bound = public_inputs.asset_id();
            if bound != Some(asset_id) {
                return Err(MintError::PublicInputMismatch {
                    asset_id,
                    found: bound,
                });
            }

            match self.verifier.verify(proof, public_inputs) {
                Ok(true) => {}
                Ok(false) => {
                    return Err(MintError::InvalidProof {
                        asset_id,
                        reason: "verifier rejected proof".to_string(),
                    })
                }
                Err(VerifyError::KeyMismatch { expected, found }) => {
                    return Err(MintError::InvalidProof {
                        asset_id,
                        reason: format!("proof is for circuit {found}, gate verifies {expected}"),
                    })
                }
                Err(VerifyError::MalformedProof(reason)) => {
                    return Err(MintError::MalformedProof { asset_id, reason })
                }
            }

            if recipient == Address::ZERO {
                return Err(MintError::InvalidRecipient(asset_id));
            }

            let proof_fingerprint = proof.fingerprint();
            let receipt = self.clock.include();
            record.minted = true;
            record.owner = Some(recipient);
            record.proof_fingerprint = Some(proof_fingerprint);
            record.minted_at_block = Some(receipt.block_height);
            self.total_minted.fetch_add(1, Ordering::SeqCst);
            self.events.emit(
                receipt.block_height,
                MintEvent::Minted {
                    asset_id,
                    recipient,
                    proof_fingerprint,
                },
            );
            Ok(MintReceipt {
                asset_id,
                recipient,
                proof_fingerprint,
                receipt,
            })
        });

        match &result {
            Ok(r) => {
                metrics::counter!("amb_mint_minted_total").increment(1);
                tracing::info!(
                    %asset_id,
                    %recipient,
                    block = r.receipt.block_height,
                    fingerprint = %r.proof_fingerprint.short_hex(),
                    "asset minted"
                );
            }
            Err(e) => {
                metrics::counter!("amb_mint_rejected_total", "reason" => e.kind()).increment(1);
                tracing::warn!(%asset_id, error = %e, "mint rejected");
            }
        }
        result
    }

    /// Whether `asset_id` has been minted.
    pub fn is_minted(&self, asset_id: AssetId) -> bool {
        self.records.read(&asset_id).minted
    }

    /// Owner of `asset_id`, if minted.
    pub fn owner_of(&self, asset_id: AssetId) -> Option<Address> {
        self.records.read(&asset_id).owner
    }

    /// Units of `asset_id` held by `owner`: 1 or 0.
    pub fn balance_of(&self, owner: Address, asset_id: AssetId) -> u64 {
        u64::from(self.owner_of(asset_id) == Some(owner))
    }

    /// Full record for `asset_id`.
    pub fn record(&self, asset_id: AssetId) -> MintRecord {
        self.records.read(&asset_id)
    }

    /// Number of assets minted so far.
    pub fn total_minted(&self) -> u64 {
        self.total_minted.load(Ordering::SeqCst)
    }

    /// Up to `limit` notifications after `cursor`.
    pub fn events_since(&self, cursor: u64, limit: usize) -> Vec<LedgerEvent<MintEvent>> {
        self.events.events_since(cursor, limit)
    }

    /// Sequence number of the newest notification.
    pub fn event_head(&self) -> u64 {
        self.events.head()
    }

    /// Current block height of the public ledger.
    pub fn block_height(&self) -> u64 {
        self.clock.height()
    }

    /// Circuit identifier of the embedded verifier.
    pub fn circuit_id(&self) -> &str {
        self.verifier.circuit_id()
    }
}
