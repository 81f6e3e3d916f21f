//! # Ledger Ports
//!
//! The relayer talks to each ledger through one trait. Production
//! deployments implement these over an RPC client; the in-process adapters
//! here wrap an [`ApprovalRegistry`] and a [`MintGate`] directly and are
//! what the CLI's local mode and the tests use.
//!
//! The feed exposes only what an outside observer of the permissioned
//! ledger may see: `FullyApproved` notifications and the set of aggregated
//! assets. Per-role flags reach the prover through a
//! [`WitnessSource`](amb_zkp::WitnessSource), never through the feed.

use std::future::Future;
use std::sync::Arc;

use amb_core::{Address, AssetId};
use amb_mint::{MintGate, MintReceipt};
use amb_registry::{ApprovalEvent, ApprovalRegistry};
use amb_zkp::{ApprovalProof, PublicInputs};

use crate::error::RelayerError;

/// One page of the full-approval feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedBatch {
    /// `(sequence, asset)` for each `FullyApproved` notification, in order.
    pub approved: Vec<(u64, AssetId)>,
    /// Resume point for the next call. Covers every event scanned,
    /// including ones that were not `FullyApproved`.
    pub cursor: u64,
}

/// Read side of the permissioned ledger.
pub trait ApprovalFeed: Send + Sync + 'static {
    /// Notifications after `cursor`, scanning at most `limit` events.
    fn fully_approved_since(
        &self,
        cursor: u64,
        limit: usize,
    ) -> impl Future<Output = Result<FeedBatch, RelayerError>> + Send;

    /// Resolve once an event after `cursor` exists.
    fn wait_for_events(&self, cursor: u64) -> impl Future<Output = ()> + Send;

    /// Every asset currently aggregated.
    fn aggregated_assets(&self) -> impl Future<Output = Result<Vec<AssetId>, RelayerError>> + Send;

    /// Sequence of the newest event, `0` when the log is empty.
    fn event_head(&self) -> impl Future<Output = Result<u64, RelayerError>> + Send;
}

/// Write side of the public ledger.
pub trait MintTarget: Send + Sync + 'static {
    /// Whether `asset_id` has been minted.
    fn is_minted(&self, asset_id: AssetId) -> impl Future<Output = Result<bool, RelayerError>> + Send;

    /// Sequence of the newest gate event. Used as a liveness check.
    fn event_head(&self) -> impl Future<Output = Result<u64, RelayerError>> + Send;

    /// Submit a proof-gated mint.
    fn submit_mint(
        &self,
        asset_id: AssetId,
        proof: &ApprovalProof,
        public_inputs: &PublicInputs,
        recipient: Address,
    ) -> impl Future<Output = Result<MintReceipt, RelayerError>> + Send;
}

/// Feed over an in-process registry.
#[derive(Debug, Clone)]
pub struct LocalRegistryFeed {
    registry: Arc<ApprovalRegistry>,
}

impl LocalRegistryFeed {
    /// Feed for `registry`.
    pub fn new(registry: Arc<ApprovalRegistry>) -> Self {
        Self { registry }
    }
}

impl ApprovalFeed for LocalRegistryFeed {
    async fn fully_approved_since(&self, cursor: u64, limit: usize) -> Result<FeedBatch, RelayerError> {
        let events = self.registry.events_since(cursor, limit);
        let next = events.last().map_or(cursor, |e| e.seq);
        let approved = events
            .into_iter()
            .filter_map(|e| match e.payload {
                ApprovalEvent::FullyApproved { asset_id } => Some((e.seq, asset_id)),
                ApprovalEvent::Approved { .. } => None,
            })
            .collect();
        Ok(FeedBatch {
            approved,
            cursor: next,
        })
    }

    async fn wait_for_events(&self, cursor: u64) {
        self.registry.wait_for_events(cursor).await;
    }

    async fn aggregated_assets(&self) -> Result<Vec<AssetId>, RelayerError> {
        Ok(self.registry.aggregated_assets())
    }

    async fn event_head(&self) -> Result<u64, RelayerError> {
        Ok(self.registry.event_head())
    }
}

/// Mint target over an in-process gate.
#[derive(Debug, Clone)]
pub struct LocalMintTarget {
    gate: Arc<MintGate>,
}

impl LocalMintTarget {
    /// Target for `gate`.
    pub fn new(gate: Arc<MintGate>) -> Self {
        Self { gate }
    }
}

impl MintTarget for LocalMintTarget {
    async fn is_minted(&self, asset_id: AssetId) -> Result<bool, RelayerError> {
        Ok(self.gate.is_minted(asset_id))
    }

    async fn event_head(&self) -> Result<u64, RelayerError> {
        Ok(self.gate.event_head())
    }

    async fn submit_mint(
        &self,
        asset_id: AssetId,
        proof: &ApprovalProof,
        public_inputs: &PublicInputs,
        recipient: Address,
    ) -> Result<MintReceipt, RelayerError> {
        Ok(self
            .gate
            .mint_with_proof(asset_id, proof, public_inputs, recipient)?)
    }
}
