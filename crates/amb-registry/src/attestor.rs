//! # Registry Attestor
//!
//! A witness source operated by the permissioned ledger's own operator,
//! who is entitled to read per-role flags. It is the confidential channel
//! between the registry and the relayer's prover: the relayer receives a
//! witness bundle from it and never queries role flags itself.

use std::sync::Arc;

use amb_core::AssetId;
use amb_zkp::{AttestationError, WitnessBundle, WitnessSource};

use crate::registry::ApprovalRegistry;

/// Attests witnesses from live registry state.
#[derive(Debug, Clone)]
pub struct RegistryAttestor {
    registry: Arc<ApprovalRegistry>,
}

impl RegistryAttestor {
    /// Attestor reading from `registry`.
    pub fn new(registry: Arc<ApprovalRegistry>) -> Self {
        Self { registry }
    }
}

impl WitnessSource for RegistryAttestor {
    fn witness_for(&self, asset_id: AssetId) -> Result<WitnessBundle, AttestationError> {
        let record = self.registry.get_approval_state(asset_id);
        if !record.aggregated {
            // Attest only completed aggregations; partial flags stay private.
            return Err(AttestationError::UnknownAsset(asset_id));
        }
        Ok(WitnessBundle::from_flags(
            asset_id,
            record.role_a,
            record.role_b,
            record.role_c,
        ))
    }
}
