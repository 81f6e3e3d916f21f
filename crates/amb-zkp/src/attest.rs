//! # Witness Attestation Channel
//!
//! The relayer never reads private approval flags from a ledger. It asks a
//! [`WitnessSource`], an attestation channel run by a party entitled to
//! know the flags, for the witness of one asset.
//!
//! - [`StaticAttestor`] returns the same flags for every asset. It exists
//!   for development networks where no confidential channel is deployed.
//! - A registry-side attestor lives next to the approval registry.

use amb_core::{AssetId, Role};
use thiserror::Error;

use crate::traits::ProofError;
use crate::types::WitnessBundle;

/// The attestation channel could not produce a witness.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttestationError {
    /// The attestor has no record of this asset.
    #[error("no attestation available for asset {0}")]
    UnknownAsset(AssetId),

    /// The channel is temporarily unreachable.
    #[error("attestation channel unavailable: {0}")]
    Unavailable(String),
}

impl AttestationError {
    /// Whether a later attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// The proof error this becomes when witness retrieval is part of
    /// proof generation.
    pub fn into_proof_error(self, asset_id: AssetId) -> ProofError {
        ProofError::WitnessUnavailable {
            asset_id,
            reason: self.to_string(),
        }
    }
}

/// A trusted source of private witnesses.
pub trait WitnessSource: Send + Sync {
    /// Attest the approval flags for `asset_id`.
    fn witness_for(&self, asset_id: AssetId) -> Result<WitnessBundle, AttestationError>;
}

/// Fixed flags for every asset.
#[derive(Debug, Clone, Copy)]
pub struct StaticAttestor {
    role_a: bool,
    role_b: bool,
    role_c: bool,
}

impl StaticAttestor {
    /// Attest the given flags for every asset.
    pub fn new(role_a: bool, role_b: bool, role_c: bool) -> Self {
        Self { role_a, role_b, role_c }
    }

    /// Attest every role as approved.
    pub fn all_approved() -> Self {
        Self::new(true, true, true)
    }

    /// The flag this attestor reports for `role`.
    pub fn flag(&self, role: Role) -> bool {
        match role {
            Role::RoleA => self.role_a,
            Role::RoleB => self.role_b,
            Role::RoleC => self.role_c,
        }
    }
}

impl WitnessSource for StaticAttestor {
    fn witness_for(&self, asset_id: AssetId) -> Result<WitnessBundle, AttestationError> {
        Ok(WitnessBundle::from_flags(asset_id, self.role_a, self.role_b, self.role_c))
    }
}
