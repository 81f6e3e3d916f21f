//! # Prover and Verifier Traits
//!
//! Both traits require `Send + Sync` so one instance can be shared across
//! relayer tasks. Proof generation is CPU-bound and synchronous; async
//! callers run it on a blocking thread.

use amb_core::{AssetId, Role};
use thiserror::Error;

use crate::types::{ApprovalProof, PublicInputs, WitnessBundle};

/// Proof generation failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// The witness does not satisfy the circuit. Deterministic: retrying
    /// with the same witness fails the same way.
    #[error("witness for asset {asset_id} does not satisfy the circuit: missing approvals {missing:?}")]
    WitnessUnsatisfied {
        /// Asset the witness was for.
        asset_id: AssetId,
        /// Required roles whose flag was false.
        missing: Vec<Role>,
    },

    /// The witness could not be obtained from the attestation channel.
    #[error("witness unavailable for asset {asset_id}: {reason}")]
    WitnessUnavailable {
        /// Asset the witness was requested for.
        asset_id: AssetId,
        /// Attestation channel's explanation.
        reason: String,
    },

    /// Internal prover failure.
    #[error("prover error: {0}")]
    ProverError(String),
}

/// Proof verification could not be performed.
///
/// A well-formed proof that simply does not verify is `Ok(false)`, not an
/// error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The proof object is structurally invalid.
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// The proof was produced for a different circuit or key.
    #[error("verifying key mismatch: expected {expected}, proof is for {found}")]
    KeyMismatch {
        /// Circuit identifier this verifier accepts.
        expected: String,
        /// Circuit identifier carried by the proof.
        found: String,
    },
}

/// The prover side, used by the relayer.
pub trait ProofService: Send + Sync {
    /// Identifier of the circuit/key this service proves against.
    fn circuit_id(&self) -> &str;

    /// Generate a proof that every required approval holds for
    /// `witness.asset_id()`.
    fn prove(&self, witness: &WitnessBundle) -> Result<ApprovalProof, ProofError>;

    /// Check a proof before spending a public-ledger submission on it.
    fn verify_locally(
        &self,
        proof: &ApprovalProof,
        public_inputs: &PublicInputs,
    ) -> Result<bool, VerifyError>;
}

/// The verifier side, embedded in the mint gate.
pub trait Verifier: Send + Sync {
    /// Identifier of the circuit/key this verifier accepts.
    fn circuit_id(&self) -> &str;

    /// Verify `proof` against `public_inputs`.
    fn verify(&self, proof: &ApprovalProof, public_inputs: &PublicInputs) -> Result<bool, VerifyError>;
}
