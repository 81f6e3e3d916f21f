//! # Mock Proof System
//!
//! A deterministic, transparent backend for development and testing.
//!
//! ## How It Works
//!
//! ```text
//! key   = SHA256( tag || name || version || sorted(required_roles) )
//! proof = SHA256( key || public_inputs_be )
//! ```
//!
//! `prove()` first checks the witness against the circuit (every required
//! role flag must be true) and refuses to emit a proof otherwise. `verify()`
//! recomputes the transcript from the public inputs alone.
//!
//! ## Security Warning
//!
//! **NOT SOUND.** Anyone who knows the circuit descriptor can forge a proof
//! for any asset without a witness. The mock exercises the bridge's control
//! flow (binding, exactly-once minting, retries), not its cryptography.

use amb_core::{ContentDigest, Role, Sha256Accumulator};
use serde::{Deserialize, Serialize};

use crate::traits::{ProofError, ProofService, Verifier, VerifyError};
use crate::types::{ApprovalProof, PublicInputs, WitnessBundle};

/// Public description of the approval circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitDescriptor {
    /// Circuit name.
    pub name: String,
    /// Circuit version.
    pub version: u32,
    /// Roles whose flag must be true in the witness.
    pub required_roles: Vec<Role>,
}

impl Default for CircuitDescriptor {
    fn default() -> Self {
        Self {
            name: "approval-all-roles".to_string(),
            version: 1,
            required_roles: Role::ALL.to_vec(),
        }
    }
}

impl CircuitDescriptor {
    /// Digest standing in for the verifying key.
    fn key_digest(&self) -> ContentDigest {
        let mut acc = Sha256Accumulator::new();
        acc.update(b"amb.mock-circuit.v1");
        acc.update(&(self.name.len() as u64).to_be_bytes());
        acc.update(self.name.as_bytes());
        acc.update(&self.version.to_be_bytes());
        let mut roles = self.required_roles.clone();
        roles.sort();
        roles.dedup();
        for role in roles {
            acc.update(role.as_str().as_bytes());
            acc.update(b";");
        }
        acc.finalize()
    }
}

fn transcript(key: &ContentDigest, public_inputs: &PublicInputs) -> Vec<u8> {
    let mut acc = Sha256Accumulator::new();
    acc.update(key.as_bytes());
    acc.update(&public_inputs.to_bytes());
    acc.finalize().as_bytes().to_vec()
}

/// Verifier half of the mock backend.
#[derive(Debug, Clone)]
pub struct MockVerifier {
    key: ContentDigest,
    circuit_id: String,
}

impl MockVerifier {
    /// Verifier for `circuit`.
    pub fn new(circuit: &CircuitDescriptor) -> Self {
        let key = circuit.key_digest();
        Self {
            circuit_id: format!("mock:{}", key.short_hex()),
            key,
        }
    }
}

impl Verifier for MockVerifier {
    fn circuit_id(&self) -> &str {
        &self.circuit_id
    }

    fn verify(&self, proof: &ApprovalProof, public_inputs: &PublicInputs) -> Result<bool, VerifyError> {
        if proof.circuit_id != self.circuit_id {
            return Err(VerifyError::KeyMismatch {
                expected: self.circuit_id.clone(),
                found: proof.circuit_id.clone(),
            });
        }
        if proof.proof.len() != 32 {
            return Err(VerifyError::MalformedProof(format!(
                "expected 32 proof bytes, got {}",
                proof.proof.len()
            )));
        }
        if public_inputs.len() != 1 {
            return Ok(false);
        }
        Ok(proof.proof == transcript(&self.key, public_inputs))
    }
}

/// Deterministic mock prover.
#[derive(Debug, Clone)]
pub struct MockProofSystem {
    circuit: CircuitDescriptor,
    verifier: MockVerifier,
}

impl Default for MockProofSystem {
    fn default() -> Self {
        Self::new(CircuitDescriptor::default())
    }
}

impl MockProofSystem {
    /// Prover for `circuit`.
    pub fn new(circuit: CircuitDescriptor) -> Self {
        let verifier = MockVerifier::new(&circuit);
        Self { circuit, verifier }
    }

    /// The matching verifier, for embedding in the mint gate.
    pub fn verifier(&self) -> MockVerifier {
        self.verifier.clone()
    }

    /// The circuit this prover targets.
    pub fn circuit(&self) -> &CircuitDescriptor {
        &self.circuit
    }
}

impl ProofService for MockProofSystem {
    fn circuit_id(&self) -> &str {
        &self.verifier.circuit_id
    }

    fn prove(&self, witness: &WitnessBundle) -> Result<ApprovalProof, ProofError> {
        let missing: Vec<Role> = self
            .circuit
            .required_roles
            .iter()
            .copied()
            .filter(|role| !witness.flag(*role))
            .collect();
        if !missing.is_empty() {
            return Err(ProofError::WitnessUnsatisfied {
                asset_id: witness.asset_id(),
                missing,
            });
        }

        let public_inputs = witness.public_inputs();
        let proof = transcript(&self.verifier.key, &public_inputs);
        tracing::debug!(asset_id = %witness.asset_id(), circuit = %self.verifier.circuit_id, "mock proof generated");
        Ok(ApprovalProof {
            circuit_id: self.verifier.circuit_id.clone(),
            proof,
            public_inputs,
        })
    }

    fn verify_locally(
        &self,
        proof: &ApprovalProof,
        public_inputs: &PublicInputs,
    ) -> Result<bool, VerifyError> {
        self.verifier.verify(proof, public_inputs)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use amb_core::AssetId;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn proof_binds_exactly_one_asset(a in any::<u64>(), b in any::<u64>()) {
            let sys = MockProofSystem::default();
            let proof = sys.prove(&WitnessBundle::from_flags(AssetId(a), true, true, true)).unwrap();
            let verdict = sys.verify_locally(&proof, &PublicInputs::for_asset(AssetId(b))).unwrap();
            prop_assert_eq!(verdict, a == b);
        }

        #[test]
        fn prove_succeeds_iff_all_flags_set(a in any::<bool>(), b in any::<bool>(), c in any::<bool>()) {
            let sys = MockProofSystem::default();
            let result = sys.prove(&WitnessBundle::from_flags(AssetId(1), a, b, c));
            prop_assert_eq!(result.is_ok(), a && b && c);
        }
    }
}
