//! # amb-zkp: Proof System Seam
//!
//! The bridge consumes zero-knowledge proofs as an opaque capability:
//!
//! ```text
//! ProofService::prove(witness)               -> ApprovalProof | ProofError
//! ProofService::verify_locally(proof, inputs) -> bool
//! Verifier::verify(proof, inputs)             -> bool   (embedded in MintGate)
//! ```
//!
//! The statement proven is "every required approval flag is true for the
//! asset named by the single public input". Nothing about which role
//! approved is ever carried in a proof or its public inputs.
//!
//! ## Backends
//!
//! | Backend | Feature | Status |
//! |---------|---------|--------|
//! | [`MockProofSystem`] | `mock` (default) | Deterministic SHA-256 transcript, **not zero-knowledge** |
//!
//! A real backend implements [`ProofService`] and [`Verifier`]; nothing
//! else in the workspace changes.
//!
//! ## Witness Sourcing
//!
//! Witnesses reach the prover through a [`WitnessSource`], a trusted
//! attestation channel. They are never read from the registry's public
//! storage.

pub mod attest;
#[cfg(feature = "mock")]
pub mod mock;
pub mod traits;
pub mod types;

pub use attest::{AttestationError, StaticAttestor, WitnessSource};
#[cfg(feature = "mock")]
pub use mock::{CircuitDescriptor, MockProofSystem, MockVerifier};
pub use traits::{ProofError, ProofService, Verifier, VerifyError};
pub use types::{ApprovalProof, PublicInputs, WitnessBundle};
