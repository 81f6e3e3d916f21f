//! # amb-core: Foundational Types for the Approval-Mint Bridge
//!
//! This crate is the leaf of the workspace dependency graph. It defines the
//! primitives shared by both ledgers and the relayer that connects them.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `AssetId`, `Address`, and
//!    `Role` are distinct types. An asset identifier cannot be passed where
//!    an address is expected, and roles are a closed enum rather than strings.
//!
//! 2. **`CanonicalBytes` newtype.** Signed ledger calls are signed over
//!    bytes produced by `CanonicalBytes::new()`. Proof fingerprints and mock
//!    transcripts are length-prefixed segments fed to `Sha256Accumulator`.
//!
//! 3. **UTC-only timestamps.** `Timestamp` enforces UTC with a `Z` suffix
//!    and seconds precision.
//!
//! 4. **Deployment record.** The small persisted mapping from logical
//!    component name to location lives here so that both the relayer and
//!    operator tooling read it through one type.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `amb-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod deployment;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use deployment::{Component, DeploymentError, DeploymentRecord};
pub use digest::{ContentDigest, Sha256Accumulator};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{Address, AssetId, Role};
pub use temporal::Timestamp;
