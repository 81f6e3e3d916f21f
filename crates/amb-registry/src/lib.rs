//! # amb-registry: Approval Registry
//!
//! The permissioned-ledger component. Three parties, each bound at
//! construction to one fixed role, record their approval of an asset. When
//! the third distinct approval lands the registry marks the asset
//! aggregated and emits `FullyApproved` exactly once. That notification is
//! the only trigger the relayer depends on.
//!
//! ## Invariants
//!
//! - `aggregated == role_a && role_b && role_c`, and once true it stays true.
//! - Each role flag goes false→true at most once per asset. A repeat call
//!   fails with [`RegistryError::AlreadyApproved`]; it is not a silent no-op.
//! - The role table is immutable after construction.
//! - A failed call mutates nothing and emits nothing.

pub mod attestor;
pub mod error;
pub mod record;
pub mod registry;

pub use attestor::RegistryAttestor;
pub use error::RegistryError;
pub use record::{ApprovalEvent, ApprovalRecord, RoleTable};
pub use registry::{ApprovalOutcome, ApprovalRegistry, ApproveCall, APPROVE_DOMAIN};
