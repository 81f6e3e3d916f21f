use amb_core::{Address, AssetId, Role};
use thiserror::Error;

/// Approval registry call failure. Every variant is fatal to the call and
/// is never retried by the registry itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The caller is not the address bound to the role.
    #[error("{caller} is not authorized to approve asset {asset_id} as {role}")]
    NotAuthorized {
        /// Asset the call targeted.
        asset_id: AssetId,
        /// Role the caller claimed.
        role: Role,
        /// Authenticated caller address.
        caller: Address,
    },

    /// The role already approved this asset.
    #[error("asset {asset_id} already approved by {role}")]
    AlreadyApproved {
        /// Asset the call targeted.
        asset_id: AssetId,
        /// Role whose flag was already set.
        role: Role,
    },

    /// A signed call did not verify.
    #[error("call authentication failed: {0}")]
    Unauthenticated(String),

    /// The role table given at construction was unusable.
    #[error("invalid role table: {0}")]
    InvalidRoleTable(String),
}
