use amb_core::AssetId;
use thiserror::Error;

/// Mint gate call failure. A failed call mutates nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MintError {
    /// The asset is already minted.
    #[error("asset {0} is already minted")]
    AlreadyMinted(AssetId),

    /// The first public input does not name the asset being minted.
    #[error("public input mismatch for asset {asset_id}: proof is bound to {found:?}")]
    PublicInputMismatch {
        /// Asset the call targeted.
        asset_id: AssetId,
        /// Asset named by `public_inputs[0]`, if any.
        found: Option<AssetId>,
    },

    /// The verifier rejected the proof.
    #[error("invalid proof for asset {asset_id}: {reason}")]
    InvalidProof {
        /// Asset the call targeted.
        asset_id: AssetId,
        /// Verifier's explanation.
        reason: String,
    },

    /// The proof object could not be verified at all.
    #[error("malformed proof for asset {asset_id}: {reason}")]
    MalformedProof {
        /// Asset the call targeted.
        asset_id: AssetId,
        /// Parse failure.
        reason: String,
    },

    /// Minting to the zero address is not allowed.
    #[error("cannot mint asset {0} to the zero address")]
    InvalidRecipient(AssetId),
}

impl MintError {
    /// Stable label for metrics and API error codes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyMinted(_) => "already_minted",
            Self::PublicInputMismatch { .. } => "public_input_mismatch",
            Self::InvalidProof { .. } => "invalid_proof",
            Self::MalformedProof { .. } => "malformed_proof",
            Self::InvalidRecipient(_) => "invalid_recipient",
        }
    }
}
