//! # Relayer Errors
//!
//! Every error the saga sees is classified [`ErrorClass::Transient`] or
//! [`ErrorClass::Fatal`]. Transient errors are retried within the step's
//! budget; fatal ones move the asset straight to `Failed`.

use std::path::PathBuf;

use amb_core::AssetId;
use amb_mint::MintError;
use amb_zkp::{ProofError, VerifyError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::state::TransitionError;

/// Whether an error may clear up on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retry within budget.
    Transient,
    /// Surface immediately.
    Fatal,
}

/// Relayer error.
#[derive(Error, Debug)]
pub enum RelayerError {
    /// Proof generation failed.
    #[error("proof generation failed: {0}")]
    Proof(#[from] ProofError),

    /// Local verification could not run.
    #[error("local verification failed: {0}")]
    LocalVerify(#[from] VerifyError),

    /// The mint gate rejected a submission.
    #[error("mint rejected: {0}")]
    Mint(#[from] MintError),

    /// A ledger endpoint could not be reached.
    #[error("ledger unreachable ({ledger}): {reason}")]
    Unreachable {
        /// Which ledger.
        ledger: &'static str,
        /// Transport failure.
        reason: String,
    },

    /// The proving task panicked or was cancelled.
    #[error("proving task for asset {asset_id} aborted: {reason}")]
    TaskAborted {
        /// Asset being proven.
        asset_id: AssetId,
        /// Join error.
        reason: String,
    },

    /// Configuration was invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Relayer state could not be read or written.
    #[error("relayer state at {path} unusable: {reason}")]
    Persistence {
        /// State file path.
        path: PathBuf,
        /// Failure.
        reason: String,
    },

    /// The asset is not in a phase that allows the request.
    #[error("asset {asset_id} is {phase}; {action} not allowed")]
    NotAllowed {
        /// Asset.
        asset_id: AssetId,
        /// Its current phase name.
        phase: String,
        /// Requested action.
        action: &'static str,
    },

    /// A phase change was rejected.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// `run` was called on a service that is already running.
    #[error("relayer already running")]
    AlreadyRunning,

    /// The relayer has no record of the asset.
    #[error("asset {0} is not tracked by this relayer")]
    UnknownAsset(AssetId),

    /// Shutdown interrupted the operation.
    #[error("shutdown in progress")]
    ShuttingDown,
}

impl RelayerError {
    /// Retry classification.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Proof(_) | Self::Unreachable { .. } | Self::TaskAborted { .. } => {
                ErrorClass::Transient
            }
            Self::Mint(_)
            | Self::LocalVerify(_)
            | Self::Config(_)
            | Self::Persistence { .. }
            | Self::NotAllowed { .. }
            | Self::Transition(_)
            | Self::AlreadyRunning
            | Self::UnknownAsset(_)
            | Self::ShuttingDown => ErrorClass::Fatal,
        }
    }

    /// Whether [`class`](Self::class) is transient.
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}
