//! Errors raised by the ledger substrate itself (as opposed to the
//! component-level errors of the registry and mint gate).

use amb_core::CanonicalizationError;
use thiserror::Error;

/// Ledger substrate error.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Key material could not be parsed.
    #[error("key error: {0}")]
    KeyError(String),

    /// A signed call failed signature verification.
    #[error("signature verification failed: {0}")]
    InvalidSignature(String),

    /// The call payload could not be canonicalized for signing.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}
