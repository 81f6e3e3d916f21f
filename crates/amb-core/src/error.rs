//! # Error Types
//!
//! Shared error types for the bridge. Component crates define their own
//! `thiserror` enums for protocol failures; the types here cover the
//! primitives every crate touches (canonicalization, identifier parsing).

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error raised when parsing or constructing a domain primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An address string was not `0x` followed by 40 hex characters.
    #[error("invalid address {value:?}: {reason}")]
    InvalidAddress {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An asset identifier string was not an unsigned integer.
    #[error("invalid asset id {0:?}")]
    InvalidAssetId(String),

    /// A role name did not match any of the fixed approval roles.
    #[error("unknown role {0:?}")]
    UnknownRole(String),

    /// A hex-encoded digest had the wrong length or alphabet.
    #[error("invalid digest hex: {0}")]
    InvalidDigest(String),

    /// A timestamp was not RFC 3339 UTC.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
