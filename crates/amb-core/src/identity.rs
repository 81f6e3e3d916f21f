//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers that cross the ledger boundary.
//!
//! - [`AssetId`] is the single public input of every proof. It is an opaque
//!   unsigned integer, unique across both ledgers for one protocol instance.
//! - [`Address`] is a 20-byte account address, derived from an Ed25519
//!   public key on the permissioned ledger and used as the recipient on the
//!   public ledger.
//! - [`Role`] is one of the three fixed approval roles.
//!
//! ## Security Invariant
//!
//! Type-level distinction between identifier namespaces prevents a
//! recipient address from being mistaken for an asset identifier when a
//! mint request is assembled.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

// ─── AssetId ─────────────────────────────────────────────────────────

/// Opaque asset identifier shared by both ledgers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub u64);

impl AssetId {
    /// Wrap a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw integer value.
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for AssetId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl FromStr for AssetId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ValidationError::InvalidAssetId(s.to_string()))
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Address ─────────────────────────────────────────────────────────

/// A 20-byte account address.
///
/// Serializes as a lowercase `0x`-prefixed hex string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Create an address from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive the address controlled by an Ed25519 public key.
    ///
    /// The address is the last 20 bytes of `SHA256(public_key)`.
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        let hash = Sha256::digest(public_key);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        Self(bytes)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Render as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        let body: String = self.0.iter().map(|b| format!("{b:02x}")).collect();
        format!("0x{body}")
    }

    /// Parse a `0x`-prefixed, 40-hex-character address.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidAddress {
            value: s.to_string(),
            reason: reason.to_string(),
        };
        let body = s
            .trim()
            .strip_prefix("0x")
            .ok_or_else(|| invalid("missing 0x prefix"))?;
        if body.len() != 40 || !body.is_ascii() {
            return Err(invalid("expected 40 hex characters"));
        }
        let mut bytes = [0u8; 20];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&body[i * 2..i * 2 + 2], 16)
                .map_err(|_| invalid("non-hex character"))?;
        }
        Ok(Self(bytes))
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ─── Role ────────────────────────────────────────────────────────────

/// One of the three fixed approval roles on the permissioned ledger.
///
/// No wildcard arms are used when matching on `Role`; adding a role forces
/// every consumer (registry flags, witness bundle, circuit) to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// First approving party.
    RoleA,
    /// Second approving party.
    RoleB,
    /// Third approving party.
    RoleC,
}

impl Role {
    /// All roles, in canonical order.
    pub const ALL: [Role; 3] = [Role::RoleA, Role::RoleB, Role::RoleC];

    /// The canonical string name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleA => "role_a",
            Self::RoleB => "role_b",
            Self::RoleC => "role_c",
        }
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "role_a" | "a" | "rolea" => Ok(Self::RoleA),
            "role_b" | "b" | "roleb" => Ok(Self::RoleB),
            "role_c" | "c" | "rolec" => Ok(Self::RoleC),
            _ => Err(ValidationError::UnknownRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
