//! # Ed25519 Keys
//!
//! Caller identities on the permissioned ledger. A role holder's
//! [`Address`] is derived from its public key, so the registry's role table
//! can be written in addresses while calls are authenticated by signature.
//!
//! ## Security Invariant
//!
//! - Signing input is `&CanonicalBytes`; raw bytes cannot be signed.
//! - `Ed25519KeyPair` is not `Serialize` and its `Debug` output redacts the
//!   private key.

use amb_core::{Address, CanonicalBytes};
use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LedgerError;

/// An Ed25519 public key. Serializes as 64 hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey([u8; 32]);

/// An Ed25519 signature. Serializes as 128 hex characters.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature([u8; 64]);

/// A signing key pair.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl Ed25519PublicKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The ledger address controlled by this key.
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.0)
    }

    /// Lowercase hex.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    /// Parse 64 hex characters.
    pub fn from_hex(hex: &str) -> Result<Self, LedgerError> {
        let bytes = from_hex(hex.trim()).map_err(LedgerError::KeyError)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            LedgerError::KeyError(format!("public key must be 32 bytes, got {}", b.len()))
        })?;
        Ok(Self(arr))
    }

    fn to_verifying_key(self) -> Result<ed25519_dalek::VerifyingKey, LedgerError> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| LedgerError::KeyError(format!("invalid public key: {e}")))
    }

    /// Verify `signature` over `data`.
    pub fn verify(&self, data: &CanonicalBytes, signature: &Ed25519Signature) -> Result<(), LedgerError> {
        let vk = self.to_verifying_key()?;
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        vk.verify(data.as_bytes(), &sig)
            .map_err(|e| LedgerError::InvalidSignature(e.to_string()))
    }
}

impl std::fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519PublicKey({}...)", to_hex(&self.0[..4]))
    }
}

impl Serialize for Ed25519PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl Ed25519Signature {
    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Lowercase hex.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    /// Parse 128 hex characters.
    pub fn from_hex(hex: &str) -> Result<Self, LedgerError> {
        let bytes = from_hex(hex.trim()).map_err(LedgerError::InvalidSignature)?;
        let arr: [u8; 64] = bytes.try_into().map_err(|b: Vec<u8>| {
            LedgerError::InvalidSignature(format!("signature must be 64 bytes, got {}", b.len()))
        })?;
        Ok(Self(arr))
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signature({}...)", to_hex(&self.0[..4]))
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl Ed25519KeyPair {
    /// Generate a fresh key pair from the OS RNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Deterministic key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// The public half.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Shorthand for `self.public_key().address()`.
    pub fn address(&self) -> Address {
        self.public_key().address()
    }

    /// Sign canonical bytes.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(data.as_bytes()).to_bytes())
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519KeyPair(<private>, address={})", self.address())
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn from_hex(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return Err("hex string must be even-length ASCII".to_string());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| format!("invalid hex at position {i}: {e}"))
        })
        .collect()
}
