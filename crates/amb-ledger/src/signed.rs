//! # Signed Calls
//!
//! A call submitted to the permissioned ledger carries the payload, the
//! signer's public key, and an Ed25519 signature over the canonical bytes
//! of `{"domain": ..., "payload": ...}`. The domain tag keeps a signature
//! for one operation from being replayed as another.
//!
//! [`SignedCall::verify`] is the only way to obtain a caller [`Address`]
//! from a signed call; components run their authorization checks against
//! that address.

use amb_core::{Address, CanonicalBytes};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::keys::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// A call payload with its signer and signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCall<P> {
    /// Operation domain tag, e.g. `amb.registry.approve.v1`.
    pub domain: String,
    /// Operation arguments.
    pub payload: P,
    /// Public key of the caller.
    pub signer: Ed25519PublicKey,
    /// Signature over the canonical envelope.
    pub signature: Ed25519Signature,
}

#[derive(Serialize)]
struct Envelope<'a, P> {
    domain: &'a str,
    payload: &'a P,
}

fn signing_bytes<P: Serialize>(domain: &str, payload: &P) -> Result<CanonicalBytes, LedgerError> {
    Ok(CanonicalBytes::new(&Envelope { domain, payload })?)
}

impl<P: Serialize> SignedCall<P> {
    /// Sign `payload` under `domain` with `key`.
    pub fn sign(domain: impl Into<String>, payload: P, key: &Ed25519KeyPair) -> Result<Self, LedgerError> {
        let domain = domain.into();
        let bytes = signing_bytes(&domain, &payload)?;
        Ok(Self {
            signature: key.sign(&bytes),
            signer: key.public_key(),
            domain,
            payload,
        })
    }

    /// Check the signature and the expected domain, returning the caller.
    pub fn verify(&self, expected_domain: &str) -> Result<Address, LedgerError> {
        if self.domain != expected_domain {
            return Err(LedgerError::InvalidSignature(format!(
                "call domain {:?} does not match {:?}",
                self.domain, expected_domain
            )));
        }
        let bytes = signing_bytes(&self.domain, &self.payload)?;
        self.signer.verify(&bytes, &self.signature)?;
        Ok(self.signer.address())
    }
}
