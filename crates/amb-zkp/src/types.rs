//! # Proof Data Types
//!
//! - [`WitnessBundle`]: private approval flags plus the public asset id.
//!   Ephemeral. Deliberately neither `Serialize` nor `Clone`, and its
//!   `Debug` output redacts the flags.
//! - [`PublicInputs`]: the public-input vector. Element 0 is the asset id.
//! - [`ApprovalProof`]: opaque proof bytes bound to a public-input vector.

use std::collections::BTreeMap;

use amb_core::{AssetId, ContentDigest, Role, Sha256Accumulator};
use serde::{Deserialize, Serialize};

// ─── WitnessBundle ───────────────────────────────────────────────────

/// Private inputs to the approval circuit.
pub struct WitnessBundle {
    asset_id: AssetId,
    approvals: BTreeMap<Role, bool>,
}

impl WitnessBundle {
    /// A bundle with every role flag false.
    pub fn new(asset_id: AssetId) -> Self {
        Self {
            asset_id,
            approvals: Role::ALL.into_iter().map(|r| (r, false)).collect(),
        }
    }

    /// A bundle from the three role flags.
    pub fn from_flags(asset_id: AssetId, role_a: bool, role_b: bool, role_c: bool) -> Self {
        Self::new(asset_id)
            .with(Role::RoleA, role_a)
            .with(Role::RoleB, role_b)
            .with(Role::RoleC, role_c)
    }

    /// Set one role flag.
    pub fn with(mut self, role: Role, approved: bool) -> Self {
        self.approvals.insert(role, approved);
        self
    }

    /// The public asset id.
    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    /// One private flag.
    pub fn flag(&self, role: Role) -> bool {
        self.approvals.get(&role).copied().unwrap_or(false)
    }

    /// The public inputs this witness proves against.
    pub fn public_inputs(&self) -> PublicInputs {
        PublicInputs::for_asset(self.asset_id)
    }
}

impl std::fmt::Debug for WitnessBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WitnessBundle")
            .field("asset_id", &self.asset_id)
            .field("approvals", &"<redacted>")
            .finish()
    }
}

// ─── PublicInputs ────────────────────────────────────────────────────

/// Public-input vector of an approval proof.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicInputs(Vec<u64>);

impl PublicInputs {
    /// The canonical vector for `asset_id`: exactly `[asset_id]`.
    pub fn for_asset(asset_id: AssetId) -> Self {
        Self(vec![asset_id.value()])
    }

    /// Arbitrary vector, as received from an untrusted submitter.
    pub fn from_values(values: Vec<u64>) -> Self {
        Self(values)
    }

    /// Element 0 interpreted as an asset id.
    pub fn asset_id(&self) -> Option<AssetId> {
        self.0.first().copied().map(AssetId)
    }

    /// Raw values.
    pub fn values(&self) -> &[u64] {
        &self.0
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Big-endian byte encoding fed to proof transcripts.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|v| v.to_be_bytes()).collect()
    }
}

// ─── ApprovalProof ───────────────────────────────────────────────────

/// An opaque proof plus the public inputs it was generated for.
///
/// Safe to send over untrusted channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalProof {
    /// Circuit/key identifier of the producing backend.
    pub circuit_id: String,
    /// Backend-specific proof bytes.
    #[serde(with = "hex_bytes")]
    pub proof: Vec<u8>,
    /// Public inputs bound into the proof.
    pub public_inputs: PublicInputs,
}

impl ApprovalProof {
    /// SHA-256 digest identifying this proof.
    ///
    /// ```text
    /// SHA256( len(circuit_id) || circuit_id || len(proof) || proof || public_inputs_be )
    /// ```
    ///
    /// Lengths are 8-byte big-endian, so no two distinct proofs share a
    /// transcript.
    pub fn fingerprint(&self) -> ContentDigest {
        let mut acc = Sha256Accumulator::new();
        acc.update(&(self.circuit_id.len() as u64).to_be_bytes());
        acc.update(self.circuit_id.as_bytes());
        acc.update(&(self.proof.len() as u64).to_be_bytes());
        acc.update(&self.proof);
        acc.update(&self.public_inputs.to_bytes());
        acc.finalize()
    }
}

/// Serde helper for hex-encoding `Vec<u8>` fields.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        serializer.serialize_str(&hex)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.len() % 2 != 0 || !s.is_ascii() {
            return Err(serde::de::Error::custom("hex string must be even-length ASCII"));
        }
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn witness_debug_hides_flags() {
        let w = WitnessBundle::from_flags(AssetId(42), true, false, true);
        let dbg = format!("{w:?}");
        assert!(dbg.contains("42"));
        assert!(dbg.contains("<redacted>"));
        assert!(!dbg.contains("true"));
    }

    #[test]
    fn witness_defaults_to_unapproved() {
        let w = WitnessBundle::new(AssetId(1));
        assert!(Role::ALL.iter().all(|r| !w.flag(*r)));
        let w = w.with(Role::RoleB, true);
        assert!(w.flag(Role::RoleB));
        assert_eq!(w.public_inputs(), PublicInputs::for_asset(AssetId(1)));
    }

    #[test]
    fn public_inputs_first_element_is_asset() {
        let p = PublicInputs::for_asset(AssetId(42));
        assert_eq!(p.asset_id(), Some(AssetId(42)));
        assert_eq!(p.len(), 1);
        assert_eq!(p.to_bytes(), 42u64.to_be_bytes().to_vec());
        assert_eq!(PublicInputs::from_values(vec![]).asset_id(), None);
    }

    #[test]
    fn proof_serializes_bytes_as_hex() {
        let proof = ApprovalProof {
            circuit_id: "c".to_string(),
            proof: vec![0xde, 0xad],
            public_inputs: PublicInputs::for_asset(AssetId(5)),
        };
        let json = serde_json::to_value(&proof).unwrap();
        assert_eq!(json["proof"], "dead");
        assert_eq!(json["public_inputs"], serde_json::json!([5]));
        let back: ApprovalProof = serde_json::from_value(json).unwrap();
        assert_eq!(back, proof);
    }

    #[test]
    fn fingerprint_changes_with_public_inputs() {
        let a = ApprovalProof {
            circuit_id: "c".to_string(),
            proof: vec![1, 2, 3],
            public_inputs: PublicInputs::for_asset(AssetId(42)),
        };
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.public_inputs = PublicInputs::for_asset(AssetId(43));
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
