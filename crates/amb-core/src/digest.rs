//! # Content Digests
//!
//! SHA-256 digests used for proof fingerprints and mock-proof transcripts.
//! Both are built with [`Sha256Accumulator`] from length-prefixed segments,
//! so adjacent variable-length fields cannot run into each other.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

/// A 32-byte SHA-256 content digest.
///
/// Serializes as a 64-character lowercase hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest {
    bytes: [u8; 32],
}

impl ContentDigest {
    /// Wrap raw digest bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Render the digest as lowercase hex.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a 64-character hex digest.
    pub fn from_hex(hex: &str) -> Result<Self, ValidationError> {
        let hex = hex.trim();
        if hex.len() != 64 || !hex.is_ascii() {
            return Err(ValidationError::InvalidDigest(format!(
                "expected 64 hex chars, got {}",
                hex.len()
            )));
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| ValidationError::InvalidDigest("non-hex character".to_string()))?;
        }
        Ok(Self { bytes })
    }

    /// First eight bytes as hex, for log lines.
    pub fn short_hex(&self) -> String {
        self.bytes[..8].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Incremental SHA-256 over a transcript of byte segments.
#[derive(Debug, Clone, Default)]
pub struct Sha256Accumulator {
    hasher: Sha256,
}

impl Sha256Accumulator {
    /// Start an empty transcript.
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    /// Append a segment.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Finish the transcript.
    pub fn finalize(self) -> ContentDigest {
        let hash = self.hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        ContentDigest::new(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::CanonicalBytes;

    fn digest_of(segments: &[&[u8]]) -> ContentDigest {
        let mut acc = Sha256Accumulator::new();
        for segment in segments {
            acc.update(segment);
        }
        acc.finalize()
    }

    #[test]
    fn known_sha256_vector() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(
            digest_of(&[cb.as_bytes()]).to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn segments_hash_as_one_stream() {
        assert_eq!(digest_of(&[b"asset", b"42"]), digest_of(&[b"asset42"]));
        assert_ne!(digest_of(&[b"asset42"]), digest_of(&[b"asset43"]));
    }

    #[test]
    fn hex_roundtrip_and_display() {
        let d = digest_of(&[b"a"]);
        assert_eq!(ContentDigest::from_hex(&d.to_hex()).unwrap(), d);
        assert!(d.to_string().starts_with("sha256:"));
        assert_eq!(d.short_hex().len(), 16);
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(ContentDigest::from_hex("abcd").is_err());
        assert!(ContentDigest::from_hex(&"g".repeat(64)).is_err());
    }
}
