//! # Canonical Serialization
//!
//! `CanonicalBytes` is the sole construction path for bytes that are signed
//! or hashed anywhere in the bridge: signed registry calls, proof
//! fingerprints, and mock-proof transcripts.
//!
//! ## Security Invariant
//!
//! The inner `Vec<u8>` is private. The only constructor rejects floats and
//! serializes with RFC 8785 (JCS) rules: sorted keys, compact separators.
//! Two parties that canonicalize the same logical value always sign or hash
//! the same bytes.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::FloatRejected` if the value contains
    /// a float. Returns `CanonicalizationError::SerializationFailed` if JCS
    /// serialization fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(value)
    }

    /// Construct canonical bytes from an already-built JSON value.
    pub fn from_value(value: Value) -> Result<Self, CanonicalizationError> {
        let coerced = reject_floats(value)?;
        let s = serde_jcs::to_string(&coerced)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn reject_floats(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(value),
        Value::Number(ref n) => {
            if n.is_f64() && !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(value)
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                out.insert(k, reject_floats(v)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(arr) => {
            let out: Result<Vec<_>, _> = arr.into_iter().map(reject_floats).collect();
            Ok(Value::Array(out?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_keys_compact_separators() {
        let data = serde_json::json!({"b": 2, "a": 1, "c": "hello"});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(cb.as_bytes(), br#"{"a":1,"b":2,"c":"hello"}"#);
    }

    #[test]
    fn nested_objects_are_sorted() {
        let data = serde_json::json!({"outer": {"b": 2, "a": 1}, "list": [3, 2, 1]});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(cb.as_bytes(), br#"{"list":[3,2,1],"outer":{"a":1,"b":2}}"#);
    }

    #[test]
    fn floats_are_rejected_at_any_depth() {
        let data = serde_json::json!({"a": {"b": [{"c": 3.25}]}});
        match CanonicalBytes::new(&data).unwrap_err() {
            CanonicalizationError::FloatRejected(f) => assert_eq!(f, 3.25),
            other => panic!("expected FloatRejected, got: {other}"),
        }
    }

    #[test]
    fn large_unsigned_integers_are_accepted() {
        let data = serde_json::json!({"asset_id": u64::MAX});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(
            std::str::from_utf8(cb.as_bytes()).unwrap(),
            format!("{{\"asset_id\":{}}}", u64::MAX)
        );
    }

    #[test]
    fn empty_object() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(cb.as_bytes(), b"{}");
        assert!(!cb.is_empty());
    }
}
