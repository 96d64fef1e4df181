//! Deterministic cache keys and content digests.

use crate::{Result, StoreError};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Fingerprint identifying one cached analysis: SHA-256 over the subject,
/// the analysis kind, and the canonical form of the parameter object.
///
/// `params` must be a JSON object; null is accepted and treated as the
/// empty object. Object keys serialize in sorted order, so logically
/// equal parameter sets produce the same fingerprint regardless of how
/// they were constructed. No randomness, stable across restarts.
pub fn query_fingerprint(subject: &str, kind: &str, params: &Value) -> Result<String> {
    let canonical = match params {
        Value::Object(_) => serde_json::to_string(params)?,
        Value::Null => "{}".to_string(),
        other => {
            return Err(StoreError::MalformedInput(format!(
                "analysis parameters must be a JSON object, got {}",
                json_type_name(other)
            )));
        }
    };

    let mut hasher = Sha256::new();
    hasher.update(subject.as_bytes());
    hasher.update(b":");
    hasher.update(kind.as_bytes());
    hasher.update(b":");
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Digest of raw document bytes. Identical bytes give the identical
/// digest whatever the file was named, which is the whole point.
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
