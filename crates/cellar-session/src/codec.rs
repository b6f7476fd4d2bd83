//! Payload codecs: how session values become bytes.

use crate::error::{Result, SessionError};

/// The values of a session: string keys mapped to arbitrary JSON values.
pub type Values = serde_json::Map<String, serde_json::Value>;

/// Encode/decode capability for session values.
pub trait PayloadCodec: Send + Sync {
    /// Serialize the values of a session.
    fn encode(&self, values: &Values) -> Result<Vec<u8>>;

    /// Restore values from bytes produced by [`encode`](Self::encode).
    fn decode(&self, bytes: &[u8]) -> Result<Values>;
}

/// JSON payload codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn encode(&self, values: &Values) -> Result<Vec<u8>> {
        serde_json::to_vec(values).map_err(|e| SessionError::Payload(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Values> {
        serde_json::from_slice(bytes).map_err(|e| SessionError::Payload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_round_trip() {
        let mut values = Values::new();
        values.insert("foo".into(), json!("bar"));
        values.insert("count".into(), json!(3));
        values.insert("nested".into(), json!({"roles": ["admin", "ops"], "active": true}));

        let bytes = JsonCodec.encode(&values).unwrap();
        assert_eq!(JsonCodec.decode(&bytes).unwrap(), values);
    }

    #[test]
    fn test_json_decode_rejects_non_object() {
        let err = JsonCodec.decode(b"[1, 2, 3]").unwrap_err();
        assert!(err.is_corruption());
    }
}
