//! The persisted session record.
//!
//! Stored as a small JSON document:
//!
//! ```json
//! {"payload": "<base64>", "created_at": 1700000000, "max_age": 86400}
//! ```
//!
//! `payload` is whatever the [`PayloadCodec`] produced, so the outer format
//! does not depend on how values are serialized.

use serde::{Deserialize, Serialize};

use crate::codec::{PayloadCodec, Values};
use crate::error::{Result, SessionError};

/// A session as it sits in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Encoded session values.
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,

    /// When the record was written, in unix seconds.
    pub created_at: i64,

    /// Lifetime in seconds. Zero or less never expires.
    pub max_age: i64,
}

impl SessionRecord {
    /// Create a record from an already-encoded payload.
    pub fn new(payload: Vec<u8>, created_at: i64, max_age: i64) -> Self {
        Self {
            payload,
            created_at,
            max_age,
        }
    }

    /// Encode `values` with `codec` and wrap them in a record.
    pub fn from_values(
        codec: &dyn PayloadCodec,
        values: &Values,
        created_at: i64,
        max_age: i64,
    ) -> Result<Self> {
        Ok(Self::new(codec.encode(values)?, created_at, max_age))
    }

    /// Decode the payload back into values.
    pub fn values(&self, codec: &dyn PayloadCodec) -> Result<Values> {
        codec.decode(&self.payload)
    }

    /// Serialize the record for storage.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(SessionError::Record)
    }

    /// Parse a stored record.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(SessionError::Record)
    }

    /// When the record stops being valid, if it expires at all.
    pub fn expires_at(&self) -> Option<i64> {
        (self.max_age > 0).then(|| self.created_at.saturating_add(self.max_age))
    }

    /// Whether the record is past its lifetime at `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at().is_some_and(|expires_at| now >= expires_at)
    }
}

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
