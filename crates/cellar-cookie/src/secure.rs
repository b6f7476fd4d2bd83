//! Single-key token codec.
//!
//! Token layout, before the outer base64 (URL-safe, unpadded):
//!
//! ```text
//! <unix-timestamp> | <base64(value or sealed value)> | <hmac-sha256 bytes>
//! ```
//!
//! The MAC covers `name|timestamp|base64-value`, so a token only opens under
//! the session name it was issued for.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::trace;

use crate::cipher::BlockCipher;
use crate::error::{Result, TokenError};
use crate::key::KeyPair;

type HmacSha256 = Hmac<Sha256>;

/// Default token lifetime in seconds (30 days).
pub const DEFAULT_MAX_AGE: i64 = 86400 * 30;

/// Default maximum encoded token length.
pub const DEFAULT_MAX_LENGTH: usize = 4096;

/// Tolerated clock skew for timestamps from the future, in seconds.
const MAX_CLOCK_SKEW: i64 = 60;

/// Encode/decode capability for session tokens.
///
/// Times are unix seconds. The `_at` forms take the current time from the
/// caller; the plain forms read the wall clock.
pub trait TokenCodec: Send + Sync {
    /// Seal `value` for the session called `name`, stamped with `now`.
    fn encode_at(&self, name: &str, value: &str, now: i64) -> Result<String>;

    /// Open a token issued for `name`, judging its age against `now`.
    ///
    /// `max_age` is the oldest acceptable token age in seconds; a value of
    /// zero or less defers to the codec's own default.
    fn decode_at(&self, name: &str, token: &str, max_age: i64, now: i64) -> Result<String>;

    /// Seal `value` for the session called `name`.
    fn encode(&self, name: &str, value: &str) -> Result<String> {
        self.encode_at(name, value, chrono::Utc::now().timestamp())
    }

    /// Open a token issued for `name`.
    fn decode(&self, name: &str, token: &str, max_age: i64) -> Result<String> {
        self.decode_at(name, token, max_age, chrono::Utc::now().timestamp())
    }
}

/// HMAC-signed, optionally AES-GCM-sealed token codec for one key pair.
#[derive(Clone)]
pub struct SecureCookie {
    hash_key: Vec<u8>,
    block: Option<BlockCipher>,
    max_age: i64,
    max_length: usize,
}

impl std::fmt::Debug for SecureCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureCookie")
            .field("encrypted", &self.block.is_some())
            .field("max_age", &self.max_age)
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

impl SecureCookie {
    /// Create a codec from a key pair.
    pub fn new(keys: &KeyPair) -> Result<Self> {
        if keys.hash_key.is_empty() {
            return Err(TokenError::HashKeyNotSet);
        }
        let block = keys.block_key.as_deref().map(BlockCipher::new).transpose()?;

        Ok(Self {
            hash_key: keys.hash_key.clone(),
            block,
            max_age: DEFAULT_MAX_AGE,
            max_length: DEFAULT_MAX_LENGTH,
        })
    }

    /// Set the default max age in seconds (0 disables the age check).
    pub fn with_max_age(mut self, max_age: i64) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set the maximum encoded length (0 means unlimited).
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// The configured maximum encoded length.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Whether values are encrypted as well as signed.
    pub fn is_encrypted(&self) -> bool {
        self.block.is_some()
    }

    fn mac(&self, name: &str, timestamp: &[u8], value: &[u8]) -> Result<HmacSha256> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.hash_key)
            .map_err(|_| TokenError::HashKeyNotSet)?;
        mac.update(name.as_bytes());
        mac.update(b"|");
        mac.update(timestamp);
        mac.update(b"|");
        mac.update(value);
        Ok(mac)
    }

    fn check_length(&self, len: usize) -> Result<()> {
        if self.max_length != 0 && len > self.max_length {
            return Err(TokenError::LengthExceeded {
                len,
                max: self.max_length,
            });
        }
        Ok(())
    }
}

impl TokenCodec for SecureCookie {
    fn encode_at(&self, name: &str, value: &str, now: i64) -> Result<String> {
        let raw = match &self.block {
            Some(block) => block.seal(value.as_bytes(), name.as_bytes())?,
            None => value.as_bytes().to_vec(),
        };
        let encoded_value = URL_SAFE_NO_PAD.encode(raw);
        let timestamp = now.to_string();

        let tag = self
            .mac(name, timestamp.as_bytes(), encoded_value.as_bytes())?
            .finalize()
            .into_bytes();

        let mut body = Vec::with_capacity(timestamp.len() + encoded_value.len() + tag.len() + 2);
        body.extend_from_slice(timestamp.as_bytes());
        body.push(b'|');
        body.extend_from_slice(encoded_value.as_bytes());
        body.push(b'|');
        body.extend_from_slice(&tag);

        let token = URL_SAFE_NO_PAD.encode(body);
        self.check_length(token.len())?;
        Ok(token)
    }

    fn decode_at(&self, name: &str, token: &str, max_age: i64, now: i64) -> Result<String> {
        self.check_length(token.len())?;

        let body = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| TokenError::Decoding(e.to_string()))?;

        let mut parts = body.splitn(3, |b| *b == b'|');
        let (Some(timestamp), Some(encoded_value), Some(tag)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Decoding("missing token fields".to_string()));
        };

        self.mac(name, timestamp, encoded_value)?
            .verify_slice(tag)
            .map_err(|_| TokenError::MacInvalid)?;

        let issued_at: i64 = std::str::from_utf8(timestamp)
            .ok()
            .and_then(|t| t.parse().ok())
            .ok_or(TokenError::InvalidTimestamp)?;

        let max_age = if max_age > 0 { max_age } else { self.max_age };
        if max_age > 0 && issued_at < now - max_age {
            trace!(name, issued_at, max_age, "Token expired");
            return Err(TokenError::Expired);
        }
        if issued_at > now + MAX_CLOCK_SKEW {
            return Err(TokenError::TimestampTooNew);
        }

        let raw = URL_SAFE_NO_PAD
            .decode(encoded_value)
            .map_err(|e| TokenError::Decoding(e.to_string()))?;
        let value = match &self.block {
            Some(block) => block.open(&raw, name.as_bytes())?,
            None => raw,
        };

        String::from_utf8(value).map_err(|e| TokenError::Decoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn codec() -> SecureCookie {
        SecureCookie::new(&KeyPair::new(b"secret-key".to_vec())).unwrap()
    }

    fn encrypted() -> SecureCookie {
        SecureCookie::new(&KeyPair::new(b"secret-key".to_vec()).with_block_key(vec![9; 32]))
            .unwrap()
    }

    #[test]
    fn test_encode_decode() {
        let codec = codec();
        let token = codec.encode_at("test", "session-id", NOW).unwrap();
        assert_eq!(codec.decode_at("test", &token, 0, NOW).unwrap(), "session-id");
    }

    #[test]
    fn test_token_is_cookie_safe() {
        let token = encrypted().encode_at("test", "session-id", NOW).unwrap();
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_encrypted_hides_value() {
        let codec = encrypted();
        assert!(codec.is_encrypted());

        let token = codec.encode_at("test", "plain-session-id", NOW).unwrap();
        let body = URL_SAFE_NO_PAD.decode(&token).unwrap();
        let visible = String::from_utf8_lossy(&body);
        assert!(!visible.contains(&URL_SAFE_NO_PAD.encode("plain-session-id")));

        assert_eq!(
            codec.decode_at("test", &token, 0, NOW).unwrap(),
            "plain-session-id"
        );
    }

    #[test]
    fn test_wrong_name_rejected() {
        let codec = codec();
        let token = codec.encode_at("cart", "id", NOW).unwrap();
        assert!(matches!(
            codec.decode_at("auth", &token, 0, NOW),
            Err(TokenError::MacInvalid)
        ));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = codec().encode_at("test", "id", NOW).unwrap();
        let other = SecureCookie::new(&KeyPair::new(b"other-key".to_vec())).unwrap();
        assert!(matches!(
            other.decode_at("test", &token, 0, NOW),
            Err(TokenError::MacInvalid)
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let codec = codec();
        let token = codec.encode_at("test", "id", NOW).unwrap();
        let mut body = URL_SAFE_NO_PAD.decode(&token).unwrap();
        body[0] = if body[0] == b'1' { b'2' } else { b'1' };
        let forged = URL_SAFE_NO_PAD.encode(body);

        assert!(matches!(
            codec.decode_at("test", &forged, 0, NOW),
            Err(TokenError::MacInvalid)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let codec = codec();
        assert!(matches!(
            codec.decode_at("test", "not base64!", 0, NOW),
            Err(TokenError::Decoding(_))
        ));
        let no_fields = URL_SAFE_NO_PAD.encode("only-one-field");
        assert!(matches!(
            codec.decode_at("test", &no_fields, 0, NOW),
            Err(TokenError::Decoding(_))
        ));
    }

    #[test]
    fn test_max_age() {
        let codec = codec();
        let token = codec.encode_at("test", "id", NOW - 100).unwrap();

        assert!(codec.decode_at("test", &token, 1024, NOW).is_ok());
        assert!(matches!(
            codec.decode_at("test", &token, 50, NOW),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_default_max_age_applies() {
        let codec = codec().with_max_age(60);
        let token = codec.encode_at("test", "id", NOW - 100).unwrap();

        assert!(matches!(
            codec.decode_at("test", &token, 0, NOW),
            Err(TokenError::Expired)
        ));
        // An explicit window overrides the default
        assert!(codec.decode_at("test", &token, 3600, NOW).is_ok());
    }

    #[test]
    fn test_future_timestamp_rejected() {
        let codec = codec();
        let token = codec.encode_at("test", "id", NOW + 3600).unwrap();
        assert!(matches!(
            codec.decode_at("test", &token, 0, NOW),
            Err(TokenError::TimestampTooNew)
        ));
    }

    #[test]
    fn test_max_length() {
        let codec = codec().with_max_length(32);
        let err = codec.encode_at("test", &"x".repeat(64), NOW).unwrap_err();
        assert!(matches!(err, TokenError::LengthExceeded { max: 32, .. }));

        let unlimited = codec.with_max_length(0);
        let token = unlimited.encode_at("test", &"x".repeat(8192), NOW).unwrap();
        assert!(token.len() > DEFAULT_MAX_LENGTH);

        let limited = unlimited.with_max_length(64);
        assert!(matches!(
            limited.decode_at("test", &token, 0, NOW),
            Err(TokenError::LengthExceeded { .. })
        ));
    }

    #[test]
    fn test_empty_hash_key() {
        assert!(matches!(
            SecureCookie::new(&KeyPair::new(Vec::new())),
            Err(TokenError::HashKeyNotSet)
        ));
    }
}
