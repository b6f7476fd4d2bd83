//! Ordered key ring with rotation support.

use tracing::trace;

use crate::error::{Result, TokenError};
use crate::key::KeyPair;
use crate::secure::{SecureCookie, TokenCodec};

/// An immutable, ordered set of codecs.
///
/// The first codec issues every new token. Decoding tries each codec in
/// order and the first one that accepts the token wins, so a retired key
/// keeps working for as long as it stays in the list.
#[derive(Debug, Clone)]
pub struct CodecSet<C: TokenCodec = SecureCookie> {
    codecs: Vec<C>,
}

impl CodecSet<SecureCookie> {
    /// Build a key ring from key pairs, newest first.
    ///
    /// `max_length` bounds every issued and accepted token; 0 means unlimited.
    pub fn from_key_pairs(pairs: &[KeyPair], max_length: usize) -> Result<Self> {
        let codecs = pairs
            .iter()
            .map(|pair| SecureCookie::new(pair).map(|c| c.with_max_length(max_length)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { codecs })
    }
}

impl<C: TokenCodec> CodecSet<C> {
    /// Wrap an existing list of codecs, newest first.
    pub fn new(codecs: Vec<C>) -> Self {
        Self { codecs }
    }

    /// Number of codecs in the ring.
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// The codecs, newest first.
    pub fn codecs(&self) -> &[C] {
        &self.codecs
    }

    /// Issue a token for `value` with the newest codec.
    pub fn encode_multi(&self, name: &str, value: &str) -> Result<String> {
        self.encode_multi_at(name, value, chrono::Utc::now().timestamp())
    }

    /// Like [`encode_multi`](Self::encode_multi), stamped with `now`.
    pub fn encode_multi_at(&self, name: &str, value: &str, now: i64) -> Result<String> {
        let codec = self.codecs.first().ok_or(TokenError::NoCodecs)?;
        codec.encode_at(name, value, now)
    }

    /// Open a token with the first codec that accepts it.
    ///
    /// With a single codec its error is returned as-is; otherwise the errors
    /// of every attempt are collected into [`TokenError::Multi`].
    pub fn decode_multi(&self, name: &str, token: &str, max_age: i64) -> Result<String> {
        self.decode_multi_at(name, token, max_age, chrono::Utc::now().timestamp())
    }

    /// Like [`decode_multi`](Self::decode_multi), with token age judged
    /// against `now`.
    pub fn decode_multi_at(
        &self,
        name: &str,
        token: &str,
        max_age: i64,
        now: i64,
    ) -> Result<String> {
        if self.codecs.is_empty() {
            return Err(TokenError::NoCodecs);
        }

        let mut errors = Vec::new();
        for (index, codec) in self.codecs.iter().enumerate() {
            match codec.decode_at(name, token, max_age, now) {
                Ok(value) => {
                    trace!(name, key_index = index, "Token accepted");
                    return Ok(value);
                }
                Err(e) => errors.push(e),
            }
        }

        if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(TokenError::Multi(errors))
        }
    }
}
