//! Authenticated session tokens for Cellar.
//!
//! A token carries a session identifier to the client and back. It is:
//! - bound to the session name (a token for `"cart"` never opens as `"auth"`)
//! - timestamped, so stale tokens can be refused
//! - signed with HMAC-SHA256, and optionally sealed with AES-256-GCM
//!
//! Key rotation is handled by [`CodecSet`]: new tokens are always issued
//! with the first key pair, while decoding tries every pair in order.
//!
//! # Example
//!
//! ```rust
//! use cellar_cookie::{CodecSet, KeyPair};
//!
//! let current = KeyPair::new(b"new-hash-key".to_vec());
//! let retired = KeyPair::new(b"old-hash-key".to_vec());
//! let codecs = CodecSet::from_key_pairs(&[current, retired], 4096)?;
//!
//! let token = codecs.encode_multi("session", "ABCDEF")?;
//! assert_eq!(codecs.decode_multi("session", &token, 3600)?, "ABCDEF");
//! # Ok::<(), cellar_cookie::TokenError>(())
//! ```

mod cipher;
mod codecs;
mod error;
mod key;
mod secure;

pub use codecs::CodecSet;
pub use error::{Result, TokenError};
pub use key::{KeyPair, generate_random_key};
pub use secure::{DEFAULT_MAX_AGE, DEFAULT_MAX_LENGTH, SecureCookie, TokenCodec};
