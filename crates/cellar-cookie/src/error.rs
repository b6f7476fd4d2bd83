//! Error types for token encoding and decoding.

/// Result type alias for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;

/// Errors produced while issuing or opening a token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// A codec was built with an empty hash key.
    #[error("hash key is not set")]
    HashKeyNotSet,

    /// The block key has an unsupported length.
    #[error("block key must be 32 bytes, got {0}")]
    InvalidBlockKey(usize),

    /// The encoded token is longer than the configured limit.
    #[error("the value is too long ({len} > {max})")]
    LengthExceeded { len: usize, max: usize },

    /// The key ring is empty.
    #[error("no codecs provided")]
    NoCodecs,

    /// The token is not valid base64 or lacks the expected structure.
    #[error("the value could not be decoded: {0}")]
    Decoding(String),

    /// The signature does not match.
    #[error("the value is not valid")]
    MacInvalid,

    /// The embedded timestamp is not an integer.
    #[error("invalid timestamp")]
    InvalidTimestamp,

    /// The token is older than the allowed max age.
    #[error("expired timestamp")]
    Expired,

    /// The token claims to have been issued in the future.
    #[error("timestamp is too new")]
    TimestampTooNew,

    /// Sealing the value failed.
    #[error("the value could not be encrypted")]
    Encryption,

    /// Opening a sealed value failed.
    #[error("the value could not be decrypted")]
    Decryption,

    /// Every key in the ring rejected the token.
    #[error("no key accepted the value: {}", join(.0))]
    Multi(Vec<TokenError>),
}

impl TokenError {
    /// Whether the error comes from a malformed, forged, or stale token
    /// (as opposed to a misconfigured key ring).
    pub fn is_decode(&self) -> bool {
        match self {
            TokenError::Decoding(_)
            | TokenError::MacInvalid
            | TokenError::InvalidTimestamp
            | TokenError::Expired
            | TokenError::TimestampTooNew
            | TokenError::Decryption
            | TokenError::LengthExceeded { .. } => true,
            TokenError::Multi(errors) => errors.iter().all(TokenError::is_decode),
            _ => false,
        }
    }
}

fn join(errors: &[TokenError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
