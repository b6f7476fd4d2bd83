//! Error types for session operations.

use cellar_cookie::TokenError;
use cellar_store::StoreError;

/// Errors that can occur while creating, loading, saving, or deleting a
/// session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The client token could not be issued or opened.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The key-value store failed or is closed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stored record is malformed.
    #[error("malformed session record: {0}")]
    Record(#[source] serde_json::Error),

    /// The session values could not be encoded or decoded.
    #[error("payload error: {0}")]
    Payload(String),

    /// The operating system's randomness source failed.
    #[error("randomness source failed: {0}")]
    Entropy(String),

    /// The handle was deleted and can no longer be saved or reloaded.
    #[error("session '{0}' has been deleted")]
    Deleted(String),
}

impl SessionError {
    /// A bad, stale, or oversized client token. The request can go on with
    /// an empty session.
    pub fn is_token(&self) -> bool {
        matches!(self, SessionError::Token(e) if e.is_decode())
    }

    /// Stored bytes that could not be decoded.
    pub fn is_corruption(&self) -> bool {
        matches!(self, SessionError::Record(_) | SessionError::Payload(_))
    }

    /// The store is closed or unreachable.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SessionError::Store(e) if e.is_unavailable())
    }
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
