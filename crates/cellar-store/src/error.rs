//! Error types for the store crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while talking to the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database was closed (or never opened) before the operation ran.
    #[error("database not open")]
    NotOpen,

    /// The requested bucket does not exist.
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    /// Database connection or transaction failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The parent directory of the database file could not be created.
    #[error("failed to create database directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StoreError {
    /// Whether the error means the store itself is unreachable.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::NotOpen)
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
