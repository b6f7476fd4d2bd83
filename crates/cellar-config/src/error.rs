//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading configuration or resolving keys.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize config.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A `[[keys]]` entry has no hash key from any source.
    #[error("keys[{index}]: no hash key set (use 'hash' or 'hash_env')")]
    MissingHashKey { index: usize },

    /// A referenced environment variable is unset or empty.
    #[error("keys[{index}]: environment variable '{var}' is not set")]
    MissingEnvVar { index: usize, var: String },

    /// Key material is not valid base64.
    #[error("keys[{index}].{field}: invalid base64: {reason}")]
    InvalidKey {
        index: usize,
        field: &'static str,
        reason: String,
    },
}
